//! Product domain model

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Inbound payload for create and update operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

impl ProductRequest {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }
        if self.quantity <= 0 {
            return Err(Error::Validation(
                "quantity must be greater than 0".to_string(),
            ));
        }
        if self.price <= 0.0 {
            return Err(Error::Validation(
                "price must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outbound representation of a stored product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ProductRequest {
        ProductRequest {
            name: "Widget".to_string(),
            quantity: 5,
            price: 9.99,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut req = valid();
        req.name = String::new();
        assert!(matches!(req.validate(), Err(Error::Validation(msg)) if msg.contains("name")));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let mut req = valid();
        req.quantity = 0;
        assert!(req.validate().is_err());
        req.quantity = -3;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let mut req = valid();
        req.price = 0.0;
        assert!(req.validate().is_err());
    }
}
