//! Product store trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stockroom_core::Result;

/// Fields for a create or update operation.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

/// A stored product row.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Query interface over the product catalog.
///
/// Implementations must be safe for arbitrary concurrent calls; the pipeline
/// does no locking of its own beyond what the store provides.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn create(&self, product: NewProduct) -> Result<ProductRecord>;

    async fn list(&self) -> Result<Vec<ProductRecord>>;

    async fn get(&self, id: i64) -> Result<ProductRecord>;

    async fn update(&self, id: i64, product: NewProduct) -> Result<ProductRecord>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Cheap connectivity probe used by the readiness endpoint.
    async fn ping(&self) -> Result<()>;
}
