//! Stockroom HTTP layer
//!
//! The instrumented request pipeline: correlation id propagation, response
//! capture, per-route metrics, request logging, and the product CRUD
//! handlers.

pub mod capture;
pub mod error;
pub mod middleware;
pub mod products;
pub mod router;

pub use capture::ResponseCapture;
pub use error::ApiError;
pub use router::{AppState, app_router};
