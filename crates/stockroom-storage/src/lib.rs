//! Stockroom Storage
//!
//! Persistence collaborator for the product catalog. The service layer only
//! sees the `ProductStore` trait; the SQLite implementation behind it is an
//! opaque, potentially failing dependency whose errors are surfaced, not
//! interpreted.

pub mod sqlite;
pub mod store;

pub use sqlite::SqliteProductStore;
pub use store::{NewProduct, ProductRecord, ProductStore};
