//! Stockroom business layer
//!
//! Validates inbound payloads, enforces request deadlines, and wraps every
//! store call in a `repo.*` trace span before delegating to the storage
//! layer.

pub mod products;

pub use products::ProductService;
