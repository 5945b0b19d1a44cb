//! Stockroom Core Types
//!
//! This crate provides the fundamental types used throughout Stockroom:
//! - Request-scoped context (correlation id, active span, deadline)
//! - Product domain model and validation
//! - Core error types

pub mod context;
pub mod error;
pub mod product;

pub use context::{RequestContext, RequestId};
pub use error::{Error, Result};
pub use product::{ProductRequest, ProductResponse};
