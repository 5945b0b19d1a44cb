//! Stockroom Observability
//!
//! This crate provides observability features:
//! - Metrics collection (Prometheus)
//! - Distributed tracing (OpenTelemetry)
//! - Structured logging with a rotating file sink
//! - Health and metrics endpoints

pub mod health;
pub mod logging;
pub mod metrics;
pub mod tracing;

pub use health::{DependencyStatus, HealthState, ReadinessChecker, health_router};
pub use logging::{LoggingConfig, RotatingFileWriter, init_logging};
pub use metrics::Metrics;
pub use crate::tracing::{ScopedSpan, TracerConfig, init_tracer_provider};
