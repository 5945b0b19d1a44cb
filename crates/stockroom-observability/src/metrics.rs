//! Metrics collection with Prometheus
//!
//! One counter and one histogram, updated exactly once per completed request:
//! - `http_requests_total` (counter): requests by method, endpoint, status
//! - `http_request_duration_ms` (histogram): latency by method, endpoint
//!
//! `endpoint` is always the registered route template (`/products/{id}`),
//! never the raw path, so label cardinality stays bounded.

use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector for the request pipeline.
#[derive(Clone)]
pub struct Metrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Total requests by method, route template, and final status
    pub requests_total: CounterVec,
    /// Request latency distribution in milliseconds
    pub request_duration_ms: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector with a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total number of requests"),
            &["method", "endpoint", "status"],
        )?;

        let request_duration_ms = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_ms",
                "Request latency distribution in milliseconds",
            ),
            &["method", "endpoint"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration_ms.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            request_duration_ms,
        })
    }

    /// Get the Prometheus registry for exporting metrics.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record one completed request.
    ///
    /// Never fails: label lookups allocate the series on first use and the
    /// underlying counters are atomic.
    pub fn record_request(&self, method: &str, endpoint: &str, status: u16, elapsed_ms: f64) {
        self.requests_total
            .with_label_values(&[method, endpoint, &status.to_string()])
            .inc();
        self.request_duration_ms
            .with_label_values(&[method, endpoint])
            .observe(elapsed_ms);
    }
}
