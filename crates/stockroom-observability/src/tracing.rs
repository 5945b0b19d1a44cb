//! OpenTelemetry distributed tracing
//!
//! Span creation and export for the request pipeline:
//! - A tracer provider with an OTLP batch exporter when a collector endpoint
//!   is configured, or a local log-backed exporter when it is not
//! - A scope guard (`ScopedSpan`) that closes its span on every exit path
//!   and records error status before closing

use opentelemetry::trace::{Span, Status, TraceContextExt, Tracer};
use opentelemetry::{Context as OtelContext, KeyValue, global};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{
    BatchConfigBuilder, BatchSpanProcessor, RandomIdGenerator, SdkTracerProvider, SpanData,
    SpanExporter,
};
use std::time::Duration;
use stockroom_core::RequestContext;
use thiserror::Error;

/// Tracer configuration
#[derive(Debug, Clone)]
pub struct TracerConfig {
    /// Service name
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// OTLP collector endpoint; when `None`, finished spans go to the
    /// structured log instead
    pub otlp_endpoint: Option<String>,
    /// Batch export interval for the OTLP path
    pub batch_timeout: Duration,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            service_name: "stockroom".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: None,
            // Default is 5s upstream; 1s keeps the collector view responsive.
            batch_timeout: Duration::from_secs(1),
        }
    }
}

/// Tracing setup errors
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Failed to build OTLP span exporter: {0}")]
    Exporter(String),
}

/// Initialize a tracer provider and register it as the global default.
///
/// Export failures are handled inside the SDK's processor (logged and
/// dropped); they never reach request handling.
pub fn init_tracer_provider(config: TracerConfig) -> Result<SdkTracerProvider, TraceError> {
    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new(
            "service.version",
            config.service_version.clone(),
        ))
        .build();

    let builder = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_id_generator(RandomIdGenerator::default());

    let provider = match &config.otlp_endpoint {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_http()
                .with_endpoint(endpoint.clone())
                .build()
                .map_err(|e| TraceError::Exporter(e.to_string()))?;

            let processor = BatchSpanProcessor::builder(exporter)
                .with_batch_config(
                    BatchConfigBuilder::default()
                        .with_scheduled_delay(config.batch_timeout)
                        .build(),
                )
                .build();

            builder.with_span_processor(processor).build()
        }
        None => builder.with_simple_exporter(LogSpanExporter).build(),
    };

    global::set_tracer_provider(provider.clone());

    Ok(provider)
}

/// Fallback exporter that renders finished spans through the structured log.
#[derive(Debug, Default)]
pub struct LogSpanExporter;

impl SpanExporter for LogSpanExporter {
    async fn export(&self, batch: Vec<SpanData>) -> OTelSdkResult {
        for span in batch {
            let duration_us = span
                .end_time
                .duration_since(span.start_time)
                .map(|d| d.as_micros() as u64)
                .unwrap_or(0);
            tracing::info!(
                target: "stockroom::trace",
                name = %span.name,
                trace_id = %span.span_context.trace_id(),
                span_id = %span.span_context.span_id(),
                parent_span_id = %span.parent_span_id,
                status = ?span.status,
                duration_us,
                "span completed"
            );
        }
        Ok(())
    }
}

/// Guard for one traced layer operation.
///
/// `start` opens a child span under the context's active span and returns a
/// derived context for the layer below. The span is closed when the guard
/// drops, so every exit path closes it, including cancellation and panic
/// unwinding. Explicit `end` is idempotent: the SDK ignores a second close
/// and exports the span exactly once.
pub struct ScopedSpan {
    cx: OtelContext,
}

impl ScopedSpan {
    pub fn start<T>(
        tracer: &T,
        name: &'static str,
        parent: &RequestContext,
    ) -> (RequestContext, ScopedSpan)
    where
        T: Tracer,
        T::Span: Span + Send + Sync + 'static,
    {
        let mut span = tracer.start_with_context(name, parent.otel());
        span.set_attribute(KeyValue::new(
            "request_id",
            parent.request_id().to_string(),
        ));

        let cx = parent.otel().with_span(span);
        let derived = parent.with_otel(cx.clone());
        (derived, ScopedSpan { cx })
    }

    /// Mark the span as failed, recording the error as an attribute.
    pub fn fail(&self, error: &str) {
        let span = self.cx.span();
        span.set_status(Status::error(error.to_string()));
        span.set_attribute(KeyValue::new("error.message", error.to_string()));
    }

    /// Mark the span as successful.
    pub fn succeed(&self) {
        self.cx.span().set_status(Status::Ok);
    }

    /// Close the span now instead of at guard drop. Re-closing is a no-op.
    pub fn end(&self) {
        self.cx.span().end();
    }
}

impl Drop for ScopedSpan {
    fn drop(&mut self) {
        self.cx.span().end();
    }
}
