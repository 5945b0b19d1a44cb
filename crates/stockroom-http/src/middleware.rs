//! Request pipeline middleware
//!
//! Three layers, outermost first:
//! 1. `request_id_middleware` - reuses or generates the correlation id,
//!    stashes it in request extensions, and echoes it on the response
//! 2. `metrics_middleware` - wraps the response in a [`ResponseCapture`]
//!    and records the per-route counter and latency histogram
//! 3. `request_log_middleware` - structured received/completed records per
//!    request

use crate::capture::ResponseCapture;
use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use stockroom_core::RequestId;
use stockroom_observability::Metrics;
use tracing::info;

/// Correlation id header, inbound and outbound.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware to attach a correlation id to every request.
///
/// A non-empty inbound `x-request-id` is reused so the id stays stable
/// across service hops; otherwise a fresh UUID is generated. The id is
/// always echoed on the response.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::from_header)
        .unwrap_or_else(RequestId::generate);

    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Middleware to record per-route request metrics.
///
/// The endpoint label is the matched route template (`/products/{id}`),
/// never the concrete path, to keep label cardinality bounded. Latency is
/// recorded in milliseconds.
pub async fn metrics_middleware(
    State(metrics): State<Arc<Metrics>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let start = Instant::now();

    let capture = ResponseCapture::new();
    let response = capture.wrap(next.run(req).await);

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    metrics.record_request(&method, &endpoint, capture.status().as_u16(), elapsed_ms);

    response
}

/// Best-effort client address: proxy header first, then the socket peer.
fn client_addr(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Middleware to emit one received and one completed log record per request.
pub async fn request_log_middleware(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let remote_addr = client_addr(&req);
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.to_string())
        .unwrap_or_default();
    let start = Instant::now();

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        host = %host,
        remote_addr = %remote_addr,
        user_agent = %user_agent,
        "request received"
    );

    let response = next.run(req).await;

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        host = %host,
        remote_addr = %remote_addr,
        status = response.status().as_u16(),
        user_agent = %user_agent,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "request completed"
    );

    response
}
