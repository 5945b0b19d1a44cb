//! Product CRUD handlers
//!
//! Each handler opens a `handler.*` root span tagged with the correlation
//! id, derives a request context with the configured wall-clock budget
//! (5 seconds by default), and delegates to
//! the service layer. The span guard closes the span on every exit path,
//! including timeout.

use crate::error::ApiError;
use crate::router::AppState;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::time::Duration;
use stockroom_core::{Error, ProductRequest, RequestContext, RequestId, Result};
use stockroom_observability::ScopedSpan;
use tracing::info;

/// Default wall-clock budget for one request.
pub const REQUEST_BUDGET: Duration = Duration::from_secs(5);

/// Run `fut` within the context's remaining budget.
///
/// On expiry the future is dropped, which cancels in-flight store work and
/// closes any open spans through their guards.
async fn with_timeout<T>(ctx: &RequestContext, fut: impl Future<Output = Result<T>>) -> Result<T> {
    let budget = ctx.remaining().unwrap_or(REQUEST_BUDGET);
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::DeadlineExceeded),
    }
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| Error::Validation(format!("invalid product id: {raw}")))
}

/// Record a failed outcome on the root span.
///
/// Client input errors (rejected validation, malformed or unknown ids) are
/// not transport faults; the span ends without error status for those.
fn record_failure(span: &ScopedSpan, err: &Error) {
    if !err.is_client_error() {
        span.fail(&err.to_string());
    }
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(req): Json<ProductRequest>,
) -> std::result::Result<Response, ApiError> {
    info!(request_id = %request_id, "creating product");

    let ctx = RequestContext::new(request_id).with_deadline(state.request_budget);
    let (ctx, span) = ScopedSpan::start(&*state.tracer, "handler.create_product", &ctx);

    let result = with_timeout(&ctx, state.service.create(&ctx, req)).await;
    match &result {
        Ok(product) => {
            span.succeed();
            info!(request_id = %ctx.request_id(), product_id = product.id, "product created");
        }
        Err(err) => record_failure(&span, err),
    }

    let product = result?;
    Ok((StatusCode::CREATED, Json(product)).into_response())
}

pub async fn list_products(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> std::result::Result<Response, ApiError> {
    info!(request_id = %request_id, "get products");

    let ctx = RequestContext::new(request_id).with_deadline(state.request_budget);
    let (ctx, span) = ScopedSpan::start(&*state.tracer, "handler.get_products", &ctx);

    let result = with_timeout(&ctx, state.service.list(&ctx)).await;
    match &result {
        Ok(products) => {
            span.succeed();
            info!(
                request_id = %ctx.request_id(),
                product_count = products.len(),
                "products retrieved"
            );
        }
        Err(err) => record_failure(&span, err),
    }

    let products = result?;
    Ok((StatusCode::OK, Json(products)).into_response())
}

pub async fn get_product(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(raw_id): Path<String>,
) -> std::result::Result<Response, ApiError> {
    let ctx = RequestContext::new(request_id).with_deadline(state.request_budget);
    let (ctx, span) = ScopedSpan::start(&*state.tracer, "handler.get_product", &ctx);

    let result = match parse_id(&raw_id) {
        Ok(id) => {
            info!(request_id = %ctx.request_id(), product_id = id, "getting product");
            with_timeout(&ctx, state.service.get(&ctx, id)).await
        }
        Err(err) => Err(err),
    };
    match &result {
        Ok(product) => {
            span.succeed();
            info!(
                request_id = %ctx.request_id(),
                product_id = product.id,
                "product retrieved"
            );
        }
        Err(err) => record_failure(&span, err),
    }

    let product = result?;
    Ok((StatusCode::OK, Json(product)).into_response())
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(raw_id): Path<String>,
    Json(req): Json<ProductRequest>,
) -> std::result::Result<Response, ApiError> {
    let ctx = RequestContext::new(request_id).with_deadline(state.request_budget);
    let (ctx, span) = ScopedSpan::start(&*state.tracer, "handler.update_product", &ctx);

    let result = match parse_id(&raw_id) {
        Ok(id) => {
            info!(request_id = %ctx.request_id(), product_id = id, "updating product");
            with_timeout(&ctx, state.service.update(&ctx, id, req)).await
        }
        Err(err) => Err(err),
    };
    match &result {
        Ok(product) => {
            span.succeed();
            info!(
                request_id = %ctx.request_id(),
                product_id = product.id,
                "product updated"
            );
        }
        Err(err) => record_failure(&span, err),
    }

    let product = result?;
    Ok((StatusCode::OK, Json(product)).into_response())
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(raw_id): Path<String>,
) -> std::result::Result<Response, ApiError> {
    let ctx = RequestContext::new(request_id).with_deadline(state.request_budget);
    let (ctx, span) = ScopedSpan::start(&*state.tracer, "handler.delete_product", &ctx);

    let result = match parse_id(&raw_id) {
        Ok(id) => {
            info!(request_id = %ctx.request_id(), product_id = id, "deleting product");
            with_timeout(&ctx, state.service.delete(&ctx, id)).await
        }
        Err(err) => Err(err),
    };
    match &result {
        Ok(()) => {
            span.succeed();
            info!(request_id = %ctx.request_id(), "product deleted");
        }
        Err(err) => record_failure(&span, err),
    }

    result?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
