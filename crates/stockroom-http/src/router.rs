//! Application router
//!
//! Composes the CRUD routes with the pipeline middleware. Layer order
//! matters: the correlation id layer is outermost so every other layer and
//! handler sees the id, and panic catching is innermost so a panic becomes
//! a 500 before the metrics layer records the status.

use crate::middleware::{metrics_middleware, request_id_middleware, request_log_middleware};
use crate::products;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use opentelemetry::global::{self, BoxedTracer};
use std::sync::Arc;
use std::time::Duration;
use stockroom_observability::Metrics;
use stockroom_service::ProductService;
use tower_http::catch_panic::CatchPanicLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProductService>,
    pub tracer: Arc<BoxedTracer>,
    pub request_budget: Duration,
}

impl AppState {
    pub fn new(service: Arc<ProductService>) -> Self {
        Self {
            service,
            tracer: Arc::new(global::tracer("stockroom-http")),
            request_budget: products::REQUEST_BUDGET,
        }
    }

    /// Override the per-request wall-clock budget.
    pub fn with_request_budget(mut self, budget: Duration) -> Self {
        self.request_budget = budget;
        self
    }
}

async fn greeting() -> &'static str {
    "Hello, World!"
}

/// Build the application router with the full request pipeline.
pub fn app_router(state: AppState, metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/", get(greeting))
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(from_fn(request_log_middleware))
        .layer(from_fn_with_state(metrics, metrics_middleware))
        .layer(from_fn(request_id_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use stockroom_storage::SqliteProductStore;
    use tower::ServiceExt;

    async fn test_app() -> (Router, Arc<Metrics>) {
        let store = SqliteProductStore::in_memory().await.unwrap();
        let service = Arc::new(ProductService::new(Arc::new(store)));
        let metrics = Arc::new(Metrics::new().unwrap());
        (
            app_router(AppState::new(service), metrics.clone()),
            metrics,
        )
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_greeting() {
        let (app, _) = test_app().await;
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Hello, World!");
    }

    #[tokio::test]
    async fn test_create_and_fetch_product() {
        let (app, _) = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/products",
                json!({"name": "Widget", "quantity": 5, "price": 9.99}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().contains_key("x-request-id"));

        let created = body_json(response).await;
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["name"], "Widget");

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/products/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = body_json(response).await;
        assert_eq!(fetched["id"].as_i64().unwrap(), id);
    }

    #[tokio::test]
    async fn test_validation_failure_returns_400() {
        let (app, metrics) = test_app().await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/products",
                json!({"name": "", "quantity": 5, "price": 9.99}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("name is required"));

        let count = metrics
            .requests_total
            .with_label_values(&["POST", "/products", "400"])
            .get();
        assert_eq!(count as u64, 1);
    }

    #[tokio::test]
    async fn test_missing_product_returns_404() {
        let (app, _) = test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/products/9999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_numeric_id_returns_400() {
        let (app, _) = test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/products/abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_and_delete_product() {
        let (app, _) = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/products",
                json!({"name": "Widget", "quantity": 5, "price": 9.99}),
            ))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/products/{id}"),
                json!({"name": "Widget v2", "quantity": 8, "price": 12.5}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["name"], "Widget v2");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/products/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/products/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_count_listing_route() {
        let (app, metrics) = test_app().await;

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/products")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let count = metrics
            .requests_total
            .with_label_values(&["GET", "/products", "200"])
            .get();
        assert_eq!(count as u64, 3);
    }
}
