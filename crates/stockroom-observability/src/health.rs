//! Liveness, readiness, and metrics endpoints
//!
//! Mounted beside the product routes. `/healthz` answers as long as the
//! process serves requests, `/readyz` reflects whether the store behind the
//! service is reachable, and `/metrics` renders the prometheus registry in
//! text exposition format.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::TextEncoder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::metrics::Metrics;

/// One dependency's view in the readiness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub name: String,
    pub status: String,
}

/// Asks the service whether its dependencies can take traffic.
#[async_trait::async_trait]
pub trait ReadinessChecker: Send + Sync {
    async fn is_ready(&self) -> bool;

    async fn dependency_statuses(&self) -> Vec<DependencyStatus>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StatusBody {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dependencies: Option<Vec<DependencyStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl StatusBody {
    fn ready(dependencies: Option<Vec<DependencyStatus>>) -> Self {
        Self {
            status: "ready".to_string(),
            dependencies,
            message: None,
        }
    }

    fn not_ready(dependencies: Vec<DependencyStatus>) -> Self {
        Self {
            status: "not_ready".to_string(),
            dependencies: Some(dependencies),
            message: Some("One or more dependencies are unavailable".to_string()),
        }
    }
}

/// State behind the health routes.
#[derive(Clone)]
pub struct HealthState {
    pub metrics: Arc<Metrics>,
    pub readiness_checker: Option<Arc<dyn ReadinessChecker>>,
}

impl HealthState {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics,
            readiness_checker: None,
        }
    }

    pub fn with_readiness_checker(
        metrics: Arc<Metrics>,
        readiness_checker: Arc<dyn ReadinessChecker>,
    ) -> Self {
        Self {
            metrics,
            readiness_checker: Some(readiness_checker),
        }
    }
}

/// Router for the health and metrics routes, merged into the main app.
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(render_metrics))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    Json(StatusBody {
        status: "ok".to_string(),
        dependencies: None,
        message: None,
    })
}

/// 200 when every dependency reports healthy, 503 otherwise.
async fn readyz(State(state): State<HealthState>) -> Response {
    let Some(checker) = &state.readiness_checker else {
        // Nothing wired to check; the running process is the only dependency.
        return (StatusCode::OK, Json(StatusBody::ready(None))).into_response();
    };

    let dependencies = checker.dependency_statuses().await;
    if checker.is_ready().await {
        (StatusCode::OK, Json(StatusBody::ready(Some(dependencies)))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusBody::not_ready(dependencies)),
        )
            .into_response()
    }
}

async fn render_metrics(State(state): State<HealthState>) -> Response {
    match TextEncoder::new().encode_to_string(&state.metrics.registry().gather()) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", err),
        )
            .into_response(),
    }
}
