//! Product operations
//!
//! Each operation validates first, then checks the request deadline, and
//! only then opens a `repo.*` span around the store call. A request rejected
//! by validation or an expired deadline therefore produces no repository
//! span and never reaches the database.

use opentelemetry::global;
use opentelemetry::global::BoxedTracer;
use std::sync::Arc;
use stockroom_core::{Error, ProductRequest, ProductResponse, RequestContext, Result};
use stockroom_observability::health::{DependencyStatus, ReadinessChecker};
use stockroom_observability::ScopedSpan;
use stockroom_storage::{NewProduct, ProductRecord, ProductStore};
use tracing::{info, warn};

pub struct ProductService {
    store: Arc<dyn ProductStore>,
    tracer: BoxedTracer,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self {
            store,
            tracer: global::tracer("stockroom-service"),
        }
    }

    pub async fn create(&self, ctx: &RequestContext, req: ProductRequest) -> Result<ProductResponse> {
        req.validate()?;
        ctx.check_deadline()?;

        let (_repo_ctx, span) = ScopedSpan::start(&self.tracer, "repo.create_product", ctx);
        let result = self
            .store
            .create(NewProduct {
                name: req.name,
                quantity: req.quantity,
                price: req.price,
            })
            .await;
        match &result {
            Ok(record) => {
                span.succeed();
                info!(
                    request_id = %ctx.request_id(),
                    product_id = record.id,
                    "product created"
                );
            }
            Err(err) => {
                span.fail(&err.to_string());
                warn!(request_id = %ctx.request_id(), error = %err, "create failed");
            }
        }
        result.map(into_response)
    }

    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<ProductResponse>> {
        ctx.check_deadline()?;

        let (_repo_ctx, span) = ScopedSpan::start(&self.tracer, "repo.list_products", ctx);
        let result = self.store.list().await;
        match &result {
            Ok(_) => span.succeed(),
            Err(err) => span.fail(&err.to_string()),
        }
        result.map(|records| records.into_iter().map(into_response).collect())
    }

    pub async fn get(&self, ctx: &RequestContext, id: i64) -> Result<ProductResponse> {
        ctx.check_deadline()?;

        let (_repo_ctx, span) = ScopedSpan::start(&self.tracer, "repo.get_product", ctx);
        let result = self.store.get(id).await;
        match &result {
            Ok(_) => span.succeed(),
            // A lookup miss is an expected outcome, not a repository fault
            Err(Error::NotFound(_)) => span.succeed(),
            Err(err) => span.fail(&err.to_string()),
        }
        result.map(into_response)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        req: ProductRequest,
    ) -> Result<ProductResponse> {
        req.validate()?;
        ctx.check_deadline()?;

        let (_repo_ctx, span) = ScopedSpan::start(&self.tracer, "repo.update_product", ctx);
        let result = self
            .store
            .update(
                id,
                NewProduct {
                    name: req.name,
                    quantity: req.quantity,
                    price: req.price,
                },
            )
            .await;
        match &result {
            Ok(_) => {
                span.succeed();
                info!(request_id = %ctx.request_id(), product_id = id, "product updated");
            }
            Err(Error::NotFound(_)) => span.succeed(),
            Err(err) => {
                span.fail(&err.to_string());
                warn!(request_id = %ctx.request_id(), error = %err, "update failed");
            }
        }
        result.map(into_response)
    }

    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<()> {
        ctx.check_deadline()?;

        let (_repo_ctx, span) = ScopedSpan::start(&self.tracer, "repo.delete_product", ctx);
        let result = self.store.delete(id).await;
        match &result {
            Ok(()) => {
                span.succeed();
                info!(request_id = %ctx.request_id(), product_id = id, "product deleted");
            }
            Err(Error::NotFound(_)) => span.succeed(),
            Err(err) => {
                span.fail(&err.to_string());
                warn!(request_id = %ctx.request_id(), error = %err, "delete failed");
            }
        }
        result
    }
}

#[async_trait::async_trait]
impl ReadinessChecker for ProductService {
    async fn is_ready(&self) -> bool {
        self.store.ping().await.is_ok()
    }

    async fn dependency_statuses(&self) -> Vec<DependencyStatus> {
        let status = if self.store.ping().await.is_ok() {
            "healthy"
        } else {
            "unhealthy"
        };
        vec![DependencyStatus {
            name: "sqlite".to_string(),
            status: status.to_string(),
        }]
    }
}

fn into_response(record: ProductRecord) -> ProductResponse {
    ProductResponse {
        id: record.id,
        name: record.name,
        quantity: record.quantity,
        price: record.price,
    }
}
