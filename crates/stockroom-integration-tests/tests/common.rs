//! Common test utilities for integration tests

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use opentelemetry::global;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};
use std::sync::Arc;
use std::time::Duration;
use stockroom_core::{Error, Result};
use stockroom_http::{AppState, app_router};
use stockroom_observability::Metrics;
use stockroom_service::ProductService;
use stockroom_storage::{NewProduct, ProductRecord, ProductStore, SqliteProductStore};

/// Store whose every operation fails with a database error.
#[derive(Default)]
#[allow(dead_code)]
pub struct FailingStore;

#[async_trait]
impl ProductStore for FailingStore {
    async fn create(&self, _product: NewProduct) -> Result<ProductRecord> {
        Err(Error::Database("simulated failure".to_string()))
    }

    async fn list(&self) -> Result<Vec<ProductRecord>> {
        Err(Error::Database("simulated failure".to_string()))
    }

    async fn get(&self, _id: i64) -> Result<ProductRecord> {
        Err(Error::Database("simulated failure".to_string()))
    }

    async fn update(&self, _id: i64, _product: NewProduct) -> Result<ProductRecord> {
        Err(Error::Database("simulated failure".to_string()))
    }

    async fn delete(&self, _id: i64) -> Result<()> {
        Err(Error::Database("simulated failure".to_string()))
    }

    async fn ping(&self) -> Result<()> {
        Err(Error::Database("simulated failure".to_string()))
    }
}

/// Store whose every operation hangs far past the request budget.
#[derive(Default)]
#[allow(dead_code)]
pub struct HangingStore;

#[allow(dead_code)]
impl HangingStore {
    async fn hang<T>() -> Result<T> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Err(Error::Internal("unreachable".to_string()))
    }
}

#[async_trait]
impl ProductStore for HangingStore {
    async fn create(&self, _product: NewProduct) -> Result<ProductRecord> {
        Self::hang().await
    }

    async fn list(&self) -> Result<Vec<ProductRecord>> {
        Self::hang().await
    }

    async fn get(&self, _id: i64) -> Result<ProductRecord> {
        Self::hang().await
    }

    async fn update(&self, _id: i64, _product: NewProduct) -> Result<ProductRecord> {
        Self::hang().await
    }

    async fn delete(&self, _id: i64) -> Result<()> {
        Self::hang().await
    }

    async fn ping(&self) -> Result<()> {
        Self::hang().await
    }
}

/// A record with plausible timestamps, for stores that need to fabricate one.
#[allow(dead_code)]
pub fn record(id: i64, product: NewProduct) -> ProductRecord {
    ProductRecord {
        id,
        name: product.name,
        quantity: product.quantity,
        price: product.price,
        created_at: Utc::now(),
        updated_at: None,
    }
}

/// Build the full pipeline over an arbitrary store.
#[allow(dead_code)]
pub fn app_with_store(store: Arc<dyn ProductStore>) -> (Router, Arc<Metrics>) {
    let service = Arc::new(ProductService::new(store));
    let metrics = Arc::new(Metrics::new().unwrap());
    (
        app_router(AppState::new(service), metrics.clone()),
        metrics,
    )
}

/// Build the full pipeline over a fresh in-memory SQLite store.
#[allow(dead_code)]
pub async fn sqlite_app() -> (Router, Arc<Metrics>) {
    let store = SqliteProductStore::in_memory().await.unwrap();
    app_with_store(Arc::new(store))
}

/// Install an in-memory exporter as the global trace sink.
///
/// Must be called before the app is built so handler and service tracers
/// bind to the test provider. Tests using this run serially.
#[allow(dead_code)]
pub fn install_test_exporter() -> InMemorySpanExporter {
    let exporter = InMemorySpanExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    global::set_tracer_provider(provider);
    exporter
}
