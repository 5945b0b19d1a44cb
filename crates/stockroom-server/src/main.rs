//! Stockroom server binary
//!
//! Wires the full stack: config, logging, tracing, SQLite store, service,
//! and the instrumented HTTP pipeline with health endpoints.

mod config;

use clap::Parser;
use config::ServerConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use stockroom_http::{AppState, app_router};
use stockroom_observability::{
    HealthState, LoggingConfig, Metrics, TracerConfig, health_router, init_logging,
    init_tracer_provider,
};
use stockroom_service::ProductService;
use stockroom_storage::SqliteProductStore;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Stockroom - instrumented product CRUD service
#[derive(Parser)]
#[command(name = "stockroom-server")]
#[command(about = "Product CRUD service with metrics, tracing, and structured logging", long_about = None)]
struct Cli {
    /// Path to configuration file (YAML or TOML)
    #[arg(short, long, value_name = "FILE", env = "STOCKROOM_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("failed to load config {path}: {e}"))?,
        None => ServerConfig::default(),
    };
    config.merge_env();

    init_logging(&LoggingConfig {
        level: config.logging.level.clone(),
        environment: config.logging.environment.clone(),
        directory: config.logging.directory.clone(),
        max_size_mb: config.logging.max_size_mb,
        max_backups: config.logging.max_backups,
        max_age_days: config.logging.max_age_days,
        compress: config.logging.compress,
    })?;

    let tracer_provider = init_tracer_provider(TracerConfig {
        service_name: config.telemetry.service_name.clone(),
        otlp_endpoint: config.telemetry.otlp_endpoint.clone(),
        batch_timeout: Duration::from_secs(config.telemetry.batch_timeout_secs),
        ..TracerConfig::default()
    })?;
    match &config.telemetry.otlp_endpoint {
        Some(endpoint) => info!("Exporting traces to {}", endpoint),
        None => info!("No OTLP endpoint configured, traces go to the log"),
    }

    // The store is required; refuse to start without it.
    let store = SqliteProductStore::new(&config.database.path).await?;
    info!("SQLite store ready at {:?}", config.database.path);

    let service = Arc::new(ProductService::new(Arc::new(store)));
    let metrics = Arc::new(Metrics::new()?);

    let health_state = HealthState::with_readiness_checker(metrics.clone(), service.clone());
    let app_state = AppState::new(service)
        .with_request_budget(Duration::from_secs(config.request.deadline_secs));
    let app = app_router(app_state, metrics).merge(health_router(health_state));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Stockroom listening on http://{}", addr);
    info!("   - Products API:       http://{}/products", addr);
    info!("   - Health check:       http://{}/healthz", addr);
    info!("   - Readiness check:    http://{}/readyz", addr);
    info!("   - Prometheus metrics: http://{}/metrics", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Flush any spans still buffered in the batch processor
    if let Err(err) = tracer_provider.shutdown() {
        warn!("Failed to shut down tracer provider: {:?}", err);
    }

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
