use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod domain;
mod health;
mod http;
mod metrics;
mod store;

use config::AppConfig;
use domain::order::OrderService;
use store::Database;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter, e.g. RUST_LOG=debug
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_service=debug")),
        )
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "Configuration loaded");

    // === 1. Open the database pool (the only store handle in the process) ===
    let database = Database::connect(&config.database)
        .await
        .context("failed to connect to the database")?;

    if config.database.auto_create_schema {
        database
            .ensure_schema()
            .await
            .context("failed to create the orders schema")?;
    }

    // === 2. Metrics registry ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        metric_families = metrics.registry().gather().len(),
        "✅ Metrics registry initialized"
    );

    // === 3. Order service with injected store handle ===
    let service = OrderService::new(
        database.clone(),
        metrics.clone(),
        config.database.statement_timeout,
    );

    // === 4. Serve until shutdown ===
    let served = http::start_server(&config.server, service, metrics).await;

    database.close().await;
    tracing::info!("🛑 Order service stopped");

    served.context("HTTP server failed")
}
