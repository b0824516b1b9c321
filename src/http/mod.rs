// ============================================================================
// HTTP Transport - actix-web front end for the order service
// ============================================================================

mod errors;
mod routes;

use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};

use crate::config::ServerSettings;
use crate::domain::order::OrderService;
use crate::metrics::Metrics;

pub use routes::configure;

/// Serve the order API until the process receives a shutdown signal.
pub async fn start_server(
    settings: &ServerSettings,
    service: OrderService,
    metrics: Arc<Metrics>,
) -> std::io::Result<()> {
    tracing::info!(
        "🚀 Starting order API on http://{}:{}/orders",
        settings.host,
        settings.port
    );

    let service = web::Data::new(service);
    let metrics = web::Data::from(metrics);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(service.clone())
            .app_data(metrics.clone())
            .configure(configure)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
