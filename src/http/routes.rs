use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::order::{NewOrder, OrderError, OrderId, OrderService, OrderUpdate};
use crate::health::HealthCheckable;
use crate::metrics::Metrics;

use super::errors::bad_request;

// ============================================================================
// Routes
// ============================================================================
//
//   POST   /orders                 create
//   GET    /orders[?include_items] list
//   GET    /orders/{id}            get
//   PUT    /orders/{id}            update (header only)
//   DELETE /orders/{id}            delete (cascades items)
//
// The query-string endpoints of the first release (/create-order,
// /get-orders, /update-order?orderId=, /delete-order?orderId=) stay mounted
// for existing clients.
//
// ============================================================================

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _| bad_request(err)))
        .service(
            web::resource("/orders")
                .route(web::post().to(create_order))
                .route(web::get().to(list_orders)),
        )
        .service(
            web::resource("/orders/{order_id}")
                .route(web::get().to(get_order))
                .route(web::put().to(update_order))
                .route(web::delete().to(delete_order)),
        )
        .route("/create-order", web::post().to(create_order))
        .route("/get-orders", web::get().to(list_orders))
        .service(
            web::resource("/update-order")
                .route(web::put().to(legacy_update_order))
                .route(web::post().to(legacy_update_order)),
        )
        .service(
            web::resource("/delete-order")
                .route(web::delete().to(legacy_delete_order))
                .route(web::post().to(legacy_delete_order)),
        )
        .route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics));
}

fn request_span(operation: &'static str) -> tracing::Span {
    let request_id = Uuid::now_v7();
    tracing::info_span!("order_request", operation = operation, request_id = %request_id)
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub include_items: bool,
}

#[derive(Debug, Deserialize)]
pub struct LegacyOrderParams {
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
}

async fn create_order(
    service: web::Data<OrderService>,
    body: web::Json<NewOrder>,
) -> Result<HttpResponse, OrderError> {
    let order_id = service
        .create(body.into_inner())
        .instrument(request_span("create"))
        .await?;

    Ok(HttpResponse::Created().json(json!({ "order_id": order_id })))
}

async fn list_orders(
    service: web::Data<OrderService>,
    params: web::Query<ListParams>,
) -> Result<HttpResponse, OrderError> {
    let span = request_span("list");

    if params.include_items {
        let orders = service.list_with_items().instrument(span).await?;
        Ok(HttpResponse::Ok().json(orders))
    } else {
        let headers = service.list().instrument(span).await?;
        Ok(HttpResponse::Ok().json(headers))
    }
}

async fn get_order(
    service: web::Data<OrderService>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, OrderError> {
    let order = service
        .get(path.into_inner())
        .instrument(request_span("get"))
        .await?;

    Ok(HttpResponse::Ok().json(order))
}

async fn update_order(
    service: web::Data<OrderService>,
    path: web::Path<OrderId>,
    body: web::Json<OrderUpdate>,
) -> Result<HttpResponse, OrderError> {
    apply_update(&service, path.into_inner(), body.into_inner()).await
}

async fn legacy_update_order(
    service: web::Data<OrderService>,
    params: web::Query<LegacyOrderParams>,
    body: web::Json<OrderUpdate>,
) -> Result<HttpResponse, OrderError> {
    apply_update(&service, params.order_id, body.into_inner()).await
}

async fn apply_update(
    service: &OrderService,
    order_id: OrderId,
    update: OrderUpdate,
) -> Result<HttpResponse, OrderError> {
    service
        .update(order_id, update)
        .instrument(request_span("update"))
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "order_id": order_id,
        "message": "Order updated successfully",
    })))
}

async fn delete_order(
    service: web::Data<OrderService>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, OrderError> {
    apply_delete(&service, path.into_inner()).await
}

async fn legacy_delete_order(
    service: web::Data<OrderService>,
    params: web::Query<LegacyOrderParams>,
) -> Result<HttpResponse, OrderError> {
    apply_delete(&service, params.order_id).await
}

async fn apply_delete(
    service: &OrderService,
    order_id: OrderId,
) -> Result<HttpResponse, OrderError> {
    service
        .delete(order_id)
        .instrument(request_span("delete"))
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "order_id": order_id,
        "message": "Order deleted successfully",
    })))
}

async fn health(service: web::Data<OrderService>) -> HttpResponse {
    let database = service.database().check_health().await;

    let mut response = if database.status.is_healthy() {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };

    response.json(json!({
        "status": if database.status.is_healthy() { "healthy" } else { "unhealthy" },
        "service": "order-service",
        "components": [database],
    }))
}

async fn metrics(metrics: web::Data<Metrics>) -> HttpResponse {
    match metrics.encode() {
        Ok(text) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(text),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
