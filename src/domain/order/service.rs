use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::TryStreamExt;
use sqlx::{Any, AnyConnection, Transaction};

use crate::metrics::Metrics;
use crate::store::{order_store, Database, StoreError};

use super::commands::{NewOrder, OrderUpdate};
use super::errors::OrderError;
use super::value_objects::{Item, Order, OrderHeader, OrderId};

// ============================================================================
// Order Service - aggregate operations over the store
// ============================================================================
//
// Orchestrates: validated payload → row primitives → materialized Order
//
// `create` and `delete` touch both tables and run inside one transaction;
// every other operation is a single statement (or two independent reads for
// `get`). Each operation is bounded by `operation_timeout`; when it fires the
// in-flight future is dropped, which rolls back any open transaction.
//
// ============================================================================

#[derive(Clone)]
pub struct OrderService {
    db: Database,
    metrics: Arc<Metrics>,
    operation_timeout: Duration,
}

impl OrderService {
    pub fn new(db: Database, metrics: Arc<Metrics>, operation_timeout: Duration) -> Self {
        Self {
            db,
            metrics,
            operation_timeout,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Persist a new order with all of its items, or nothing at all.
    pub async fn create(&self, order: NewOrder) -> Result<OrderId, OrderError> {
        self.run("create", self.create_order(order)).await
    }

    /// Load one order with its items.
    pub async fn get(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.run("get", self.load_order(order_id)).await
    }

    /// All order headers, lowest id first. Items are not loaded.
    pub async fn list(&self) -> Result<Vec<OrderHeader>, OrderError> {
        self.run("list", self.load_headers()).await
    }

    /// All orders with their items, lowest id first.
    pub async fn list_with_items(&self) -> Result<Vec<Order>, OrderError> {
        self.run("list_with_items", self.load_orders()).await
    }

    /// Replace the header fields of an existing order.
    pub async fn update(&self, order_id: OrderId, update: OrderUpdate) -> Result<(), OrderError> {
        self.run("update", self.update_header(order_id, update)).await
    }

    /// Remove an order and every item it owns.
    pub async fn delete(&self, order_id: OrderId) -> Result<(), OrderError> {
        self.run("delete", self.delete_order(order_id)).await
    }

    // ------------------------------------------------------------------------
    // Operation bodies
    // ------------------------------------------------------------------------

    async fn create_order(&self, order: NewOrder) -> Result<OrderId, OrderError> {
        order.validate()?;

        let mut tx = self.db.begin().await?;

        match write_order(&mut tx, &order).await {
            Ok(order_id) => {
                tx.commit()
                    .await
                    .map_err(|e| OrderError::Persistence(StoreError::from_sqlx("commit", e)))?;

                self.metrics.record_items_written(order.items.len());
                tracing::info!(
                    order_id = order_id,
                    customer_name = %order.customer_name,
                    item_count = order.items.len(),
                    "✅ Order created"
                );
                Ok(order_id)
            }
            Err(err) => {
                self.rollback(tx, "create", &err).await;
                Err(OrderError::Persistence(err))
            }
        }
    }

    async fn load_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let mut conn = self.db.acquire().await?;

        let header = order_store::fetch_order_header(&mut conn, order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;
        let items = order_store::fetch_items(&mut conn, order_id).await?;

        tracing::debug!(order_id = order_id, item_count = items.len(), "Loaded order");
        Ok(Order::from_parts(header, items))
    }

    async fn load_headers(&self) -> Result<Vec<OrderHeader>, OrderError> {
        let mut conn = self.db.acquire().await?;

        let headers: Vec<OrderHeader> = order_store::fetch_all_order_headers(&mut conn)
            .try_collect()
            .await?;

        tracing::debug!(order_count = headers.len(), "Listed order headers");
        Ok(headers)
    }

    async fn load_orders(&self) -> Result<Vec<Order>, OrderError> {
        let mut conn = self.db.acquire().await?;

        let headers: Vec<OrderHeader> = order_store::fetch_all_order_headers(&mut conn)
            .try_collect()
            .await?;
        let items = order_store::fetch_all_items(&mut conn).await?;

        // Items of orders created after the header scan are left out.
        let mut by_order: HashMap<OrderId, Vec<Item>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(headers
            .into_iter()
            .map(|header| {
                let items = by_order.remove(&header.order_id).unwrap_or_default();
                Order::from_parts(header, items)
            })
            .collect())
    }

    async fn update_header(
        &self,
        order_id: OrderId,
        update: OrderUpdate,
    ) -> Result<(), OrderError> {
        update.validate()?;

        let mut conn = self.db.acquire().await?;
        let affected = order_store::update_order_header(
            &mut conn,
            order_id,
            &update.customer_name,
            &update.ordered_at,
        )
        .await?;

        if affected == 0 {
            return Err(OrderError::NotFound(order_id));
        }

        tracing::info!(order_id = order_id, "Order header updated");
        Ok(())
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<(), OrderError> {
        let mut tx = self.db.begin().await?;

        match cascade_delete(&mut tx, order_id).await {
            Ok((_, 0)) => {
                let err = OrderError::NotFound(order_id);
                self.rollback(tx, "delete", &err).await;
                Err(err)
            }
            Ok((items_removed, _)) => {
                tx.commit()
                    .await
                    .map_err(|e| OrderError::Persistence(StoreError::from_sqlx("commit", e)))?;

                tracing::info!(
                    order_id = order_id,
                    items_removed = items_removed,
                    "🗑️ Order deleted"
                );
                Ok(())
            }
            Err(err) => {
                self.rollback(tx, "delete", &err).await;
                Err(err.into())
            }
        }
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    async fn run<T, F>(&self, operation: &'static str, body: F) -> Result<T, OrderError>
    where
        F: Future<Output = Result<T, OrderError>>,
    {
        let started = Instant::now();

        let result = match tokio::time::timeout(self.operation_timeout, body).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    operation = operation,
                    timeout_ms = self.operation_timeout.as_millis(),
                    "Order operation timed out"
                );
                Err(OrderError::Persistence(StoreError::Timeout { operation }))
            }
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        self.metrics
            .record_operation(operation, outcome, started.elapsed().as_secs_f64());

        if let Err(ref e) = result {
            tracing::debug!(operation = operation, error = %e, "Order operation failed");
        }

        result
    }

    async fn rollback(
        &self,
        tx: Transaction<'static, Any>,
        operation: &'static str,
        cause: &dyn std::fmt::Display,
    ) {
        self.metrics.record_rollback(operation);

        match tx.rollback().await {
            Ok(()) => tracing::warn!(
                operation = operation,
                cause = %cause,
                "Transaction rolled back"
            ),
            Err(e) => tracing::error!(
                operation = operation,
                cause = %cause,
                error = %e,
                "Rollback failed"
            ),
        }
    }
}

/// Header first, then items in the order supplied, all on one connection.
async fn write_order(conn: &mut AnyConnection, order: &NewOrder) -> Result<OrderId, StoreError> {
    let order_id =
        order_store::insert_order_header(conn, &order.customer_name, &order.ordered_at).await?;

    for item in &order.items {
        order_store::insert_item(
            conn,
            order_id,
            &item.item_code,
            &item.description,
            item.quantity,
        )
        .await?;
    }

    Ok(order_id)
}

/// Returns (items removed, headers removed).
async fn cascade_delete(
    conn: &mut AnyConnection,
    order_id: OrderId,
) -> Result<(u64, u64), StoreError> {
    let items = order_store::delete_items(conn, order_id).await?;
    let headers = order_store::delete_order_header(conn, order_id).await?;
    Ok((items, headers))
}

// ============================================================================
// Unit Tests
// ============================================================================
