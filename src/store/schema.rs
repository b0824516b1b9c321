use sqlx::AnyPool;

use crate::config::Backend;

use super::errors::StoreError;

// ============================================================================
// Schema Bootstrap
// ============================================================================
//
// orders(order_id PK, customer_name, ordered_at)
// items(item_id PK, item_code, description, quantity, order_id FK)
//
// The foreign key has no ON DELETE CASCADE. The service removes an order's
// items in the same transaction as its header.
//
// ============================================================================

const POSTGRES_DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS orders (
        order_id      BIGSERIAL PRIMARY KEY,
        customer_name TEXT NOT NULL,
        ordered_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS items (
        item_id     BIGSERIAL PRIMARY KEY,
        item_code   TEXT NOT NULL,
        description TEXT NOT NULL,
        quantity    INTEGER NOT NULL CHECK (quantity >= 0),
        order_id    BIGINT NOT NULL REFERENCES orders (order_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_items_order_id ON items (order_id)",
];

const SQLITE_DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS orders (
        order_id      INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_name TEXT NOT NULL,
        ordered_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS items (
        item_id     INTEGER PRIMARY KEY AUTOINCREMENT,
        item_code   TEXT NOT NULL,
        description TEXT NOT NULL,
        quantity    INTEGER NOT NULL CHECK (quantity >= 0),
        order_id    INTEGER NOT NULL REFERENCES orders (order_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_items_order_id ON items (order_id)",
];

pub fn statements(backend: Backend) -> &'static [&'static str] {
    match backend {
        Backend::Postgres => POSTGRES_DDL,
        Backend::Sqlite => SQLITE_DDL,
    }
}

/// Create the two tables if they do not exist yet.
pub async fn ensure_schema(pool: &AnyPool, backend: Backend) -> Result<(), StoreError> {
    for &ddl in statements(backend) {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| StoreError::from_sqlx("ensure_schema", e))?;
    }

    tracing::info!(backend = backend.as_str(), "Schema ready");
    Ok(())
}
