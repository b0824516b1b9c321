use futures_util::stream::{BoxStream, StreamExt};
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Row};

use crate::domain::order::{Item, ItemId, OrderHeader, OrderId};

use super::errors::StoreError;

// ============================================================================
// Order Store - row primitives over `orders` and `items`
// ============================================================================
//
// Each primitive is exactly one SQL statement run on the connection it is
// given: a pooled connection for standalone reads/writes, or the connection
// behind an open transaction when the caller needs several primitives to
// commit together. No business rules live here.
//
// ============================================================================

fn header_from_row(row: &AnyRow) -> Result<OrderHeader, sqlx::Error> {
    Ok(OrderHeader {
        order_id: row.try_get("order_id")?,
        customer_name: row.try_get("customer_name")?,
        ordered_at: row.try_get("ordered_at")?,
    })
}

fn item_from_row(row: &AnyRow) -> Result<Item, sqlx::Error> {
    Ok(Item {
        item_id: row.try_get("item_id")?,
        item_code: row.try_get("item_code")?,
        description: row.try_get("description")?,
        quantity: row.try_get("quantity")?,
        order_id: row.try_get("order_id")?,
    })
}

/// Insert one `orders` row and return the generated id.
pub async fn insert_order_header(
    conn: &mut AnyConnection,
    customer_name: &str,
    ordered_at: &str,
) -> Result<OrderId, StoreError> {
    const OP: &str = "insert_order_header";

    let row = sqlx::query(
        "INSERT INTO orders (customer_name, ordered_at) VALUES ($1, $2) RETURNING order_id",
    )
    .bind(customer_name.to_owned())
    .bind(ordered_at.to_owned())
    .fetch_one(conn)
    .await
    .map_err(|e| StoreError::from_sqlx(OP, e))?;

    let order_id: OrderId = row
        .try_get("order_id")
        .map_err(|e| StoreError::from_sqlx(OP, e))?;

    tracing::debug!(order_id = order_id, "Inserted order header");
    Ok(order_id)
}

/// Insert one `items` row owned by `order_id`.
///
/// Fails with [`StoreError::Constraint`] when `order_id` does not exist.
pub async fn insert_item(
    conn: &mut AnyConnection,
    order_id: OrderId,
    item_code: &str,
    description: &str,
    quantity: i32,
) -> Result<ItemId, StoreError> {
    const OP: &str = "insert_item";

    let row = sqlx::query(
        "INSERT INTO items (item_code, description, quantity, order_id)
         VALUES ($1, $2, $3, $4)
         RETURNING item_id",
    )
    .bind(item_code.to_owned())
    .bind(description.to_owned())
    .bind(quantity)
    .bind(order_id)
    .fetch_one(conn)
    .await
    .map_err(|e| StoreError::from_sqlx(OP, e))?;

    let item_id: ItemId = row
        .try_get("item_id")
        .map_err(|e| StoreError::from_sqlx(OP, e))?;

    tracing::debug!(
        order_id = order_id,
        item_id = item_id,
        item_code = %item_code,
        "Inserted item"
    );
    Ok(item_id)
}

pub async fn fetch_order_header(
    conn: &mut AnyConnection,
    order_id: OrderId,
) -> Result<Option<OrderHeader>, StoreError> {
    const OP: &str = "fetch_order_header";

    let row = sqlx::query(
        "SELECT order_id, customer_name, ordered_at FROM orders WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await
    .map_err(|e| StoreError::from_sqlx(OP, e))?;

    row.as_ref()
        .map(header_from_row)
        .transpose()
        .map_err(|e| StoreError::from_sqlx(OP, e))
}

/// Stream every order header, lowest id first.
///
/// The stream is lazy and single-pass; it borrows the connection until it
/// is dropped.
pub fn fetch_all_order_headers(
    conn: &mut AnyConnection,
) -> BoxStream<'_, Result<OrderHeader, StoreError>> {
    sqlx::query("SELECT order_id, customer_name, ordered_at FROM orders ORDER BY order_id ASC")
        .fetch(conn)
        .map(|row| {
            row.and_then(|r| header_from_row(&r))
                .map_err(|e| StoreError::from_sqlx("fetch_all_order_headers", e))
        })
        .boxed()
}

/// Items owned by one order, in insertion order.
pub async fn fetch_items(
    conn: &mut AnyConnection,
    order_id: OrderId,
) -> Result<Vec<Item>, StoreError> {
    const OP: &str = "fetch_items";

    let rows = sqlx::query(
        "SELECT item_id, item_code, description, quantity, order_id
         FROM items
         WHERE order_id = $1
         ORDER BY item_id ASC",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await
    .map_err(|e| StoreError::from_sqlx(OP, e))?;

    rows.iter()
        .map(item_from_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::from_sqlx(OP, e))
}

/// Every item, grouped by owning order then insertion order.
pub async fn fetch_all_items(conn: &mut AnyConnection) -> Result<Vec<Item>, StoreError> {
    const OP: &str = "fetch_all_items";

    let rows = sqlx::query(
        "SELECT item_id, item_code, description, quantity, order_id
         FROM items
         ORDER BY order_id ASC, item_id ASC",
    )
    .fetch_all(conn)
    .await
    .map_err(|e| StoreError::from_sqlx(OP, e))?;

    rows.iter()
        .map(item_from_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::from_sqlx(OP, e))
}

/// Returns the number of rows matched; zero means the id does not exist.
pub async fn update_order_header(
    conn: &mut AnyConnection,
    order_id: OrderId,
    customer_name: &str,
    ordered_at: &str,
) -> Result<u64, StoreError> {
    let result = sqlx::query(
        "UPDATE orders SET customer_name = $1, ordered_at = $2 WHERE order_id = $3",
    )
    .bind(customer_name.to_owned())
    .bind(ordered_at.to_owned())
    .bind(order_id)
    .execute(conn)
    .await
    .map_err(|e| StoreError::from_sqlx("update_order_header", e))?;

    Ok(result.rows_affected())
}

pub async fn delete_items(conn: &mut AnyConnection, order_id: OrderId) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM items WHERE order_id = $1")
        .bind(order_id)
        .execute(conn)
        .await
        .map_err(|e| StoreError::from_sqlx("delete_items", e))?;

    Ok(result.rows_affected())
}

/// Fails with [`StoreError::Constraint`] while items still reference the order.
pub async fn delete_order_header(
    conn: &mut AnyConnection,
    order_id: OrderId,
) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM orders WHERE order_id = $1")
        .bind(order_id)
        .execute(conn)
        .await
        .map_err(|e| StoreError::from_sqlx("delete_order_header", e))?;

    Ok(result.rows_affected())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;
    use crate::store::Database;

    #[tokio::test]
    async fn test_insert_and_fetch_header() {
        let db = Database::in_memory().await;
        let mut conn = db.acquire().await.unwrap();

        let id = insert_order_header(&mut conn, "Alice", "2024-01-01").await.unwrap();
        let header = fetch_order_header(&mut conn, id).await.unwrap().unwrap();

        assert_eq!(id, 1);
        assert_eq!(header.customer_name, "Alice");
        assert_eq!(header.ordered_at, "2024-01-01");
    }

    #[tokio::test]
    async fn test_fetch_missing_header_returns_none() {
        let db = Database::in_memory().await;
        let mut conn = db.acquire().await.unwrap();

        assert!(fetch_order_header(&mut conn, 42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_item_for_missing_order_is_constraint_error() {
        let db = Database::in_memory().await;
        let mut conn = db.acquire().await.unwrap();

        let err = insert_item(&mut conn, 99, "A1", "Widget", 1).await.unwrap_err();
        assert!(err.is_constraint(), "unexpected error: {err}");
        assert_eq!(err.operation(), "insert_item");
    }

    #[tokio::test]
    async fn test_items_fetched_in_insertion_order() {
        let db = Database::in_memory().await;
        let mut conn = db.acquire().await.unwrap();

        let order = insert_order_header(&mut conn, "Bob", "t0").await.unwrap();
        let other = insert_order_header(&mut conn, "Carol", "t1").await.unwrap();
        insert_item(&mut conn, order, "B2", "Bolt", 10).await.unwrap();
        insert_item(&mut conn, other, "Z9", "Other", 1).await.unwrap();
        insert_item(&mut conn, order, "A1", "Anchor", 0).await.unwrap();

        let items = fetch_items(&mut conn, order).await.unwrap();
        let codes: Vec<_> = items.iter().map(|i| i.item_code.as_str()).collect();
        assert_eq!(codes, vec!["B2", "A1"]);
        assert!(items.iter().all(|i| i.order_id == order));
        assert_eq!(items[1].quantity, 0);

        let all = fetch_all_items(&mut conn).await.unwrap();
        let owners: Vec<_> = all.iter().map(|i| i.order_id).collect();
        assert_eq!(owners, vec![order, order, other]);
    }

    #[tokio::test]
    async fn test_header_stream_ordered_by_id() {
        let db = Database::in_memory().await;
        let mut conn = db.acquire().await.unwrap();

        for name in ["first", "second", "third"] {
            insert_order_header(&mut conn, name, "t").await.unwrap();
        }

        let headers: Vec<OrderHeader> = fetch_all_order_headers(&mut conn)
            .try_collect()
            .await
            .unwrap();
        let ids: Vec<_> = headers.iter().map(|h| h.order_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(headers[2].customer_name, "third");
    }

    #[tokio::test]
    async fn test_update_reports_affected_rows() {
        let db = Database::in_memory().await;
        let mut conn = db.acquire().await.unwrap();

        let id = insert_order_header(&mut conn, "Dan", "t").await.unwrap();
        assert_eq!(update_order_header(&mut conn, id, "Dana", "t2").await.unwrap(), 1);
        assert_eq!(update_order_header(&mut conn, id, "Dana", "t2").await.unwrap(), 1);
        assert_eq!(update_order_header(&mut conn, id + 100, "X", "t").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_header_delete_blocked_by_items() {
        let db = Database::in_memory().await;
        let mut conn = db.acquire().await.unwrap();

        let id = insert_order_header(&mut conn, "Eve", "t").await.unwrap();
        insert_item(&mut conn, id, "E1", "Eraser", 2).await.unwrap();

        let err = delete_order_header(&mut conn, id).await.unwrap_err();
        assert!(err.is_constraint(), "unexpected error: {err}");

        assert_eq!(delete_items(&mut conn, id).await.unwrap(), 1);
        assert_eq!(delete_order_header(&mut conn, id).await.unwrap(), 1);
        assert_eq!(delete_order_header(&mut conn, id).await.unwrap(), 0);
    }
}
