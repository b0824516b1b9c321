use serde::{Deserialize, Serialize};

// ============================================================================
// Order Value Objects
// ============================================================================

/// Store-assigned order identity.
pub type OrderId = i64;

/// Store-assigned item identity.
pub type ItemId = i64;

/// The `orders` row on its own, without items.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OrderHeader {
    pub order_id: OrderId,
    pub customer_name: String,
    /// Opaque caller-supplied token, stored and returned verbatim.
    pub ordered_at: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub item_id: ItemId,
    pub item_code: String,
    pub description: String,
    pub quantity: i32,
    pub order_id: OrderId,
}

/// A fully materialized order: header plus every item it owns.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub order_id: OrderId,
    pub customer_name: String,
    pub ordered_at: String,
    pub items: Vec<Item>,
}

impl Order {
    pub fn from_parts(header: OrderHeader, items: Vec<Item>) -> Self {
        Self {
            order_id: header.order_id,
            customer_name: header.customer_name,
            ordered_at: header.ordered_at,
            items,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(item_id: ItemId, order_id: OrderId) -> Item {
        Item {
            item_id,
            item_code: "A1".to_string(),
            description: "Widget".to_string(),
            quantity: 3,
            order_id,
        }
    }

    #[test]
    fn test_order_from_parts() {
        let header = OrderHeader {
            order_id: 7,
            customer_name: "Alice".to_string(),
            ordered_at: "2024-01-01".to_string(),
        };

        let order = Order::from_parts(header, vec![item(1, 7)]);

        assert_eq!(order.order_id, 7);
        assert_eq!(order.customer_name, "Alice");
        assert_eq!(order.items.len(), 1);
    }

    #[test]
    fn test_order_json_shape() {
        let order = Order::from_parts(
            OrderHeader {
                order_id: 1,
                customer_name: "Alice".to_string(),
                ordered_at: "2024-01-01".to_string(),
            },
            vec![item(1, 1)],
        );

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["order_id"], 1);
        assert_eq!(json["customer_name"], "Alice");
        assert_eq!(json["items"][0]["item_code"], "A1");
        assert_eq!(json["items"][0]["quantity"], 3);
    }

    #[test]
    fn test_header_json_has_no_items() {
        let header = OrderHeader {
            order_id: 2,
            customer_name: "Bob".to_string(),
            ordered_at: "yesterday".to_string(),
        };

        let json = serde_json::to_value(&header).unwrap();
        assert!(json.get("items").is_none());
    }
}
