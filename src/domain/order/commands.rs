use serde::{Deserialize, Deserializer};

use super::errors::OrderError;

// ============================================================================
// Order Commands - caller payloads for create and update
// ============================================================================
//
// Field names are snake_case; the PascalCase names sent by older clients are
// accepted as aliases, and `"items": null` reads as an empty list.
//
// ============================================================================

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct NewItem {
    #[serde(alias = "ItemCode")]
    pub item_code: String,
    #[serde(alias = "Description")]
    pub description: String,
    #[serde(alias = "Quantity")]
    pub quantity: i32,
}

/// An order in the `Draft` state: not yet persisted, no ids assigned.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct NewOrder {
    #[serde(alias = "CustomerName")]
    pub customer_name: String,
    #[serde(alias = "OrderedAt")]
    pub ordered_at: String,
    #[serde(alias = "Items", default, deserialize_with = "null_as_empty")]
    pub items: Vec<NewItem>,
}

impl NewOrder {
    /// Reject the draft before anything touches the store.
    pub fn validate(&self) -> Result<(), OrderError> {
        validate_customer_name(&self.customer_name)?;

        for (position, item) in self.items.iter().enumerate() {
            if item.quantity < 0 {
                return Err(OrderError::Validation(format!(
                    "item {} ({}): quantity must be >= 0, got {}",
                    position, item.item_code, item.quantity
                )));
            }
        }

        Ok(())
    }
}

/// Header fields for an update. Items are read only so they can be refused.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct OrderUpdate {
    #[serde(alias = "CustomerName")]
    pub customer_name: String,
    #[serde(alias = "OrderedAt")]
    pub ordered_at: String,
    #[serde(alias = "Items", default, deserialize_with = "null_as_empty")]
    pub items: Vec<NewItem>,
}

impl OrderUpdate {
    #[cfg(test)]
    pub fn header(customer_name: impl Into<String>, ordered_at: impl Into<String>) -> Self {
        Self {
            customer_name: customer_name.into(),
            ordered_at: ordered_at.into(),
            items: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), OrderError> {
        if !self.items.is_empty() {
            return Err(OrderError::Validation(
                "items cannot be modified through update; only customer_name and ordered_at"
                    .to_string(),
            ));
        }
        validate_customer_name(&self.customer_name)
    }
}

fn validate_customer_name(name: &str) -> Result<(), OrderError> {
    if name.trim().is_empty() {
        return Err(OrderError::Validation(
            "customer_name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<NewItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<NewItem>>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(customer_name: &str, quantities: &[i32]) -> NewOrder {
        NewOrder {
            customer_name: customer_name.to_string(),
            ordered_at: "2024-01-01".to_string(),
            items: quantities
                .iter()
                .enumerate()
                .map(|(i, q)| NewItem {
                    item_code: format!("C{i}"),
                    description: "thing".to_string(),
                    quantity: *q,
                })
                .collect(),
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(draft("Alice", &[3, 0]).validate().is_ok());
        assert!(draft("Alice", &[]).validate().is_ok());
    }

    #[test]
    fn test_blank_customer_rejected() {
        assert!(matches!(draft("", &[1]).validate(), Err(OrderError::Validation(_))));
        assert!(matches!(draft("   ", &[1]).validate(), Err(OrderError::Validation(_))));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let err = draft("Alice", &[1, -2]).validate().unwrap_err();
        match err {
            OrderError::Validation(msg) => assert!(msg.contains("-2")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_update_with_items_rejected() {
        let mut update = OrderUpdate::header("Alice", "2024-01-02");
        assert!(update.validate().is_ok());

        update.items.push(NewItem {
            item_code: "A1".to_string(),
            description: "Widget".to_string(),
            quantity: 1,
        });
        assert!(matches!(update.validate(), Err(OrderError::Validation(_))));
    }

    #[test]
    fn test_snake_case_payload() {
        let order: NewOrder = serde_json::from_str(
            r#"{"customer_name":"Alice","ordered_at":"2024-01-01",
                "items":[{"item_code":"A1","description":"Widget","quantity":3}]}"#,
        )
        .unwrap();

        assert_eq!(order, draft_with_widget());
    }

    #[test]
    fn test_legacy_pascal_case_payload() {
        let order: NewOrder = serde_json::from_str(
            r#"{"OrderID":0,"CustomerName":"Alice","OrderedAt":"2024-01-01",
                "Items":[{"ItemID":0,"ItemCode":"A1","Description":"Widget","Quantity":3,"OrderID":0}]}"#,
        )
        .unwrap();

        assert_eq!(order, draft_with_widget());
    }

    #[test]
    fn test_missing_or_null_items_is_empty() {
        let missing: NewOrder =
            serde_json::from_str(r#"{"customer_name":"A","ordered_at":"t"}"#).unwrap();
        let null: OrderUpdate =
            serde_json::from_str(r#"{"CustomerName":"A","OrderedAt":"t","Items":null}"#).unwrap();

        assert!(missing.items.is_empty());
        assert!(null.items.is_empty());
    }

    fn draft_with_widget() -> NewOrder {
        NewOrder {
            customer_name: "Alice".to_string(),
            ordered_at: "2024-01-01".to_string(),
            items: vec![NewItem {
                item_code: "A1".to_string(),
                description: "Widget".to_string(),
                quantity: 3,
            }],
        }
    }
}
