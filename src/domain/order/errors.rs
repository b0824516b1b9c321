use crate::store::StoreError;

use super::value_objects::OrderId;

// ============================================================================
// Order Errors - classification returned to the transport layer
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// Malformed or out-of-range input; the store was not touched.
    #[error("Invalid order: {0}")]
    Validation(String),

    #[error("Order {0} not found")]
    NotFound(OrderId),

    /// Referential integrity violation reported by the store.
    #[error("Constraint violation: {0}")]
    Constraint(#[source] StoreError),

    /// Connectivity, timeout, or any other store failure.
    #[error("Persistence failure: {0}")]
    Persistence(#[source] StoreError),
}

impl OrderError {
    /// Stable machine-readable name of the classification.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Constraint(_) => "constraint_error",
            Self::Persistence(_) => "persistence_error",
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        if err.is_constraint() {
            Self::Constraint(err)
        } else {
            Self::Persistence(err)
        }
    }
}
