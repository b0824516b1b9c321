// ============================================================================
// Order Domain - the order aggregate
// ============================================================================
//
// - Value objects (Order, OrderHeader, Item)
// - Commands (NewOrder, OrderUpdate) and their validation
// - Errors (OrderError classification)
// - Service (OrderService: create / get / list / update / delete)
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod service;

pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use service::*;
