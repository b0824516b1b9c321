// ============================================================================
// Store Adapter - relational persistence for orders and items
// ============================================================================
//
// - database:    owned connection pool (lifecycle, transactions, health)
// - schema:      table bootstrap per backend
// - order_store: single-statement row primitives
// - errors:      StoreError classification
//
// ============================================================================

mod database;
mod errors;
pub mod order_store;
pub mod schema;

pub use database::Database;
pub use errors::StoreError;
