// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Aggregate-level rules live here; row mapping lives in `crate::store` and
// wire formats in `crate::http`.
//
// ============================================================================

pub mod order;
