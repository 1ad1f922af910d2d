// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each entity family has its own subdirectory with:
// - Value objects
// - Inputs
// - Errors
// - Storage port (trait)
// - Service
//
// Shared format predicates live in `validation`, the failure taxonomy and
// storage error contract in `errors`.
//
// ============================================================================

pub mod errors;
pub mod validation;
pub mod guest;
pub mod access;
