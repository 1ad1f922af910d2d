// ============================================================================
// Guest Domain - Guest list rules
// ============================================================================
//
// This module contains ALL guest-specific code:
// - Value objects (Guest, Relationship)
// - Inputs (CreateGuest, UpdateGuest and their validated forms)
// - Errors (GuestError enum)
// - Storage port (GuestRepository, CredentialChecker)
// - Service (GuestDirectory)
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod repository;
pub mod directory;

// Re-export for convenience
pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use repository::*;
pub use directory::*;
