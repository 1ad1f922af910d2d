// ============================================================================
// Access Domain - Credential ("user") registry
// ============================================================================
//
// - Value objects (Credential, Role, CheckResult, RosterEntry)
// - Inputs (RegisterCredential)
// - Errors (AccessError enum)
// - Storage port (CredentialRepository)
// - Service (AccessRegistry)
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod repository;
pub mod registry;

pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use repository::*;
pub use registry::*;
