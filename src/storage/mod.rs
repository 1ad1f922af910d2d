// ============================================================================
// Storage Adapters
// ============================================================================
//
// Both stores implement `GuestRepository` and `CredentialRepository` over
// one shared dataset, since deleting a guest must unlink its credential.
//
// ============================================================================

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
