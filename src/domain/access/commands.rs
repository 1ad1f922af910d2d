use serde::Deserialize;

// ============================================================================
// Access Registry Inputs
// ============================================================================

/// Link a new access code to the guest owning `phone`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterCredential {
    pub phone: String,
    #[serde(alias = "uracf")]
    pub code: String,
}

