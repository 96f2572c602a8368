//! Unified error type for the Stafflink facade.

use stafflink_identity::{CredentialError, IdentityError};
use stafflink_session::SessionError;
use stafflink_store::StoreError;
use stafflink_types::ValidationError;

/// Top-level error that wraps all crate-specific errors.
///
/// Hosts that only use the `stafflink` crate deal with this single type.
/// Each variant's `#[from]` lets `?` convert sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum StafflinkError {
    /// An identity-level outcome (not found, conflict, bad credentials).
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// A session-level error (unknown or expired session).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A storage collaborator failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A credential hasher failure, including bad cost parameters.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Malformed input data.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl StafflinkError {
    /// The identity error inside, if this is one.
    pub fn as_identity(&self) -> Option<&IdentityError> {
        match self {
            Self::Identity(e) => Some(e),
            _ => None,
        }
    }
}
