//! Error types for field validation.

/// A value failed one of the shared field rules.
///
/// The HTTP layer validates requests before they reach the core, so these
/// errors mostly guard programmatic callers (bootstrap scripts, tests).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Username length is outside the allowed range.
    #[error("username must be {min}-{max} characters, got {len}")]
    UsernameLength { len: usize, min: usize, max: usize },

    /// The email address is not well formed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// A role set must contain at least one role.
    #[error("role set must not be empty")]
    EmptyRoleSet,

    /// A role tag did not match any known role.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}
