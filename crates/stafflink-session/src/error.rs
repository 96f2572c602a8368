//! Error types for the session layer.

use crate::SessionId;

/// Errors that can occur when addressing a single session.
///
/// Principal-level operations (`count_active`, `invalidate_all`, ...)
/// never fail: an unknown principal simply has zero sessions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No session with this id exists. It was never issued, was logged
    /// out, or was removed by an invalidation.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The session exists but has been idle longer than the configured
    /// timeout. The principal must log in again.
    #[error("session {0} expired")]
    Expired(SessionId),
}
