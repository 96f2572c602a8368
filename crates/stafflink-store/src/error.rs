//! Error types for the storage layer.

/// Errors a store can report.
///
/// These are infrastructure failures. The identity core never retries or
/// reinterprets them; it wraps and propagates them as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A delete targeted a record that does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// The record changed since it was read. The caller should reload
    /// and reapply its change.
    #[error("{kind} {id} was modified concurrently (expected version {expected}, found {found})")]
    StaleVersion {
        kind: &'static str,
        id: String,
        expected: u64,
        found: u64,
    },

    /// The backend itself failed (connection lost, disk full, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}
