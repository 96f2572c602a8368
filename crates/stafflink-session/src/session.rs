//! Session types: the data structures that represent one login.
//!
//! A session tracks:
//! - WHO logged in (the principal's username)
//! - WHEN it started and when it was last used
//! - HOW the client refers to it (a secret random id)

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Characters of the id shown in logs and error messages.
const VISIBLE_ID_CHARS: usize = 8;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
///
/// Missing fields fall back to [`Default`] when deserialized, so a host
/// config file only needs to mention what it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long (in seconds) a session may sit unused before it counts
    /// as expired.
    ///
    /// Default: 1800 (30 minutes). Set to 0 to disable idle expiry.
    pub idle_timeout_secs: u64,

    /// Upper bound on concurrent sessions per principal. When a login
    /// would exceed it, that principal's oldest session is evicted.
    ///
    /// Default: `None` (unbounded). `Some(0)` also means unbounded, the
    /// same way 0 disables the idle timeout.
    pub max_sessions_per_principal: Option<usize>,
}

impl SessionConfig {
    /// The per-principal cap, or `None` when sessions are unbounded.
    pub fn session_cap(&self) -> Option<usize> {
        self.max_sessions_per_principal.filter(|&cap| cap > 0)
    }

    /// The idle timeout, or `None` when idle expiry is disabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0)
            .then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 1800,
            max_sessions_per_principal: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Opaque session token assigned by the registry.
///
/// The full value is a bearer secret, so `Display` and `Debug` only show
/// a short prefix. Use [`SessionId::expose`] when the token really has
/// to leave the process (e.g. in the login response).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub(crate) fn new(token: String) -> Self {
        Self(token)
    }

    /// Wraps a token received from a client.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The full token.
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn visible(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(VISIBLE_ID_CHARS)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}…", self.visible())
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionId").field(&self.visible()).finish()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One authenticated login.
///
/// Created by the registry when a login succeeds. Lives until logout,
/// bulk invalidation, or removal by the reaper after idle expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,

    /// Username of the owning account.
    pub principal_name: String,

    pub created_at: DateTime<Utc>,

    /// Bumped every time the session authenticates a request.
    pub last_accessed_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has been idle longer than `idle_timeout` as
    /// of `now`. A `None` timeout never expires.
    pub fn is_expired_at(
        &self,
        now: DateTime<Utc>,
        idle_timeout: Option<Duration>,
    ) -> bool {
        match idle_timeout {
            None => false,
            Some(timeout) => match (now - self.last_accessed_at).to_std() {
                Ok(idle) => idle > timeout,
                // last access lies in the future (clock skew): not idle
                Err(_) => false,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// SessionInfo
// ---------------------------------------------------------------------------

/// A point-in-time view of a session for administrative listings, with
/// the derived `expired` flag resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub principal_name: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub expired: bool,
}
