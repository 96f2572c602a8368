//! The session registry: tracks every live session by principal.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Issuing sessions when a login succeeds
//! - Answering count/detail queries per principal
//! - Bulk invalidation when an account must be cut off
//! - Refreshing sessions as they authenticate requests
//! - Removing idle-expired sessions
//!
//! # Concurrency note
//!
//! `SessionRegistry` itself is a plain single-owner structure (`&mut self`
//! for writes). The engines share one instance through [`SharedSessions`],
//! a tokio mutex, so every read sees every completed write immediately.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use stafflink_types::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::{Session, SessionConfig, SessionError, SessionId, SessionInfo};

/// The handle through which engines share one registry.
pub type SharedSessions = Arc<Mutex<SessionRegistry>>;

/// Registry of all live sessions.
///
/// ## Lifecycle
///
/// ```text
/// login ──→ create() ──→ touch() ... touch() ──→ destroy()        (logout)
///                 │                              invalidate_all() (admin cut-off)
///                 │
///                 └──(idle > timeout)──→ expired ──→ cleanup_expired()
/// ```
pub struct SessionRegistry {
    /// All sessions, keyed by their token.
    sessions: HashMap<SessionId, Session>,

    /// Principal name → that principal's session ids, oldest first.
    /// Kept in sync with `sessions`.
    by_principal: HashMap<String, Vec<SessionId>>,

    config: SessionConfig,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    /// Creates an empty registry that reads system time.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an empty registry that reads time from `clock`.
    pub fn with_clock(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: HashMap::new(),
            by_principal: HashMap::new(),
            config,
            clock,
        }
    }

    /// Wraps the registry for sharing between engines.
    pub fn into_shared(self) -> SharedSessions {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Issues a new session for `principal_name`.
    ///
    /// Other sessions of the same principal are left untouched unless the
    /// configured per-principal cap is reached, in which case the oldest
    /// ones are evicted to make room.
    pub fn create(&mut self, principal_name: &str) -> Session {
        if let Some(cap) = self.config.session_cap() {
            self.evict_oldest_beyond(principal_name, cap.saturating_sub(1));
        }

        let now = self.clock.now();
        let session = Session {
            id: SessionId::new(generate_token()),
            principal_name: principal_name.to_string(),
            created_at: now,
            last_accessed_at: now,
        };

        self.by_principal
            .entry(principal_name.to_string())
            .or_default()
            .push(session.id.clone());
        self.sessions.insert(session.id.clone(), session.clone());

        tracing::info!(principal = principal_name, session = %session.id, "session created");
        session
    }

    /// Number of non-expired sessions for a principal. Unknown principals
    /// have zero.
    pub fn count_active(&self, principal_name: &str) -> usize {
        let now = self.clock.now();
        let timeout = self.config.idle_timeout();
        self.sessions_of(principal_name)
            .filter(|s| !s.is_expired_at(now, timeout))
            .count()
    }

    /// Every session of a principal, expired or not, oldest first.
    pub fn list_sessions(&self, principal_name: &str) -> Vec<SessionInfo> {
        let now = self.clock.now();
        let timeout = self.config.idle_timeout();
        let mut infos: Vec<SessionInfo> = self
            .sessions_of(principal_name)
            .map(|s| SessionInfo {
                id: s.id.clone(),
                principal_name: s.principal_name.clone(),
                created_at: s.created_at,
                last_accessed_at: s.last_accessed_at,
                expired: s.is_expired_at(now, timeout),
            })
            .collect();
        // Index order is insertion order already; the stable sort only
        // matters if the clock ever stepped backwards.
        infos.sort_by_key(|info| info.created_at);
        infos
    }

    /// Deletes every session of a principal and returns how many were
    /// removed. Invalidating a principal without sessions is a no-op.
    pub fn invalidate_all(&mut self, principal_name: &str) -> usize {
        let ids = self.by_principal.remove(principal_name).unwrap_or_default();
        for id in &ids {
            self.sessions.remove(id);
        }

        if ids.is_empty() {
            tracing::debug!(principal = principal_name, "no sessions to invalidate");
        } else {
            tracing::info!(
                principal = principal_name,
                count = ids.len(),
                "sessions invalidated"
            );
        }
        ids.len()
    }

    /// Removes a single session (logout).
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no such session exists.
    pub fn destroy(&mut self, id: &SessionId) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        self.unindex(&session);

        tracing::info!(principal = %session.principal_name, session = %id, "session destroyed");
        Ok(session)
    }

    /// Resolves a session for a new request and refreshes its
    /// `last_accessed_at`.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] — destroyed, invalidated or never issued
    /// - [`SessionError::Expired`] — idle past the timeout; left in place
    ///   for listings until [`cleanup_expired`](Self::cleanup_expired)
    pub fn touch(&mut self, id: &SessionId) -> Result<Session, SessionError> {
        let now = self.clock.now();
        let timeout = self.config.idle_timeout();
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;

        if session.is_expired_at(now, timeout) {
            return Err(SessionError::Expired(id.clone()));
        }
        session.last_accessed_at = now;
        Ok(session.clone())
    }

    /// Looks up a session without refreshing it.
    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Removes every idle-expired session and returns the removed ids.
    pub fn cleanup_expired(&mut self) -> Vec<SessionId> {
        let now = self.clock.now();
        let timeout = self.config.idle_timeout();
        let expired: Vec<Session> = self
            .sessions
            .values()
            .filter(|s| s.is_expired_at(now, timeout))
            .cloned()
            .collect();

        for session in &expired {
            self.sessions.remove(&session.id);
            self.unindex(session);
            tracing::debug!(
                principal = %session.principal_name,
                session = %session.id,
                "expired session removed"
            );
        }
        expired.into_iter().map(|s| s.id).collect()
    }

    /// Usernames that currently hold at least one session, sorted.
    pub fn principals(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_principal.keys().cloned().collect();
        names.sort();
        names
    }

    /// Total number of sessions (any state).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    // -- internals --------------------------------------------------------

    fn sessions_of(
        &self,
        principal_name: &str,
    ) -> impl Iterator<Item = &Session> {
        self.by_principal
            .get(principal_name)
            .into_iter()
            .flatten()
            .filter_map(|id| self.sessions.get(id))
    }

    /// Drops `session` from the principal index, removing the principal
    /// entry once it has no sessions left.
    fn unindex(&mut self, session: &Session) {
        if let Some(ids) = self.by_principal.get_mut(&session.principal_name) {
            ids.retain(|id| *id != session.id);
            if ids.is_empty() {
                self.by_principal.remove(&session.principal_name);
            }
        }
    }

    /// Evicts the principal's oldest sessions until at most `keep` remain.
    fn evict_oldest_beyond(&mut self, principal_name: &str, keep: usize) {
        let Some(ids) = self.by_principal.get_mut(principal_name) else {
            return;
        };
        let excess = ids.len().saturating_sub(keep);
        let evicted: Vec<SessionId> = ids.drain(..excess).collect();
        if ids.is_empty() {
            self.by_principal.remove(principal_name);
        }
        for id in evicted {
            self.sessions.remove(&id);
            tracing::info!(principal = principal_name, session = %id, "session evicted (per-principal cap)");
        }
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionRegistry`, named
    //! `test_{function}_{scenario}_{expected}`.
    //!
    //! Time is driven by a `ManualClock`, so idle expiry is tested by
    //! advancing the clock rather than sleeping.

    use chrono::Duration;
    use stafflink_types::ManualClock;

    use super::*;

    // -- Helpers ----------------------------------------------------------

    /// A registry with a 60-second idle timeout and the clock that drives it.
    fn registry() -> (SessionRegistry, Arc<ManualClock>) {
        registry_with(SessionConfig {
            idle_timeout_secs: 60,
            max_sessions_per_principal: None,
        })
    }

    fn registry_with(config: SessionConfig) -> (SessionRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (SessionRegistry::with_clock(config, clock.clone()), clock)
    }

    // =====================================================================
    // create()
    // =====================================================================

    #[test]
    fn test_create_new_principal_returns_fresh_session() {
        let (mut reg, clock) = registry();

        let session = reg.create("alice");

        assert_eq!(session.principal_name, "alice");
        assert_eq!(session.created_at, clock.now());
        assert_eq!(session.last_accessed_at, clock.now());
        assert_eq!(session.id.expose().len(), 32);
        assert_eq!(reg.count_active("alice"), 1);
    }

    #[test]
    fn test_create_same_principal_twice_keeps_both() {
        // Logging in again must not disturb the existing session.
        let (mut reg, _) = registry();
        let first = reg.create("alice");
        let second = reg.create("alice");

        assert_ne!(first.id, second.id, "tokens must be unique");
        assert_eq!(reg.count_active("alice"), 2);
        assert!(reg.get(&first.id).is_some());
    }

    #[test]
    fn test_create_beyond_cap_evicts_oldest() {
        let (mut reg, clock) = registry_with(SessionConfig {
            idle_timeout_secs: 60,
            max_sessions_per_principal: Some(2),
        });
        let oldest = reg.create("alice");
        clock.advance(Duration::seconds(1));
        let middle = reg.create("alice");
        clock.advance(Duration::seconds(1));
        let newest = reg.create("alice");

        let ids: Vec<SessionId> =
            reg.list_sessions("alice").into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![middle.id, newest.id]);
        assert!(reg.get(&oldest.id).is_none());
    }

    #[test]
    fn test_create_zero_cap_is_unbounded() {
        let (mut reg, _) = registry_with(SessionConfig {
            idle_timeout_secs: 60,
            max_sessions_per_principal: Some(0),
        });
        let first = reg.create("alice");
        reg.create("alice");
        reg.create("alice");

        assert_eq!(reg.count_active("alice"), 3);
        assert!(reg.get(&first.id).is_some());
    }

    #[test]
    fn test_create_cap_is_per_principal() {
        let (mut reg, _) = registry_with(SessionConfig {
            idle_timeout_secs: 60,
            max_sessions_per_principal: Some(1),
        });
        reg.create("alice");
        reg.create("bob");

        assert_eq!(reg.count_active("alice"), 1);
        assert_eq!(reg.count_active("bob"), 1);
    }

    // =====================================================================
    // count_active() / list_sessions()
    // =====================================================================

    #[test]
    fn test_count_active_unknown_principal_returns_zero() {
        let (reg, _) = registry();
        assert_eq!(reg.count_active("nobody"), 0);
    }

    #[test]
    fn test_count_active_excludes_idle_expired() {
        let (mut reg, clock) = registry();
        reg.create("alice");
        clock.advance(Duration::seconds(61));
        reg.create("alice");

        assert_eq!(reg.count_active("alice"), 1);
        assert_eq!(reg.list_sessions("alice").len(), 2);
    }

    #[test]
    fn test_list_sessions_orders_by_creation_and_flags_expired() {
        let (mut reg, clock) = registry();
        let a = reg.create("alice");
        clock.advance(Duration::seconds(30));
        let b = reg.create("alice");
        clock.advance(Duration::seconds(31));

        let infos = reg.list_sessions("alice");

        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].id, a.id);
        assert!(infos[0].expired, "61s idle should be expired");
        assert_eq!(infos[1].id, b.id);
        assert!(!infos[1].expired);
    }

    #[test]
    fn test_list_sessions_unknown_principal_returns_empty() {
        let (reg, _) = registry();
        assert!(reg.list_sessions("nobody").is_empty());
    }

    // =====================================================================
    // invalidate_all()
    // =====================================================================

    #[test]
    fn test_invalidate_all_removes_only_that_principal() {
        let (mut reg, _) = registry();
        reg.create("alice");
        reg.create("alice");
        let bob = reg.create("bob");

        let removed = reg.invalidate_all("alice");

        assert_eq!(removed, 2);
        assert_eq!(reg.count_active("alice"), 0);
        assert!(reg.list_sessions("alice").is_empty());
        assert!(reg.get(&bob.id).is_some());
        assert_eq!(reg.principals(), vec!["bob".to_string()]);
    }

    #[test]
    fn test_invalidate_all_twice_is_idempotent() {
        let (mut reg, _) = registry();
        reg.create("alice");

        assert_eq!(reg.invalidate_all("alice"), 1);
        assert_eq!(reg.count_active("alice"), 0);
        assert_eq!(reg.invalidate_all("alice"), 0);
        assert_eq!(reg.count_active("alice"), 0);
    }

    #[test]
    fn test_invalidate_all_then_touch_returns_not_found() {
        // Once invalidated, no new request may authenticate with the token.
        let (mut reg, _) = registry();
        let s = reg.create("alice");
        reg.invalidate_all("alice");

        assert_eq!(reg.touch(&s.id), Err(SessionError::NotFound(s.id.clone())));
    }

    // =====================================================================
    // destroy()
    // =====================================================================

    #[test]
    fn test_destroy_removes_single_session() {
        let (mut reg, _) = registry();
        let first = reg.create("alice");
        let second = reg.create("alice");

        let removed = reg.destroy(&first.id).expect("should succeed");

        assert_eq!(removed.id, first.id);
        assert_eq!(reg.count_active("alice"), 1);
        assert!(reg.get(&second.id).is_some());
    }

    #[test]
    fn test_destroy_last_session_drops_principal() {
        let (mut reg, _) = registry();
        let s = reg.create("alice");
        reg.destroy(&s.id).unwrap();

        assert!(reg.principals().is_empty());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_destroy_unknown_returns_not_found() {
        let (mut reg, _) = registry();
        let id = SessionId::from_token("deadbeef");

        assert_eq!(reg.destroy(&id), Err(SessionError::NotFound(id.clone())));
    }

    // =====================================================================
    // touch()
    // =====================================================================

    #[test]
    fn test_touch_refreshes_last_accessed() {
        let (mut reg, clock) = registry();
        let s = reg.create("alice");
        clock.advance(Duration::seconds(45));

        let touched = reg.touch(&s.id).unwrap();

        assert_eq!(touched.last_accessed_at, clock.now());
        assert_eq!(touched.created_at, s.created_at);

        // Another 45s is fine because the idle window restarted.
        clock.advance(Duration::seconds(45));
        assert!(reg.touch(&s.id).is_ok());
    }

    #[test]
    fn test_touch_idle_session_returns_expired() {
        let (mut reg, clock) = registry();
        let s = reg.create("alice");
        clock.advance(Duration::seconds(61));

        assert_eq!(reg.touch(&s.id), Err(SessionError::Expired(s.id.clone())));
        assert!(reg.get(&s.id).is_some(), "expired sessions stay listed");
    }

    #[test]
    fn test_touch_without_idle_timeout_never_expires() {
        let (mut reg, clock) = registry_with(SessionConfig {
            idle_timeout_secs: 0,
            max_sessions_per_principal: None,
        });
        let s = reg.create("alice");
        clock.advance(Duration::days(30));

        assert!(reg.touch(&s.id).is_ok());
    }

    // =====================================================================
    // cleanup_expired()
    // =====================================================================

    #[test]
    fn test_cleanup_expired_removes_only_idle_sessions() {
        let (mut reg, clock) = registry();
        let stale = reg.create("alice");
        clock.advance(Duration::seconds(61));
        let fresh = reg.create("alice");
        let bob = reg.create("bob");

        let removed = reg.cleanup_expired();

        assert_eq!(removed, vec![stale.id.clone()]);
        assert!(reg.get(&stale.id).is_none());
        assert!(reg.get(&fresh.id).is_some());
        assert!(reg.get(&bob.id).is_some());
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_cleanup_expired_with_nothing_idle_returns_empty() {
        let (mut reg, _) = registry();
        reg.create("alice");
        assert!(reg.cleanup_expired().is_empty());
        assert_eq!(reg.len(), 1);
    }
}
