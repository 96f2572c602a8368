//! Live session tracking for Stafflink.
//!
//! This crate owns the server-side record of who is logged in:
//!
//! 1. **Sessions** — one [`Session`] per successful login, keyed by an
//!    opaque random [`SessionId`] and grouped by principal (username).
//! 2. **The registry** — [`SessionRegistry`] answers "how many live
//!    sessions does alice have?" and performs bulk invalidation when an
//!    account is disabled, locked, re-keyed or deleted.
//! 3. **Idle expiry** — sessions idle past
//!    [`SessionConfig::idle_timeout_secs`] read as expired, and
//!    [`spawn_reaper`] periodically removes them.
//!
//! # How it fits in the stack
//!
//! ```text
//! Identity (login, status changes, deletion)  ← creates/invalidates sessions
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Types (Clock)
//! ```

mod error;
mod reaper;
mod registry;
mod session;

pub use error::SessionError;
pub use reaper::spawn_reaper;
pub use registry::{SessionRegistry, SharedSessions};
pub use session::{Session, SessionConfig, SessionId, SessionInfo};
