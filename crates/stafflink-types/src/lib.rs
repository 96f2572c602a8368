//! Shared vocabulary for Stafflink.
//!
//! This crate defines the types every other layer speaks:
//!
//! - **Identifiers** ([`AccountId`], [`EmployeeId`]) — opaque, typed ids
//!   for the two linked record kinds.
//! - **Roles** ([`Role`], [`RoleSet`]) — a closed set of role tags and a
//!   set type that can never be empty.
//! - **Principals** ([`Principal`]) — the authenticated identity that is
//!   passed explicitly into every operation that needs to know who is
//!   calling.
//! - **Time** ([`Clock`], [`SystemClock`], and `ManualClock` behind the
//!   `testing` feature) — an injectable time source for session and
//!   audit timestamps.
//! - **Validation** ([`validate_username`], [`validate_email`]) — field
//!   rules shared by account creation and updates.
//!
//! # Architecture
//!
//! ```text
//! Identity (accounts, links, login)  → Session (registry)
//!              ↓                            ↓
//!           Store (entity collaborator)  → Types (this crate)
//! ```

mod clock;
mod error;
mod ids;
mod principal;
mod role;
mod validate;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::ManualClock;
pub use error::ValidationError;
pub use ids::{AccountId, EmployeeId};
pub use principal::Principal;
pub use role::{Role, RoleSet};
pub use validate::{
    USERNAME_MAX_LEN, USERNAME_MIN_LEN, validate_email, validate_username,
};
