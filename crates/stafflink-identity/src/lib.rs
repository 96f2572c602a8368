//! Accounts, employee links and authentication for Stafflink.
//!
//! This is where the identity rules live. Everything below it (types,
//! storage, sessions) is plumbing; everything above it (HTTP, admin UI)
//! calls in here with already-validated input and an explicit acting
//! [`Principal`](stafflink_types::Principal).
//!
//! # Components
//!
//! - [`CredentialVerifier`] — wraps the one-way [`CredentialHasher`]
//!   ([`Argon2Hasher`] by default).
//! - [`Repository`] — typed lookups over the account and employee
//!   [`EntityStore`](stafflink_store::EntityStore)s.
//! - [`AccountStateEngine`] — enable/disable, lock/unlock, roles,
//!   passwords, and the session cut-offs each of those implies.
//! - [`EmploymentLinkManager`] — the exclusive Account ⇄ Employee link,
//!   plus create and delete flows that must respect it.
//! - [`AuthGateway`] — login, per-request resume, logout.
//!
//! The three engines never call each other. They share a
//! [`Repository`] and a [`SharedSessions`](stafflink_session::SharedSessions)
//! handle, and the host composes them per request.

mod account;
mod credential;
mod error;
mod gateway;
mod link;
mod repository;
mod state;

#[cfg(test)]
mod testutil;

pub use account::{
    Account, AccountRecord, CredentialDigest, Employee, EmployeeRecord, NewAccount, NewEmployee,
};
pub use credential::{
    Argon2Hasher, CredentialConfig, CredentialError, CredentialHasher, CredentialVerifier,
};
pub use error::IdentityError;
pub use gateway::{AuthGateway, SecurityContext};
pub use link::{EmploymentLinkManager, LinkedAccount, LinkedEmployee};
pub use repository::Repository;
pub use state::AccountStateEngine;
