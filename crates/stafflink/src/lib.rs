//! # Stafflink
//!
//! Identity and employment-link lifecycle core for HR administration
//! backends.
//!
//! Stafflink owns user accounts, their live sessions, and the exclusive
//! link between an account and an employee record. The host application
//! keeps its own transport and routing and calls in here with explicit
//! [`Principal`]s.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stafflink::prelude::*;
//!
//! # async fn run() -> Result<(), StafflinkError> {
//! stafflink::init_tracing();
//! let core = IdentityCore::builder().build().await?;
//!
//! let admin = Principal::system();
//! let alice = core
//!     .create_account(
//!         &admin,
//!         NewAccount {
//!             username: "alice".into(),
//!             email: "alice@example.com".into(),
//!             roles: RoleSet::single(Role::User),
//!         },
//!         "correct horse battery",
//!         None,
//!     )
//!     .await?;
//!
//! let ctx = core.gateway().login("alice", "correct horse battery").await?;
//! core.state()
//!     .set_status(&admin, alice.account.id(), false, false)
//!     .await?;
//! assert_eq!(core.count_active("alice").await, 0);
//! # drop(ctx);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod service;
mod telemetry;

pub use config::StafflinkConfig;
pub use error::StafflinkError;
pub use service::{IdentityCore, IdentityCoreBuilder};
pub use telemetry::{DEFAULT_FILTER, init_tracing};

pub use stafflink_identity as identity;
pub use stafflink_session as session;
pub use stafflink_store as store;
pub use stafflink_types as types;

pub use stafflink_types::Principal;

/// Everything a host usually needs, in one import.
pub mod prelude {
    pub use crate::{IdentityCore, IdentityCoreBuilder, StafflinkConfig, StafflinkError};
    pub use stafflink_identity::{
        Account, AuthGateway, CredentialConfig, Employee, IdentityError, LinkedAccount,
        LinkedEmployee, NewAccount, NewEmployee, SecurityContext,
    };
    pub use stafflink_session::{SessionConfig, SessionId, SessionInfo};
    pub use stafflink_types::{AccountId, EmployeeId, Principal, Role, RoleSet};
}
