//! The authenticated identity passed explicitly through the core.
//!
//! There is no ambient "current user". Operations that need to know who
//! is acting (audit stamps, authorization) take a `&Principal` argument.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Role, RoleSet};

/// Username recorded for writes made by the system itself.
const SYSTEM_USERNAME: &str = "system";

/// An authenticated identity: a username plus the roles it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The account's username at the time of authentication.
    pub username: String,

    /// Roles at the time the principal was built. A principal is rebuilt
    /// on every resumed request, so role changes show up there.
    pub roles: RoleSet,
}

impl Principal {
    pub fn new(username: impl Into<String>, roles: RoleSet) -> Self {
        Self {
            username: username.into(),
            roles,
        }
    }

    /// The principal used for bootstrap and maintenance writes that have
    /// no human actor.
    pub fn system() -> Self {
        Self::new(SYSTEM_USERNAME, RoleSet::single(Role::Superuser))
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    /// Authority tags (`ROLE_<NAME>`) for authorization checks.
    pub fn authorities(&self) -> Vec<String> {
        self.roles.authorities()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}
