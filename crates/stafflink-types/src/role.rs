//! Role tags and the non-empty role set carried by accounts.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// A role an account can hold.
///
/// This is a closed enum rather than a free-form string: every place
/// that branches on roles is checked exhaustively by the compiler, and
/// a typo like `"ADMN"` is rejected at the parse boundary instead of
/// silently granting nothing.
///
/// The declaration order doubles as the `Ord` order, so a [`RoleSet`]
/// iterates from least to most privileged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Manager,
    Admin,
    Superuser,
}

impl Role {
    /// Every role, least privileged first.
    pub const ALL: [Role; 4] =
        [Role::User, Role::Manager, Role::Admin, Role::Superuser];

    /// The bare tag, e.g. `"ADMIN"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
            Self::Superuser => "SUPERUSER",
        }
    }

    /// The authority tag used by authorization checks, e.g. `"ROLE_ADMIN"`.
    pub fn authority(self) -> String {
        format!("ROLE_{}", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    /// Parses either the bare tag (`"ADMIN"`) or the authority form
    /// (`"ROLE_ADMIN"`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let tag = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == tag)
            .ok_or_else(|| ValidationError::UnknownRole(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// RoleSet
// ---------------------------------------------------------------------------

/// A set of roles that is guaranteed to be non-empty.
///
/// The only way to build one is through [`RoleSet::new`] (or
/// [`RoleSet::single`]), which rejects an empty input. Deserialization
/// goes through the same check, so an account can never end up holding
/// zero roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Role>", into = "Vec<Role>")]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// Builds a role set from any collection of roles.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyRoleSet`] if `roles` yields nothing.
    pub fn new(
        roles: impl IntoIterator<Item = Role>,
    ) -> Result<Self, ValidationError> {
        let set: BTreeSet<Role> = roles.into_iter().collect();
        if set.is_empty() {
            return Err(ValidationError::EmptyRoleSet);
        }
        Ok(Self(set))
    }

    /// A set holding exactly one role.
    pub fn single(role: Role) -> Self {
        Self(BTreeSet::from([role]))
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Authority tags for every role in the set, in role order.
    pub fn authorities(&self) -> Vec<String> {
        self.iter().map(Role::authority).collect()
    }
}

impl TryFrom<Vec<Role>> for RoleSet {
    type Error = ValidationError;

    fn try_from(roles: Vec<Role>) -> Result<Self, Self::Error> {
        Self::new(roles)
    }
}

impl From<RoleSet> for Vec<Role> {
    fn from(set: RoleSet) -> Self {
        set.0.into_iter().collect()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.iter().map(Role::as_str).collect();
        write!(f, "[{}]", tags.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authority_uses_role_prefix() {
        assert_eq!(Role::User.authority(), "ROLE_USER");
        assert_eq!(Role::Superuser.authority(), "ROLE_SUPERUSER");
    }

    #[test]
    fn test_from_str_accepts_bare_and_prefixed_tags() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("ROLE_MANAGER".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!(" user ".parse::<Role>().unwrap(), Role::User);
    }

    #[test]
    fn test_from_str_unknown_tag_returns_error() {
        let result = "janitor".parse::<Role>();
        assert!(
            matches!(result, Err(ValidationError::UnknownRole(ref s)) if s == "janitor")
        );
    }

    #[test]
    fn test_role_set_new_empty_returns_error() {
        let result = RoleSet::new(Vec::new());
        assert_eq!(result, Err(ValidationError::EmptyRoleSet));
    }

    #[test]
    fn test_role_set_new_deduplicates_and_orders() {
        let set =
            RoleSet::new([Role::Admin, Role::User, Role::Admin]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.authorities(), vec!["ROLE_USER", "ROLE_ADMIN"]);
        assert_eq!(set.to_string(), "[USER, ADMIN]");
    }

    #[test]
    fn test_role_set_deserialize_rejects_empty() {
        let result: Result<RoleSet, _> = serde_json::from_str("[]");
        assert!(result.is_err());

        let set: RoleSet = serde_json::from_str(r#"["USER","MANAGER"]"#).unwrap();
        assert!(set.contains(Role::Manager));
    }
}
