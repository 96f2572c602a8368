//! Error types for the identity layer.

use stafflink_session::SessionError;
use stafflink_store::StoreError;
use stafflink_types::{AccountId, EmployeeId, ValidationError};

use crate::CredentialError;

/// Errors surfaced by the account, link and authentication operations.
///
/// Business outcomes (not found, conflicting link, bad credentials,
/// unusable account) have dedicated variants. Collaborator failures are
/// wrapped unchanged via `#[from]`; nothing here retries.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// No account has this id.
    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    /// No account has this username.
    #[error("no account with username {0:?}")]
    UsernameNotFound(String),

    /// No employee has this id.
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),

    /// The requested link would break the one-to-one Account ⇄ Employee
    /// invariant. `account` and `employee` name the existing link that
    /// blocks it; unlink that pair first, then retry.
    #[error("employee {employee} is already linked to account {account}")]
    ConflictingLink {
        account: AccountId,
        employee: EmployeeId,
    },

    /// Wrong username or password. Deliberately says nothing about which.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Credentials were valid but the account is disabled.
    #[error("account {0:?} is disabled")]
    AccountDisabled(String),

    /// Credentials were valid but the account is locked.
    #[error("account {0:?} is locked")]
    AccountLocked(String),

    /// Another account already uses this username.
    #[error("username {0:?} is already taken")]
    DuplicateUsername(String),

    /// Another account already uses this email address.
    #[error("email {0:?} is already registered")]
    DuplicateEmail(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl IdentityError {
    /// `true` for any "referenced record does not exist" outcome,
    /// including unknown sessions.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound(_)
                | Self::UsernameNotFound(_)
                | Self::EmployeeNotFound(_)
                | Self::Session(SessionError::NotFound(_))
        )
    }
}
