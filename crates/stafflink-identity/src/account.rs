//! Account and employee records.
//!
//! The two records point at each other through id-based back-references
//! (`Account::employee_ref`, `Employee::user_ref`). Both fields are
//! private and their setters are crate-internal: only the
//! [`EmploymentLinkManager`](crate::EmploymentLinkManager) writes them,
//! so the Exclusive Link invariant has a single writer.
//!
//! Store backends that persist records outside the process go through
//! [`AccountRecord`] and [`EmployeeRecord`]: `to_record` flattens a record
//! into plain fields for writing, `restore` rebuilds it on read.

use std::fmt;

use serde::Serialize;
use stafflink_store::{Audit, Entity};
use stafflink_types::{AccountId, EmployeeId, RoleSet};

// ---------------------------------------------------------------------------
// CredentialDigest
// ---------------------------------------------------------------------------

/// A one-way password hash in PHC string form.
///
/// `Debug` never prints the value, and the type is not `Serialize`, so a
/// digest cannot leak through logs or API responses by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialDigest(String);

impl CredentialDigest {
    /// Wraps a PHC string produced by a [`CredentialHasher`](crate::CredentialHasher).
    pub fn new(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialDigest(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// Fields an administrator supplies when creating an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub roles: RoleSet,
}

/// Every stored field of an [`Account`], as a store backend sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub credential: CredentialDigest,
    pub roles: RoleSet,
    pub enabled: bool,
    pub locked: bool,
    pub employee_ref: Option<EmployeeId>,
    pub audit: Audit,
}

/// A user identity capable of authenticating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    id: AccountId,
    username: String,
    email: String,
    #[serde(skip)]
    credential: CredentialDigest,
    roles: RoleSet,
    enabled: bool,
    locked: bool,
    employee_ref: Option<EmployeeId>,
    #[serde(skip)]
    audit: Audit,
}

impl Account {
    /// A fresh, enabled, unlocked, unlinked account.
    pub(crate) fn new(draft: NewAccount, credential: CredentialDigest) -> Self {
        Self {
            id: AccountId::new(),
            username: draft.username,
            email: draft.email,
            credential,
            roles: draft.roles,
            enabled: true,
            locked: false,
            employee_ref: None,
            audit: Audit::default(),
        }
    }

    /// Rebuilds an account a store backend read back from persistence.
    ///
    /// Only store implementations should call this. The identity core
    /// never trusts a restored `employee_ref` blindly: the link manager
    /// re-checks the other side before acting on it.
    pub fn restore(record: AccountRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            credential: record.credential,
            roles: record.roles,
            enabled: record.enabled,
            locked: record.locked,
            employee_ref: record.employee_ref,
            audit: record.audit,
        }
    }

    /// Flattens the account for a store backend to write.
    pub fn to_record(&self) -> AccountRecord {
        AccountRecord {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            credential: self.credential.clone(),
            roles: self.roles.clone(),
            enabled: self.enabled,
            locked: self.locked,
            employee_ref: self.employee_ref,
            audit: self.audit.clone(),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Enabled and not locked.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.locked
    }

    /// The linked employee, if any.
    pub fn employee_ref(&self) -> Option<EmployeeId> {
        self.employee_ref
    }

    pub(crate) fn credential(&self) -> &CredentialDigest {
        &self.credential
    }

    // -- mutation, crate-internal ------------------------------------------

    pub(crate) fn set_status(&mut self, enabled: bool, locked: bool) {
        self.enabled = enabled;
        self.locked = locked;
    }

    pub(crate) fn set_roles(&mut self, roles: RoleSet) {
        self.roles = roles;
    }

    pub(crate) fn set_credential(&mut self, credential: CredentialDigest) {
        self.credential = credential;
    }

    /// Link manager only.
    pub(crate) fn set_employee_ref(&mut self, employee: Option<EmployeeId>) {
        self.employee_ref = employee;
    }
}

impl Entity for Account {
    type Id = AccountId;
    const KIND: &'static str = "account";

    fn id(&self) -> AccountId {
        self.id
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }
}

// ---------------------------------------------------------------------------
// Employee
// ---------------------------------------------------------------------------

/// Fields supplied when creating an employee record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

/// Every stored field of an [`Employee`], as a store backend sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub user_ref: Option<AccountId>,
    pub audit: Audit,
}

/// A personnel record, optionally linked to one account.
///
/// The biographical fields are public and can be edited freely; only the
/// account link is guarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Employee {
    id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    user_ref: Option<AccountId>,
    #[serde(skip)]
    audit: Audit,
}

impl Employee {
    pub(crate) fn new(draft: NewEmployee) -> Self {
        Self {
            id: EmployeeId::new(),
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            user_ref: None,
            audit: Audit::default(),
        }
    }

    /// Rebuilds an employee a store backend read back from persistence.
    pub fn restore(record: EmployeeRecord) -> Self {
        Self {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            user_ref: record.user_ref,
            audit: record.audit,
        }
    }

    /// Flattens the employee for a store backend to write.
    pub fn to_record(&self) -> EmployeeRecord {
        EmployeeRecord {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            user_ref: self.user_ref,
            audit: self.audit.clone(),
        }
    }

    pub fn id(&self) -> EmployeeId {
        self.id
    }

    /// "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The linked account, if any.
    pub fn user_ref(&self) -> Option<AccountId> {
        self.user_ref
    }

    /// Link manager only.
    pub(crate) fn set_user_ref(&mut self, account: Option<AccountId>) {
        self.user_ref = account;
    }
}

impl Entity for Employee {
    type Id = EmployeeId;
    const KIND: &'static str = "employee";

    fn id(&self) -> EmployeeId {
        self.id
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }
}
