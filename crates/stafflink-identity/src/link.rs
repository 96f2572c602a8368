//! The one-to-one Account ⇄ Employee link.
//!
//! Both records carry an id back-reference to the other. This module is
//! the only writer of either reference, so the invariant
//!
//! ```text
//! account.employee_ref == Some(e.id)   ⇔   employee.user_ref == Some(a.id)
//! ```
//!
//! is enforced in one place. Every operation follows the same rules:
//!
//! 1. All conflict checks run before the first write.
//! 2. The side that initiated the operation writes the *other* side
//!    first, then its own.
//! 3. A one-sided link discovered along the way (left by a crash between
//!    the two writes) is repaired and logged, never surfaced as an error.
//!
//! The two writes are not a transaction. A failure between them leaves a
//! one-sided link, which rule 3 cleans up on the next operation that
//! touches either record.

use serde::Serialize;
use stafflink_session::SharedSessions;
use stafflink_store::EntityStore;
use stafflink_types::{AccountId, EmployeeId, Principal, validate_email, validate_username};

use crate::{
    Account, CredentialDigest, Employee, IdentityError, NewAccount, NewEmployee, Repository,
};

/// An account together with its linked employee, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedAccount {
    pub account: Account,
    pub employee: Option<Employee>,
}

/// An employee together with its linked account, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedEmployee {
    pub employee: Employee,
    pub account: Option<Account>,
}

/// Creates, relinks, unlinks and deletes accounts and employees while
/// keeping their link exclusive.
pub struct EmploymentLinkManager<A, E> {
    repo: Repository<A, E>,
    sessions: SharedSessions,
}

impl<A, E> EmploymentLinkManager<A, E>
where
    A: EntityStore<Account>,
    E: EntityStore<Employee>,
{
    pub fn new(repo: Repository<A, E>, sessions: SharedSessions) -> Self {
        Self { repo, sessions }
    }

    // =======================================================================
    // Linking
    // =======================================================================

    /// Links `employee` to the account, or unlinks the account when
    /// `employee` is `None`.
    ///
    /// An account already linked to another employee is moved: the old
    /// pair is unlinked first. Relinking an already-linked pair is a no-op.
    ///
    /// # Errors
    /// - [`IdentityError::AccountNotFound`] / [`IdentityError::EmployeeNotFound`]
    /// - [`IdentityError::ConflictingLink`] if the employee belongs to a
    ///   different account. Nothing is written in that case.
    pub async fn link_employee_to_account(
        &self,
        actor: &Principal,
        account_id: AccountId,
        employee: Option<EmployeeId>,
    ) -> Result<LinkedAccount, IdentityError> {
        let account = self.repo.find_by_id(account_id).await?;

        let Some(employee_id) = employee else {
            let account = self.detach_account(actor, account).await?;
            return Ok(LinkedAccount {
                account,
                employee: None,
            });
        };

        let mut employee = self.repo.find_employee(employee_id).await?;
        if let Some(owner) = employee.user_ref().filter(|&owner| owner != account_id) {
            return Err(IdentityError::ConflictingLink {
                account: owner,
                employee: employee_id,
            });
        }

        if account.employee_ref() == Some(employee_id) && employee.user_ref() == Some(account_id)
        {
            return Ok(LinkedAccount {
                account,
                employee: Some(employee),
            });
        }

        let mut account = match account.employee_ref() {
            Some(current) if current != employee_id => self.detach_account(actor, account).await?,
            _ => account,
        };

        employee.set_user_ref(Some(account_id));
        let employee = self.repo.save_employee(employee, actor).await?;
        account.set_employee_ref(Some(employee_id));
        let account = self.repo.save(account, actor).await?;

        tracing::info!(
            account = %account_id,
            employee = %employee_id,
            actor = %actor,
            "employee linked to account"
        );
        Ok(LinkedAccount {
            account,
            employee: Some(employee),
        })
    }

    /// The same operation started from the employee side: links
    /// `account` to the employee, or unlinks it when `None`.
    ///
    /// # Errors
    /// [`IdentityError::ConflictingLink`] if the account is linked to a
    /// different employee. Nothing is written in that case.
    pub async fn link_account_to_employee(
        &self,
        actor: &Principal,
        employee_id: EmployeeId,
        account: Option<AccountId>,
    ) -> Result<LinkedEmployee, IdentityError> {
        let employee = self.repo.find_employee(employee_id).await?;

        let Some(account_id) = account else {
            let employee = self.detach_employee(actor, employee).await?;
            return Ok(LinkedEmployee {
                employee,
                account: None,
            });
        };

        let mut account = self.repo.find_by_id(account_id).await?;
        if let Some(current) = account.employee_ref().filter(|&current| current != employee_id) {
            return Err(IdentityError::ConflictingLink {
                account: account_id,
                employee: current,
            });
        }

        if employee.user_ref() == Some(account_id) && account.employee_ref() == Some(employee_id)
        {
            return Ok(LinkedEmployee {
                employee,
                account: Some(account),
            });
        }

        let mut employee = match employee.user_ref() {
            Some(current) if current != account_id => self.detach_employee(actor, employee).await?,
            _ => employee,
        };

        account.set_employee_ref(Some(employee_id));
        let account = self.repo.save(account, actor).await?;
        employee.set_user_ref(Some(account_id));
        let employee = self.repo.save_employee(employee, actor).await?;

        tracing::info!(
            account = %account_id,
            employee = %employee_id,
            actor = %actor,
            "account linked to employee"
        );
        Ok(LinkedEmployee {
            employee,
            account: Some(account),
        })
    }

    /// Clears the employee side of an account's link ahead of deleting
    /// the account, so the employee never points at a missing record.
    ///
    /// The account record itself is not written; callers are expected to
    /// delete it next. [`delete_account`](Self::delete_account) does both.
    pub async fn unlink_on_account_deletion(
        &self,
        actor: &Principal,
        account_id: AccountId,
    ) -> Result<(), IdentityError> {
        let account = self.repo.find_by_id(account_id).await?;
        self.release_employee(actor, &account).await
    }

    // =======================================================================
    // Create / delete
    // =======================================================================

    /// Creates an account, optionally linked to an existing employee.
    ///
    /// # Errors
    /// - [`IdentityError::Validation`] for a malformed username or email
    /// - [`IdentityError::DuplicateUsername`] / [`IdentityError::DuplicateEmail`]
    /// - [`IdentityError::ConflictingLink`] if the employee is already linked
    pub async fn create_account(
        &self,
        actor: &Principal,
        draft: NewAccount,
        credential: CredentialDigest,
        employee: Option<EmployeeId>,
    ) -> Result<LinkedAccount, IdentityError> {
        validate_username(&draft.username)?;
        validate_email(&draft.email)?;

        let existing = self.repo.find_by_username(&draft.username).await;
        match existing {
            Ok(_) => return Err(IdentityError::DuplicateUsername(draft.username)),
            Err(IdentityError::UsernameNotFound(_)) => {}
            Err(e) => return Err(e),
        }
        if self.repo.find_by_email(&draft.email).await?.is_some() {
            return Err(IdentityError::DuplicateEmail(draft.email));
        }

        let linked_employee = match employee {
            None => None,
            Some(employee_id) => {
                let employee = self.repo.find_employee(employee_id).await?;
                if let Some(owner) = employee.user_ref() {
                    return Err(IdentityError::ConflictingLink {
                        account: owner,
                        employee: employee_id,
                    });
                }
                Some(employee)
            }
        };

        let mut account = Account::new(draft, credential);
        let employee = match linked_employee {
            None => None,
            Some(mut employee) => {
                employee.set_user_ref(Some(account.id()));
                account.set_employee_ref(Some(employee.id()));
                Some(self.repo.save_employee(employee, actor).await?)
            }
        };
        let account = self.repo.save(account, actor).await?;

        tracing::info!(
            account = %account.id(),
            username = account.username(),
            employee = ?account.employee_ref(),
            actor = %actor,
            "account created"
        );
        Ok(LinkedAccount { account, employee })
    }

    /// Creates an employee, optionally linked to an existing account.
    ///
    /// # Errors
    /// [`IdentityError::ConflictingLink`] if the account is already linked.
    pub async fn create_employee(
        &self,
        actor: &Principal,
        draft: NewEmployee,
        account: Option<AccountId>,
    ) -> Result<LinkedEmployee, IdentityError> {
        let mut employee = Employee::new(draft);

        let account = match account {
            None => None,
            Some(account_id) => {
                let mut account = self.repo.find_by_id(account_id).await?;
                if let Some(current) = account.employee_ref() {
                    return Err(IdentityError::ConflictingLink {
                        account: account_id,
                        employee: current,
                    });
                }
                account.set_employee_ref(Some(employee.id()));
                employee.set_user_ref(Some(account_id));
                Some(self.repo.save(account, actor).await?)
            }
        };
        let employee = self.repo.save_employee(employee, actor).await?;

        tracing::info!(
            employee = %employee.id(),
            account = ?employee.user_ref(),
            actor = %actor,
            "employee created"
        );
        Ok(LinkedEmployee { employee, account })
    }

    /// Deletes an account: releases its employee, invalidates its
    /// sessions, then removes the record.
    ///
    /// The registry lock is held across invalidation and delete so no
    /// login can open a session on an account that is about to vanish.
    pub async fn delete_account(
        &self,
        actor: &Principal,
        account_id: AccountId,
    ) -> Result<(), IdentityError> {
        let account = self.repo.find_by_id(account_id).await?;
        self.release_employee(actor, &account).await?;

        let mut registry = self.sessions.lock().await;
        registry.invalidate_all(account.username());
        self.repo.delete(&account).await?;
        drop(registry);

        tracing::info!(
            account = %account_id,
            username = account.username(),
            actor = %actor,
            "account deleted"
        );
        Ok(())
    }

    /// Deletes an employee after clearing the linked account's side.
    pub async fn delete_employee(
        &self,
        actor: &Principal,
        employee_id: EmployeeId,
    ) -> Result<(), IdentityError> {
        let employee = self.repo.find_employee(employee_id).await?;
        self.release_account(actor, &employee).await?;
        self.repo.delete_employee(&employee).await?;

        tracing::info!(employee = %employee_id, actor = %actor, "employee deleted");
        Ok(())
    }

    // =======================================================================
    // Internals
    // =======================================================================

    /// Unlinks an account from whatever employee it points at. Returns
    /// the saved account, or the input untouched if it had no link.
    async fn detach_account(
        &self,
        actor: &Principal,
        mut account: Account,
    ) -> Result<Account, IdentityError> {
        if account.employee_ref().is_none() {
            return Ok(account);
        }
        self.release_employee(actor, &account).await?;
        account.set_employee_ref(None);
        let account = self.repo.save(account, actor).await?;
        tracing::info!(account = %account.id(), actor = %actor, "account unlinked");
        Ok(account)
    }

    /// Unlinks an employee from whatever account it points at.
    async fn detach_employee(
        &self,
        actor: &Principal,
        mut employee: Employee,
    ) -> Result<Employee, IdentityError> {
        if employee.user_ref().is_none() {
            return Ok(employee);
        }
        self.release_account(actor, &employee).await?;
        employee.set_user_ref(None);
        let employee = self.repo.save_employee(employee, actor).await?;
        tracing::info!(employee = %employee.id(), actor = %actor, "employee unlinked");
        Ok(employee)
    }

    /// Clears `user_ref` on the employee `account` points at, if that
    /// employee points back. Missing or one-sided counterparts are logged.
    async fn release_employee(
        &self,
        actor: &Principal,
        account: &Account,
    ) -> Result<(), IdentityError> {
        let Some(employee_id) = account.employee_ref() else {
            return Ok(());
        };

        match self.repo.find_employee(employee_id).await {
            Ok(mut employee) if employee.user_ref() == Some(account.id()) => {
                employee.set_user_ref(None);
                self.repo.save_employee(employee, actor).await?;
            }
            Ok(employee) => tracing::warn!(
                account = %account.id(),
                employee = %employee_id,
                points_to = ?employee.user_ref(),
                "one-sided link repaired: employee did not point back"
            ),
            Err(IdentityError::EmployeeNotFound(_)) => tracing::warn!(
                account = %account.id(),
                employee = %employee_id,
                "dangling link repaired: employee no longer exists"
            ),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Clears `employee_ref` on the account `employee` points at, if that
    /// account points back.
    async fn release_account(
        &self,
        actor: &Principal,
        employee: &Employee,
    ) -> Result<(), IdentityError> {
        let Some(account_id) = employee.user_ref() else {
            return Ok(());
        };

        match self.repo.find_by_id(account_id).await {
            Ok(mut account) if account.employee_ref() == Some(employee.id()) => {
                account.set_employee_ref(None);
                self.repo.save(account, actor).await?;
            }
            Ok(account) => tracing::warn!(
                employee = %employee.id(),
                account = %account_id,
                points_to = ?account.employee_ref(),
                "one-sided link repaired: account did not point back"
            ),
            Err(IdentityError::AccountNotFound(_)) => tracing::warn!(
                employee = %employee.id(),
                account = %account_id,
                "dangling link repaired: account no longer exists"
            ),
            Err(e) => return Err(e),
        }
        Ok(())
    }
}
