//! Pass-through adapter over the account and employee stores.
//!
//! Turns "no such record" into typed [`IdentityError`] variants and adds
//! the lookups the engines need (by username, by email, substring search).
//! Persistence itself stays with the [`EntityStore`] implementations.

use std::sync::Arc;

use stafflink_store::EntityStore;
use stafflink_types::{AccountId, EmployeeId, Principal};

use crate::{Account, Employee, IdentityError};

/// Account and employee persistence, as the engines see it.
pub struct Repository<A, E> {
    accounts: Arc<A>,
    employees: Arc<E>,
}

impl<A, E> Clone for Repository<A, E> {
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
            employees: Arc::clone(&self.employees),
        }
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn account_matches(account: &Account, needle_lower: &str) -> bool {
    contains_ci(account.username(), needle_lower) || contains_ci(account.email(), needle_lower)
}

fn employee_matches(employee: &Employee, needle_lower: &str) -> bool {
    contains_ci(&employee.full_name(), needle_lower)
        || employee
            .email
            .as_deref()
            .is_some_and(|email| contains_ci(email, needle_lower))
}

fn sort_accounts(mut accounts: Vec<Account>) -> Vec<Account> {
    accounts.sort_by(|a, b| a.username().cmp(b.username()));
    accounts
}

fn sort_employees(mut employees: Vec<Employee>) -> Vec<Employee> {
    employees.sort_by(|a, b| {
        (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
    });
    employees
}

impl<A, E> Repository<A, E>
where
    A: EntityStore<Account>,
    E: EntityStore<Employee>,
{
    pub fn new(accounts: Arc<A>, employees: Arc<E>) -> Self {
        Self {
            accounts,
            employees,
        }
    }

    // =======================================================================
    // Accounts
    // =======================================================================

    pub async fn find_by_id(&self, id: AccountId) -> Result<Account, IdentityError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::AccountNotFound(id))
    }

    /// Exact, case-sensitive username lookup.
    pub async fn find_by_username(&self, username: &str) -> Result<Account, IdentityError> {
        let wanted = username.to_owned();
        self.accounts
            .find_where(move |account| account.username() == wanted)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| IdentityError::UsernameNotFound(username.to_owned()))
    }

    /// Case-insensitive email lookup. `Ok(None)` when nobody uses it.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, IdentityError> {
        let wanted = email.to_lowercase();
        Ok(self
            .accounts
            .find_where(move |account| account.email().to_lowercase() == wanted)
            .await?
            .into_iter()
            .next())
    }

    /// Accounts whose username or email contains `term`, ignoring case,
    /// sorted by username. An empty term matches everything.
    pub async fn search(&self, term: &str) -> Result<Vec<Account>, IdentityError> {
        let needle = term.to_lowercase();
        let found = self
            .accounts
            .find_where(move |account| account_matches(account, &needle))
            .await?;
        Ok(sort_accounts(found))
    }

    /// Like [`search`](Self::search), restricted to accounts without an
    /// employee link. Feeds the "pick an account for this employee" list.
    pub async fn search_unlinked_accounts(
        &self,
        term: &str,
    ) -> Result<Vec<Account>, IdentityError> {
        let needle = term.to_lowercase();
        let found = self
            .accounts
            .find_where(move |account| {
                account.employee_ref().is_none() && account_matches(account, &needle)
            })
            .await?;
        Ok(sort_accounts(found))
    }

    pub async fn save(
        &self,
        account: Account,
        actor: &Principal,
    ) -> Result<Account, IdentityError> {
        Ok(self.accounts.save(account, actor).await?)
    }

    pub async fn delete(&self, account: &Account) -> Result<(), IdentityError> {
        Ok(self.accounts.delete(account.id()).await?)
    }

    // =======================================================================
    // Employees
    // =======================================================================

    pub async fn find_employee(&self, id: EmployeeId) -> Result<Employee, IdentityError> {
        self.employees
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::EmployeeNotFound(id))
    }

    /// Employees whose full name or email contains `term`, ignoring case,
    /// sorted by last then first name.
    pub async fn search_employees(&self, term: &str) -> Result<Vec<Employee>, IdentityError> {
        let needle = term.to_lowercase();
        let found = self
            .employees
            .find_where(move |employee| employee_matches(employee, &needle))
            .await?;
        Ok(sort_employees(found))
    }

    pub async fn search_unlinked_employees(
        &self,
        term: &str,
    ) -> Result<Vec<Employee>, IdentityError> {
        let needle = term.to_lowercase();
        let found = self
            .employees
            .find_where(move |employee| {
                employee.user_ref().is_none() && employee_matches(employee, &needle)
            })
            .await?;
        Ok(sort_employees(found))
    }

    pub async fn save_employee(
        &self,
        employee: Employee,
        actor: &Principal,
    ) -> Result<Employee, IdentityError> {
        Ok(self.employees.save(employee, actor).await?)
    }

    pub async fn delete_employee(&self, employee: &Employee) -> Result<(), IdentityError> {
        Ok(self.employees.delete(employee.id()).await?)
    }
}
