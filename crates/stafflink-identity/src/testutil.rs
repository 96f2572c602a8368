//! Shared wiring for the in-crate tests.

use std::sync::Arc;

use stafflink_session::{SessionConfig, SessionRegistry, SharedSessions};
use stafflink_store::InMemoryStore;
use stafflink_types::{ManualClock, Principal, Role, RoleSet};

use crate::{
    Account, AccountStateEngine, Argon2Hasher, AuthGateway, CredentialConfig, CredentialVerifier,
    Employee, EmploymentLinkManager, NewAccount, NewEmployee, Repository,
};

pub(crate) type Accounts = InMemoryStore<Account>;
pub(crate) type Employees = InMemoryStore<Employee>;

pub(crate) struct Fixture {
    pub clock: Arc<ManualClock>,
    pub accounts: Arc<Accounts>,
    pub employees: Arc<Employees>,
    pub repo: Repository<Accounts, Employees>,
    pub verifier: CredentialVerifier<Argon2Hasher>,
    pub sessions: SharedSessions,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_session_config(SessionConfig::default())
    }

    pub fn with_session_config(config: SessionConfig) -> Self {
        let clock = Arc::new(ManualClock::default());
        let accounts = Arc::new(Accounts::with_clock(clock.clone()));
        let employees = Arc::new(Employees::with_clock(clock.clone()));
        let hasher = Argon2Hasher::new(&CredentialConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();

        Self {
            repo: Repository::new(accounts.clone(), employees.clone()),
            verifier: CredentialVerifier::new(Arc::new(hasher)),
            sessions: SessionRegistry::with_clock(config, clock.clone()).into_shared(),
            clock,
            accounts,
            employees,
        }
    }

    pub fn admin() -> Principal {
        Principal::new("admin", RoleSet::single(Role::Admin))
    }

    pub fn state(&self) -> AccountStateEngine<Accounts, Employees, Argon2Hasher> {
        AccountStateEngine::new(self.repo.clone(), self.verifier.clone(), self.sessions.clone())
    }

    pub fn links(&self) -> EmploymentLinkManager<Accounts, Employees> {
        EmploymentLinkManager::new(self.repo.clone(), self.sessions.clone())
    }

    pub fn gateway(&self) -> AuthGateway<Accounts, Employees, Argon2Hasher> {
        AuthGateway::new(self.repo.clone(), self.verifier.clone(), self.sessions.clone())
    }

    /// A persisted, enabled USER account with `password`.
    pub async fn account(&self, username: &str, password: &str) -> Account {
        let draft = NewAccount {
            username: username.into(),
            email: format!("{username}@example.com"),
            roles: RoleSet::single(Role::User),
        };
        let digest = self.verifier.rehash(password).unwrap();
        self.links()
            .create_account(&Self::admin(), draft, digest, None)
            .await
            .unwrap()
            .account
    }

    /// A persisted, unlinked employee.
    pub async fn employee(&self, first: &str, last: &str) -> Employee {
        let draft = NewEmployee {
            first_name: first.into(),
            last_name: last.into(),
            email: None,
        };
        self.links()
            .create_employee(&Self::admin(), draft, None)
            .await
            .unwrap()
            .employee
    }

    pub async fn count_active(&self, username: &str) -> usize {
        self.sessions.lock().await.count_active(username)
    }
}
