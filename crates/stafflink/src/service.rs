//! `IdentityCore` builder and wiring.
//!
//! This is the entry point for embedding Stafflink. It ties together all
//! the layers: stores → repository → session registry → engines.

use std::sync::Arc;

use stafflink_identity::{
    Account, AccountStateEngine, Argon2Hasher, AuthGateway, CredentialHasher, CredentialVerifier,
    Employee, EmploymentLinkManager, LinkedAccount, NewAccount, Repository,
};
use stafflink_session::{SessionInfo, SessionRegistry, SharedSessions, spawn_reaper};
use stafflink_store::{EntityStore, InMemoryStore};
use stafflink_types::{Clock, EmployeeId, Principal, SystemClock};
use tokio::task::JoinHandle;

use crate::{StafflinkConfig, StafflinkError};

/// Builder for configuring and starting an [`IdentityCore`].
///
/// # Example
///
/// ```rust,no_run
/// use stafflink::prelude::*;
///
/// # async fn run() -> Result<(), StafflinkError> {
/// let core = IdentityCore::builder()
///     .config(StafflinkConfig::from_json_str(r#"{ "reaper_interval_secs": 30 }"#)?)
///     .build()
///     .await?;
///
/// let ctx = core.gateway().login("alice", "s3cret-pw").await?;
/// println!("hello {}", ctx.principal());
/// # Ok(())
/// # }
/// ```
pub struct IdentityCoreBuilder {
    config: StafflinkConfig,
    clock: Arc<dyn Clock>,
}

impl IdentityCoreBuilder {
    /// Creates a new builder with default settings and system time.
    pub fn new() -> Self {
        Self {
            config: StafflinkConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: StafflinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the time source for session timestamps and audit stamps.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builds a core over in-memory stores with the Argon2id hasher
    /// configured by [`StafflinkConfig::credential`].
    pub async fn build(self) -> Result<IdentityCore, StafflinkError> {
        let accounts: Arc<InMemoryStore<Account>> =
            Arc::new(InMemoryStore::with_clock(self.clock.clone()));
        let employees: Arc<InMemoryStore<Employee>> =
            Arc::new(InMemoryStore::with_clock(self.clock.clone()));
        let hasher = Argon2Hasher::new(&self.config.credential)?;
        self.build_with(accounts, employees, hasher).await
    }

    /// Builds a core over host-provided stores and hasher.
    ///
    /// Spawns the session reaper on the current tokio runtime unless
    /// `reaper_interval_secs` is 0.
    pub async fn build_with<A, E, H>(
        self,
        accounts: Arc<A>,
        employees: Arc<E>,
        hasher: H,
    ) -> Result<IdentityCore<A, E, H>, StafflinkError>
    where
        A: EntityStore<Account>,
        E: EntityStore<Employee>,
        H: CredentialHasher,
    {
        let repo = Repository::new(accounts, employees);
        let verifier = CredentialVerifier::new(Arc::new(hasher));
        let sessions =
            SessionRegistry::with_clock(self.config.session.clone(), self.clock).into_shared();

        let reaper = self
            .config
            .reaper_interval()
            .map(|period| spawn_reaper(Arc::clone(&sessions), period));

        tracing::info!(
            idle_timeout_secs = self.config.session.idle_timeout_secs,
            reaper_interval_secs = self.config.reaper_interval_secs,
            "identity core ready"
        );

        Ok(IdentityCore {
            state: AccountStateEngine::new(repo.clone(), verifier.clone(), Arc::clone(&sessions)),
            links: EmploymentLinkManager::new(repo.clone(), Arc::clone(&sessions)),
            gateway: AuthGateway::new(repo.clone(), verifier.clone(), Arc::clone(&sessions)),
            repo,
            verifier,
            sessions,
            config: self.config,
            reaper,
        })
    }
}

impl Default for IdentityCoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The assembled identity core.
///
/// Holds one repository and one session registry shared by the three
/// engines. The background reaper, if any, stops when the core is dropped.
pub struct IdentityCore<
    A = InMemoryStore<Account>,
    E = InMemoryStore<Employee>,
    H = Argon2Hasher,
> {
    repo: Repository<A, E>,
    verifier: CredentialVerifier<H>,
    sessions: SharedSessions,
    state: AccountStateEngine<A, E, H>,
    links: EmploymentLinkManager<A, E>,
    gateway: AuthGateway<A, E, H>,
    config: StafflinkConfig,
    reaper: Option<JoinHandle<()>>,
}

impl IdentityCore {
    /// Creates a new builder.
    pub fn builder() -> IdentityCoreBuilder {
        IdentityCoreBuilder::new()
    }
}

impl<A, E, H> IdentityCore<A, E, H>
where
    A: EntityStore<Account>,
    E: EntityStore<Employee>,
    H: CredentialHasher,
{
    pub fn state(&self) -> &AccountStateEngine<A, E, H> {
        &self.state
    }

    pub fn links(&self) -> &EmploymentLinkManager<A, E> {
        &self.links
    }

    pub fn gateway(&self) -> &AuthGateway<A, E, H> {
        &self.gateway
    }

    pub fn repository(&self) -> &Repository<A, E> {
        &self.repo
    }

    pub fn sessions(&self) -> &SharedSessions {
        &self.sessions
    }

    pub fn config(&self) -> &StafflinkConfig {
        &self.config
    }

    /// Hashes `password` and creates the account through the link
    /// manager, optionally linked to `employee`.
    pub async fn create_account(
        &self,
        actor: &Principal,
        draft: NewAccount,
        password: &str,
        employee: Option<EmployeeId>,
    ) -> Result<LinkedAccount, StafflinkError> {
        let digest = self.verifier.rehash_blocking(password).await?;
        Ok(self
            .links
            .create_account(actor, draft, digest, employee)
            .await?)
    }

    /// Number of live sessions for `username`.
    pub async fn count_active(&self, username: &str) -> usize {
        self.sessions.lock().await.count_active(username)
    }

    /// All sessions of `username`, oldest first.
    pub async fn list_sessions(&self, username: &str) -> Vec<SessionInfo> {
        self.sessions.lock().await.list_sessions(username)
    }

    /// Administrative cut-off of every session of `username`.
    pub async fn invalidate_all(&self, username: &str) -> usize {
        self.sessions.lock().await.invalidate_all(username)
    }
}

impl<A, E, H> Drop for IdentityCore<A, E, H> {
    fn drop(&mut self) {
        if let Some(reaper) = self.reaper.take() {
            reaper.abort();
        }
    }
}
