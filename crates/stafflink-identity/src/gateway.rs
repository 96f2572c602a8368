//! Login, per-request session resolution and logout.
//!
//! The gateway is the only place plaintext passwords meet stored
//! digests. It produces a [`SecurityContext`] that the caller threads
//! explicitly through its request handling; nothing here keeps ambient
//! "current user" state.

use stafflink_session::{Session, SessionError, SessionId, SharedSessions};
use stafflink_store::EntityStore;
use stafflink_types::Principal;

use crate::{Account, CredentialHasher, CredentialVerifier, Employee, IdentityError, Repository};

/// Who is calling, and through which session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityContext {
    principal: Principal,
    session: Session,
}

impl SecurityContext {
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session.id
    }
}

/// Authenticates credentials and opens, resumes and closes sessions.
pub struct AuthGateway<A, E, H> {
    repo: Repository<A, E>,
    verifier: CredentialVerifier<H>,
    sessions: SharedSessions,
}

fn ensure_usable(account: &Account) -> Result<(), IdentityError> {
    if !account.is_enabled() {
        return Err(IdentityError::AccountDisabled(account.username().to_owned()));
    }
    if account.is_locked() {
        return Err(IdentityError::AccountLocked(account.username().to_owned()));
    }
    Ok(())
}

fn principal_of(account: &Account) -> Principal {
    Principal::new(account.username(), account.roles().clone())
}

impl<A, E, H> AuthGateway<A, E, H>
where
    A: EntityStore<Account>,
    E: EntityStore<Employee>,
    H: CredentialHasher,
{
    pub fn new(
        repo: Repository<A, E>,
        verifier: CredentialVerifier<H>,
        sessions: SharedSessions,
    ) -> Self {
        Self {
            repo,
            verifier,
            sessions,
        }
    }

    /// Authenticates `username`/`password` and opens a new session.
    ///
    /// Credentials are checked before account status, so a disabled or
    /// locked account only reports as such to a caller who knows the
    /// password. Calling `login` again for an already logged-in user
    /// opens an additional session and leaves the existing ones alone.
    ///
    /// # Errors
    /// - [`IdentityError::InvalidCredentials`] for an unknown username or
    ///   a wrong password (indistinguishable on purpose)
    /// - [`IdentityError::AccountDisabled`] / [`IdentityError::AccountLocked`]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SecurityContext, IdentityError> {
        let account = match self.repo.find_by_username(username).await {
            Ok(account) => account,
            Err(IdentityError::UsernameNotFound(_)) => {
                tracing::info!(username, "login rejected: invalid credentials");
                return Err(IdentityError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if !self
            .verifier
            .verify_blocking(password, account.credential())
            .await?
        {
            tracing::info!(username, "login rejected: invalid credentials");
            return Err(IdentityError::InvalidCredentials);
        }
        ensure_usable(&account)?;

        // set_status revokes under this lock before saving, so re-reading
        // here sees either the old state with sessions still revocable, or
        // the new state.
        let mut registry = self.sessions.lock().await;
        let current = match self.repo.find_by_id(account.id()).await {
            Ok(current) => current,
            Err(e) if e.is_not_found() => return Err(IdentityError::InvalidCredentials),
            Err(e) => return Err(e),
        };
        ensure_usable(&current)?;
        if current.credential() != account.credential()
            && !self
                .verifier
                .verify_blocking(password, current.credential())
                .await?
        {
            tracing::info!(username, "login rejected: password changed during login");
            return Err(IdentityError::InvalidCredentials);
        }

        let session = registry.create(current.username());
        drop(registry);

        tracing::info!(username, session = %session.id, "login succeeded");
        Ok(SecurityContext {
            principal: principal_of(&current),
            session,
        })
    }

    /// Resolves the session presented with a new request.
    ///
    /// Refreshes the session's idle timer, then rebuilds the principal
    /// from the *current* account so role changes apply from here on.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] / [`SessionError::Expired`] (wrapped)
    /// - [`IdentityError::AccountDisabled`] / [`IdentityError::AccountLocked`]
    pub async fn resume(&self, session_id: &SessionId) -> Result<SecurityContext, IdentityError> {
        let session = self.sessions.lock().await.touch(session_id)?;

        let account = match self.repo.find_by_username(&session.principal_name).await {
            Ok(account) => account,
            Err(IdentityError::UsernameNotFound(_)) => {
                // The account is gone; the session should have gone with it.
                match self.sessions.lock().await.destroy(session_id) {
                    // a concurrent logout or cut-off got there first
                    Ok(_) | Err(SessionError::NotFound(_)) => {}
                    Err(e) => return Err(e.into()),
                }
                tracing::warn!(
                    principal = %session.principal_name,
                    session = %session_id,
                    "session outlived its account, dropped"
                );
                return Err(SessionError::NotFound(session_id.clone()).into());
            }
            Err(e) => return Err(e),
        };
        ensure_usable(&account)?;

        Ok(SecurityContext {
            principal: principal_of(&account),
            session,
        })
    }

    /// Ends the session behind `context`. The context is consumed, so the
    /// caller cannot keep using it.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] (wrapped) if the session was already
    /// destroyed or invalidated.
    pub async fn logout(&self, context: SecurityContext) -> Result<(), IdentityError> {
        let session = self.sessions.lock().await.destroy(context.session_id())?;
        tracing::info!(principal = %session.principal_name, session = %session.id, "logout");
        Ok(())
    }
}
