//! Account state transitions and their session side effects.
//!
//! Three independent axes per account: `enabled`, `locked` and the
//! credential digest. Whether a transition cuts off live sessions
//! depends on the axis and the direction:
//!
//! | Transition                        | Sessions                        |
//! |-----------------------------------|---------------------------------|
//! | enabled → disabled, unlocked → locked | invalidated *before* the save |
//! | disabled → enabled, locked → unlocked | untouched                     |
//! | roles replaced                    | untouched (seen on next resume) |
//! | password set, flag on             | invalidated *after* the save    |
//! | password set, flag off            | untouched                       |

use stafflink_session::SharedSessions;
use stafflink_store::EntityStore;
use stafflink_types::{AccountId, Principal, RoleSet};

use crate::{Account, CredentialHasher, CredentialVerifier, Employee, IdentityError, Repository};

/// Applies status, role and password changes to accounts.
pub struct AccountStateEngine<A, E, H> {
    repo: Repository<A, E>,
    verifier: CredentialVerifier<H>,
    sessions: SharedSessions,
}

impl<A, E, H> AccountStateEngine<A, E, H>
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

    /// Sets both status flags and saves.
    ///
    /// If either axis becomes less permissive, every session of the
    /// account is invalidated first. The registry lock is held until the
    /// new state is saved; the gateway re-reads the account under that
    /// same lock before issuing a session, so no login can slip a new
    /// session in between. If the save then fails, the sessions stay gone.
    ///
    /// # Errors
    /// [`IdentityError::AccountNotFound`], or a propagated store failure.
    pub async fn set_status(
        &self,
        actor: &Principal,
        id: AccountId,
        enabled: bool,
        locked: bool,
    ) -> Result<Account, IdentityError> {
        let mut account = self.repo.find_by_id(id).await?;
        let revokes =
            (account.is_enabled() && !enabled) || (!account.is_locked() && locked);
        account.set_status(enabled, locked);

        let saved = if revokes {
            let mut registry = self.sessions.lock().await;
            let removed = registry.invalidate_all(account.username());
            tracing::info!(
                account = %id,
                username = account.username(),
                removed,
                "status tightened, sessions revoked"
            );
            self.repo.save(account, actor).await?
        } else {
            self.repo.save(account, actor).await?
        };

        tracing::info!(
            account = %id,
            actor = %actor,
            enabled,
            locked,
            "account status set"
        );
        Ok(saved)
    }

    /// Replaces the role set. Existing sessions are left alone; the new
    /// roles apply from the next [`AuthGateway::resume`](crate::AuthGateway::resume).
    pub async fn set_roles(
        &self,
        actor: &Principal,
        id: AccountId,
        roles: RoleSet,
    ) -> Result<Account, IdentityError> {
        let mut account = self.repo.find_by_id(id).await?;
        tracing::info!(account = %id, actor = %actor, roles = %roles, "account roles set");
        account.set_roles(roles);
        self.repo.save(account, actor).await
    }

    /// Hashes and stores a new password.
    ///
    /// With `invalidate_all_sessions`, sessions are cut off only once the
    /// new digest is persisted, so a login racing this call with the old
    /// password cannot leave a session behind. With the flag off, existing
    /// sessions (typically the caller's own) stay valid.
    pub async fn set_password(
        &self,
        actor: &Principal,
        id: AccountId,
        plaintext: &str,
        invalidate_all_sessions: bool,
    ) -> Result<Account, IdentityError> {
        let mut account = self.repo.find_by_id(id).await?;
        let digest = self.verifier.rehash_blocking(plaintext).await?;
        account.set_credential(digest);
        let saved = self.repo.save(account, actor).await?;
        tracing::info!(account = %id, actor = %actor, "password changed");

        if invalidate_all_sessions {
            self.sessions.lock().await.invalidate_all(saved.username());
        }
        Ok(saved)
    }
}
