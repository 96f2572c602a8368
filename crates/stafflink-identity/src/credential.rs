//! Credential hashing seam and its Argon2id implementation.
//!
//! The identity core never stores or compares plaintext passwords
//! itself. It goes through two layers:
//!
//! - [`CredentialHasher`] — the external one-way primitive. Swappable;
//!   [`Argon2Hasher`] is the shipped implementation.
//! - [`CredentialVerifier`] — a thin, stateless adapter the engines use.
//!   It converts between plaintext and [`CredentialDigest`] and never
//!   logs or retains the plaintext.

use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::CredentialDigest;

/// Random salt bytes per hash.
const SALT_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures of the hashing primitive. A wrong password is *not* an error;
/// `verify` returns `Ok(false)` for it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// The cost parameters were rejected by the algorithm.
    #[error("invalid hasher parameters: {0}")]
    InvalidParams(String),

    /// Hashing failed.
    #[error("credential hashing failed: {0}")]
    Hash(String),

    /// A stored digest could not be parsed.
    #[error("stored credential digest is malformed")]
    MalformedDigest,

    /// Verification failed for a reason other than a mismatch.
    #[error("credential verification failed: {0}")]
    Verify(String),
}

// ---------------------------------------------------------------------------
// CredentialConfig
// ---------------------------------------------------------------------------

/// Argon2id cost parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

// ---------------------------------------------------------------------------
// CredentialHasher
// ---------------------------------------------------------------------------

/// A one-way credential hasher.
///
/// # Example
///
/// ```rust
/// use stafflink_identity::{CredentialError, CredentialHasher};
///
/// /// Reverses the password. Only for demonstrations. Never do this!
/// struct ReverseHasher;
///
/// impl CredentialHasher for ReverseHasher {
///     fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
///         Ok(plaintext.chars().rev().collect())
///     }
///
///     fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, CredentialError> {
///         Ok(self.hash(plaintext)? == digest)
///     }
/// }
/// ```
pub trait CredentialHasher: Send + Sync + 'static {
    /// Hashes `plaintext` with a fresh salt, returning a self-describing
    /// digest string.
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError>;

    /// Checks `plaintext` against a digest produced by [`hash`](Self::hash).
    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, CredentialError>;
}

/// Argon2id hasher producing PHC strings (`$argon2id$v=19$m=...`).
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// # Errors
    /// [`CredentialError::InvalidParams`] if the costs are out of range
    /// (e.g. memory below 8 KiB per lane).
    pub fn new(config: &CredentialConfig) -> Result<Self, CredentialError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| CredentialError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let salt_bytes: [u8; SALT_LEN] = rand::rng().random();
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| CredentialError::Hash(e.to_string()))?;

        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|phc| phc.to_string())
            .map_err(|e| CredentialError::Hash(e.to_string()))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, CredentialError> {
        let parsed =
            PasswordHash::new(digest).map_err(|_| CredentialError::MalformedDigest)?;

        // The digest carries its own cost parameters; a digest created
        // under older settings still verifies.
        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CredentialError::Verify(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// CredentialVerifier
// ---------------------------------------------------------------------------

/// Adapter the engines use to reach the hasher.
pub struct CredentialVerifier<H> {
    hasher: Arc<H>,
}

impl<H> Clone for CredentialVerifier<H> {
    fn clone(&self) -> Self {
        Self {
            hasher: Arc::clone(&self.hasher),
        }
    }
}

impl<H: CredentialHasher> CredentialVerifier<H> {
    pub fn new(hasher: Arc<H>) -> Self {
        Self { hasher }
    }

    /// Checks a plaintext password against a stored digest.
    pub fn verify(
        &self,
        plaintext: &str,
        digest: &CredentialDigest,
    ) -> Result<bool, CredentialError> {
        self.hasher.verify(plaintext, digest.as_str())
    }

    /// Produces a new digest (fresh salt) for a plaintext password.
    pub fn rehash(&self, plaintext: &str) -> Result<CredentialDigest, CredentialError> {
        self.hasher.hash(plaintext).map(CredentialDigest::new)
    }

    /// [`verify`](Self::verify) on tokio's blocking pool. Argon2 is
    /// deliberately slow and must not stall an async worker.
    pub async fn verify_blocking(
        &self,
        plaintext: &str,
        digest: &CredentialDigest,
    ) -> Result<bool, CredentialError> {
        let this = self.clone();
        let plaintext = plaintext.to_owned();
        let digest = digest.clone();
        tokio::task::spawn_blocking(move || this.verify(&plaintext, &digest))
            .await
            .map_err(|e| CredentialError::Verify(e.to_string()))?
    }

    /// [`rehash`](Self::rehash) on tokio's blocking pool.
    pub async fn rehash_blocking(
        &self,
        plaintext: &str,
    ) -> Result<CredentialDigest, CredentialError> {
        let this = self.clone();
        let plaintext = plaintext.to_owned();
        tokio::task::spawn_blocking(move || this.rehash(&plaintext))
            .await
            .map_err(|e| CredentialError::Hash(e.to_string()))?
    }
}
