//! Top-level configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use stafflink_identity::CredentialConfig;
use stafflink_session::SessionConfig;

use crate::StafflinkError;

/// Everything [`IdentityCore`](crate::IdentityCore) needs to know.
///
/// All fields have defaults, so `{}` is a valid configuration.
///
/// ```rust
/// use stafflink::StafflinkConfig;
///
/// let config = StafflinkConfig::from_json_str(
///     r#"{ "session": { "idle_timeout_secs": 600 }, "reaper_interval_secs": 0 }"#,
/// )
/// .unwrap();
/// assert_eq!(config.session.idle_timeout_secs, 600);
/// assert!(config.reaper_interval().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StafflinkConfig {
    pub session: SessionConfig,
    pub credential: CredentialConfig,

    /// Seconds between sweeps of idle-expired sessions.
    ///
    /// Default: 60. Set to 0 to run without a background reaper.
    pub reaper_interval_secs: u64,
}

impl StafflinkConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, StafflinkError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The reaper period, or `None` when the reaper is off.
    pub fn reaper_interval(&self) -> Option<Duration> {
        (self.reaper_interval_secs > 0).then(|| Duration::from_secs(self.reaper_interval_secs))
    }
}

impl Default for StafflinkConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            credential: CredentialConfig::default(),
            reaper_interval_secs: 60,
        }
    }
}
