//! Background removal of idle-expired sessions.
//!
//! Expiry itself is derived on read (`count_active` and `touch` already
//! ignore idle sessions), so the reaper exists only to free memory. It
//! wakes on a fixed period and calls
//! [`SessionRegistry::cleanup_expired`](crate::SessionRegistry::cleanup_expired).

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::SharedSessions;

/// Spawns a task that sweeps expired sessions every `period`.
///
/// The first sweep happens one full period after spawning. Missed ticks
/// (a long-held registry lock, a paused runtime) are skipped rather than
/// replayed back to back. Abort the returned handle to stop the reaper.
///
/// # Panics
/// Panics if `period` is zero (same contract as [`tokio::time::interval`]).
pub fn spawn_reaper(sessions: SharedSessions, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::debug!(period_ms = period.as_millis() as u64, "session reaper started");

        loop {
            ticker.tick().await;
            let removed = sessions.lock().await.cleanup_expired();
            if !removed.is_empty() {
                tracing::info!(count = removed.len(), "reaped expired sessions");
            }
        }
    })
}
