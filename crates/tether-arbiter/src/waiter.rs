//! FallbackWaiter — bounded poll loop awaiting a remote instance.
//!
//! While a feature is remote-scheduled but no instance id is observable
//! yet, `wait` parks here: sleep one interval, re-read the live state
//! fresh, acknowledge scheduler progress, and hand the id off as soon as
//! one appears. Exhausting the pending window is not a failure — the
//! caller yields cleanly so the supervisor's restart policy can re-run
//! `start` down the local-fallback path.

use std::time::Duration;

use tracing::{debug, info};

use tether_state::{FeatureStates, RemoteState};

use crate::arbiter::resolve_instance;
use crate::error::ArbiterResult;
use crate::settings::Settings;

/// Fixed interval between poll iterations.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Bounded poller for the pending window.
#[derive(Debug, Clone)]
pub struct FallbackWaiter {
    pending_window: Duration,
    poll_interval: Duration,
}

impl Default for FallbackWaiter {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl FallbackWaiter {
    /// Build a waiter with explicit window and interval.
    pub fn new(pending_window: Duration, poll_interval: Duration) -> Self {
        Self {
            pending_window,
            poll_interval,
        }
    }

    /// Build a waiter from the settings file, with the fixed poll interval.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            pending_window: Duration::from_secs(settings.fallback.pending_window_secs),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Poll until an instance id becomes observable or the pending window
    /// is exhausted.
    ///
    /// Each iteration sleeps one interval, decrements the remaining
    /// window, and re-reads the live state fresh — the remote scheduler
    /// writes `remote_state` and `instance_id` concurrently, so nothing is
    /// cached across iterations. A `pending` remote state is advanced to
    /// `ready` to acknowledge the scheduler's progress. Returns `None` on
    /// exhaustion.
    pub async fn poll_for_instance(
        &self,
        states: &FeatureStates,
        name: &str,
    ) -> ArbiterResult<Option<String>> {
        let mut remaining = self.pending_window;
        debug!(feature = %name, window = ?remaining, "entering pending poll loop");

        while remaining > Duration::ZERO {
            tokio::time::sleep(self.poll_interval).await;
            remaining = remaining.saturating_sub(self.poll_interval);

            let mut state = states.get_or_quiescent(name)?;
            if state.remote_state == RemoteState::Pending {
                state.remote_state = RemoteState::Ready;
                state.last_update = epoch_secs();
                states.put(&state)?;
                debug!(feature = %name, "acknowledged pending remote schedule");
            }

            if let Some(id) = resolve_instance(&state) {
                info!(feature = %name, instance = %id, "instance appeared during pending window");
                return Ok(Some(id));
            }
            debug!(feature = %name, remaining = ?remaining, "no instance yet");
        }

        Ok(None)
    }
}

fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tether_state::*;

    fn states() -> FeatureStates {
        FeatureStates::new(StateStore::open_in_memory().unwrap())
    }

    fn waiter_ms(window: u64, interval: u64) -> FallbackWaiter {
        FallbackWaiter::new(
            Duration::from_millis(window),
            Duration::from_millis(interval),
        )
    }

    #[tokio::test]
    async fn exhausted_window_returns_none() {
        let states = states();
        let waiter = waiter_ms(40, 20);

        let result = waiter.poll_for_instance(&states, "gps").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn window_of_two_intervals_polls_exactly_twice() {
        let states = states();
        // Window 4, interval 2 — must perform exactly 2 iterations.
        let waiter = waiter_ms(4 * 50, 2 * 50);

        let started = Instant::now();
        let result = waiter.poll_for_instance(&states, "gps").await.unwrap();
        let elapsed = started.elapsed();

        assert!(result.is_none());
        // Two sleeps of one interval each; a third would put us at 300ms+.
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn pending_is_advanced_to_ready() {
        let states = states();
        let mut state = FeatureState::quiescent("gps");
        state.remote_state = RemoteState::Pending;
        states.put(&state).unwrap();

        let waiter = waiter_ms(40, 20);
        let result = waiter.poll_for_instance(&states, "gps").await.unwrap();

        assert!(result.is_none());
        let state = states.get("gps").unwrap().unwrap();
        assert_eq!(state.remote_state, RemoteState::Ready);
    }

    #[tokio::test]
    async fn instance_appearing_mid_poll_is_handed_off() {
        let states = states();
        let waiter = waiter_ms(5_000, 10);

        // Simulate the remote scheduler writing the instance id back while
        // the waiter is polling.
        let writer_states = states.clone();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            let mut state = FeatureState::quiescent("gps");
            state.current_owner = Owner::Remote;
            state.remote_state = RemoteState::Running;
            state.instance_id = "pod-gps-7f2".to_string();
            writer_states.put(&state).unwrap();
        });

        let result = waiter.poll_for_instance(&states, "gps").await.unwrap();
        writer.await.unwrap();

        assert_eq!(result.as_deref(), Some("pod-gps-7f2"));
    }

    #[tokio::test]
    async fn locally_owned_state_resolves_immediately_on_first_poll() {
        let states = states();
        let mut state = FeatureState::quiescent("gps");
        state.current_owner = Owner::Local;
        state.instance_id = "gps".to_string();
        states.put(&state).unwrap();

        let waiter = waiter_ms(1_000, 10);
        let result = waiter.poll_for_instance(&states, "gps").await.unwrap();
        assert_eq!(result.as_deref(), Some("gps"));
    }

    #[test]
    fn from_settings_uses_pending_window() {
        let mut settings = Settings::default();
        settings.fallback.pending_window_secs = 600;

        let waiter = FallbackWaiter::from_settings(&settings);
        assert_eq!(waiter.pending_window, Duration::from_secs(600));
        assert_eq!(waiter.poll_interval, DEFAULT_POLL_INTERVAL);
    }
}
