//! OwnershipArbiter — decides who runs a feature and records the outcome.
//!
//! Every lifecycle operation follows the same shape: read config and live
//! state, compute a decision, update live state and the label signal, then
//! invoke the runtime. Live-state writes happen before runtime calls so
//! the store reflects the decision taken even when the runtime call fails
//! or the invoking process dies.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use tether_runtime::RuntimeClient;
use tether_state::{
    ClusterLink, DeployLabels, FeatureConfig, FeatureConfigs, FeatureState, FeatureStates, Owner,
    OwnerPref, RemoteState, SystemState,
};

use crate::error::{ArbiterError, ArbiterResult};
use crate::waiter::FallbackWaiter;

// ── Start-mode decision ───────────────────────────────────────────

/// Bitmask of execution owners a start operation must engage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartMode(u8);

impl StartMode {
    pub const LOCAL: StartMode = StartMode(0b01);
    pub const REMOTE: StartMode = StartMode(0b10);

    pub fn contains(self, other: StartMode) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for StartMode {
    type Output = StartMode;

    fn bitor(self, rhs: StartMode) -> StartMode {
        StartMode(self.0 | rhs.0)
    }
}

/// Decide which owners a start must engage.
///
/// A local preference always runs locally. A remote preference signals the
/// remote scheduler, additionally engaging the local runtime when fallback
/// is permitted and the remote side has either not scheduled anything yet
/// or the cluster is unreachable.
pub fn decide_start_mode(
    config: &FeatureConfig,
    remote_state: RemoteState,
    connected: bool,
) -> StartMode {
    match config.owner_pref {
        OwnerPref::Local => StartMode::LOCAL,
        OwnerPref::Remote => {
            let mut mode = StartMode::REMOTE;
            if config.fallback_allowed && (remote_state == RemoteState::None || !connected) {
                mode = mode | StartMode::LOCAL;
            }
            mode
        }
    }
}

// ── Instance-id resolution ────────────────────────────────────────

/// Resolve the runtime handle addressing a feature's active instance.
///
/// Local instances are addressed by the feature name by convention; remote
/// instances by the id the remote scheduler wrote back. `None` when no
/// instance is known.
pub fn resolve_instance(state: &FeatureState) -> Option<String> {
    if state.current_owner == Owner::Local {
        Some(state.name.clone())
    } else if state.instance_id.is_empty() {
        None
    } else {
        Some(state.instance_id.clone())
    }
}

// ── Arbiter ───────────────────────────────────────────────────────

/// The ownership arbiter.
///
/// # Single-flight contract
///
/// The invoking supervisor guarantees at most one in-flight operation per
/// feature at a time. No internal locking or compare-and-swap is performed
/// on live state; concurrent same-feature invocations are undefined
/// behavior. Concurrent writes from the remote scheduler (to
/// `remote_state` / `instance_id`) are expected and handled by re-reading
/// the record wherever staleness matters.
pub struct OwnershipArbiter<R: RuntimeClient> {
    configs: FeatureConfigs,
    states: FeatureStates,
    labels: DeployLabels,
    cluster: ClusterLink,
    runtime: R,
    waiter: FallbackWaiter,
}

impl<R: RuntimeClient> OwnershipArbiter<R> {
    pub fn new(
        configs: FeatureConfigs,
        states: FeatureStates,
        labels: DeployLabels,
        cluster: ClusterLink,
        runtime: R,
        waiter: FallbackWaiter,
    ) -> Self {
        Self {
            configs,
            states,
            labels,
            cluster,
            runtime,
            waiter,
        }
    }

    fn config(&self, name: &str) -> ArbiterResult<FeatureConfig> {
        self.configs
            .get(name)?
            .ok_or_else(|| ArbiterError::NotConfigured(name.to_string()))
    }

    /// Start a feature with whichever owner(s) the decision engages.
    pub async fn start(&self, name: &str) -> ArbiterResult<()> {
        let config = self.config(name)?;
        let mut state = self.states.get_or_quiescent(name)?;
        let connected = self.cluster.connected()?;
        let mode = decide_start_mode(&config, state.remote_state, connected);
        debug!(feature = %name, ?mode, connected, "start mode decided");

        if mode == StartMode::LOCAL {
            // Purely local: keep the remote scheduler out.
            self.labels.clear(name)?;
            state.remote_state = RemoteState::None;
        }
        if mode.contains(StartMode::LOCAL) {
            state.current_owner = Owner::Local;
            state.instance_id = name.to_string();
        }
        // Record intent before touching the runtime: the store must
        // reflect the decision even if the runtime call fails below.
        state.system_state = SystemState::Up;
        state.last_update = epoch_secs();
        self.states.put(&state)?;

        let mut outcome = Ok(());
        if mode.contains(StartMode::LOCAL) {
            match self.runtime.start(name).await {
                Ok(()) => info!(feature = %name, "local instance started"),
                Err(e) => {
                    error!(feature = %name, error = %e, "local runtime start failed");
                    outcome = Err(e.into());
                }
            }
        }
        if mode.contains(StartMode::REMOTE) {
            // Fire-and-forget: the scheduler picks the label up and
            // reports progress through the feature's live state.
            self.labels.set(name)?;
            info!(feature = %name, "remote deployment signaled");
        }
        outcome
    }

    /// Stop a feature and write the authoritative down record.
    ///
    /// The terminal record is written regardless of the runtime call's
    /// outcome — the supervisor, not the instance, owns the "down" record,
    /// and the backing instance may already have crashed or been killed
    /// out-of-band.
    pub async fn stop(&self, name: &str, timeout: Option<Duration>) -> ArbiterResult<()> {
        let config = self.config(name)?;
        let mut state = self.states.get_or_quiescent(name)?;
        let instance = resolve_instance(&state);

        // A transient local stop must not detach remote ownership, so the
        // label is cleared only when the feature is configured local.
        if config.owner_pref == OwnerPref::Local {
            self.labels.clear(name)?;
        }

        let mut outcome = Ok(());
        match instance {
            Some(id) => {
                if let Err(e) = self.runtime.stop(&id, timeout).await {
                    error!(feature = %name, instance = %id, error = %e, "runtime stop failed");
                    outcome = Err(e.into());
                }
            }
            None if state.current_owner != Owner::None => {
                error!(feature = %name, owner = ?state.current_owner, "no instance id resolved for owned feature");
            }
            None => {
                info!(feature = %name, "no instance to stop");
            }
        }

        state.current_owner = Owner::None;
        state.instance_id.clear();
        state.system_state = SystemState::Down;
        if state.remote_state == RemoteState::Running {
            state.remote_state = RemoteState::Stopped;
        }
        state.last_update = epoch_secs();
        self.states.put(&state)?;
        info!(feature = %name, "feature stopped");
        outcome
    }

    /// Kill a feature's instance, severing remote ownership unless config
    /// and live state agree the feature is purely local.
    ///
    /// Live state is not rewritten here; the follow-up stop or crash
    /// notification performs the terminal record update.
    pub async fn kill(&self, name: &str) -> ArbiterResult<()> {
        let config = self.config(name)?;
        let state = self.states.get_or_quiescent(name)?;

        if config.owner_pref == OwnerPref::Local && !config.desired_state.is_enabled() {
            // Operator/config error: refused before any side effect.
            return Err(ArbiterError::Disabled(name.to_string()));
        }

        // Broader detach than stop, on purpose: any disagreement between
        // config and live state about local ownership clears the label.
        if config.owner_pref != OwnerPref::Local || state.current_owner != Owner::Local {
            self.labels.clear(name)?;
        }

        match resolve_instance(&state) {
            Some(id) => {
                if let Err(e) = self.runtime.kill(&id).await {
                    error!(feature = %name, instance = %id, error = %e, "runtime kill failed");
                    return Err(e.into());
                }
                info!(feature = %name, instance = %id, "instance killed");
            }
            None if state.current_owner != Owner::None => {
                error!(feature = %name, owner = ?state.current_owner, "no instance id resolved for owned feature");
            }
            None => {
                info!(feature = %name, "no instance to kill");
            }
        }
        Ok(())
    }

    /// Wait for a feature's instance to terminate; returns its exit status.
    ///
    /// With no observable instance and fallback permitted, polls for the
    /// pending window; exhaustion is a clean success (exit 0) so the
    /// supervisor's restart policy re-runs `start` down the local-fallback
    /// path. Otherwise this call does not return under normal operation
    /// until the runtime instance itself terminates.
    pub async fn wait(&self, name: &str) -> ArbiterResult<i32> {
        let config = self.config(name)?;
        let state = self.states.get_or_quiescent(name)?;
        let resolved = resolve_instance(&state);

        if resolved.as_deref() == Some(name) {
            // Local path: record the backing image version for audit.
            match self.runtime.image_version(name).await {
                Ok(version) => {
                    let mut state = self.states.get_or_quiescent(name)?;
                    state.stable_version = Some(version);
                    state.last_update = epoch_secs();
                    self.states.put(&state)?;
                }
                Err(e) => warn!(feature = %name, error = %e, "image version lookup failed"),
            }
        }

        let id = match resolved {
            Some(id) => id,
            None if config.fallback_allowed => {
                match self.waiter.poll_for_instance(&self.states, name).await? {
                    Some(id) => id,
                    None => {
                        // Deliberate non-failure: a clean exit lets the
                        // supervisor restart us into `start`, which then
                        // takes the local-fallback path.
                        let mut state = self.states.get_or_quiescent(name)?;
                        state.remote_state = RemoteState::None;
                        state.last_update = epoch_secs();
                        self.states.put(&state)?;
                        info!(feature = %name, "pending window exhausted, yielding for local fallback");
                        return Ok(0);
                    }
                }
            }
            None => {
                error!(feature = %name, "no instance to wait on and fallback is not permitted");
                return Err(ArbiterError::NoInstance(name.to_string()));
            }
        };

        debug!(feature = %name, instance = %id, "delegating to blocking runtime wait");
        let code = self.runtime.wait(&id).await?;
        info!(feature = %name, instance = %id, code, "instance terminated");
        Ok(code)
    }

    /// Resolve the instance id a feature is currently addressable by.
    pub fn instance_id(&self, name: &str) -> ArbiterResult<Option<String>> {
        let state = self.states.get_or_quiescent(name)?;
        Ok(resolve_instance(&state))
    }
}

fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
