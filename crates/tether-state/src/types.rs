//! Domain types for the Tether state store.
//!
//! These types represent the persisted records the ownership arbiter works
//! against: static feature configuration, live feature state, and the
//! global cluster-connectivity record. All types are serializable to/from
//! JSON for storage in redb tables.

use serde::{Deserialize, Serialize};

/// Unique name of a managed feature.
pub type FeatureName = String;

// ── Static configuration ──────────────────────────────────────────

/// Which scheduler is configured to own a feature's instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerPref {
    /// The local process supervisor runs the feature.
    Local,
    /// The remote cluster scheduler runs the feature.
    Remote,
}

/// Administrative desired state of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredState {
    Disabled,
    Enabled,
    AlwaysEnabled,
}

impl DesiredState {
    /// Whether the feature is administratively enabled in any form.
    pub fn is_enabled(self) -> bool {
        matches!(self, DesiredState::Enabled | DesiredState::AlwaysEnabled)
    }
}

/// Static per-feature configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureConfig {
    pub name: FeatureName,
    /// Preferred execution owner.
    pub owner_pref: OwnerPref,
    /// Whether local execution is permitted while remote scheduling is
    /// pending or the cluster is unreachable.
    pub fallback_allowed: bool,
    /// Desired administrative state.
    pub desired_state: DesiredState,
}

// ── Live state ────────────────────────────────────────────────────

/// Which scheduler currently owns a feature's instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    None,
    Local,
    Remote,
}

/// Progress of the remote scheduler for a feature, written back by the
/// scheduler itself once it picks up the label signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteState {
    None,
    Pending,
    Ready,
    Running,
    Stopped,
}

/// Aggregate up/down status of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemState {
    Up,
    Down,
}

/// Live per-feature state.
///
/// Implicitly created on first `start`; driven to the quiescent record by
/// `stop`; never deleted by the arbiter. The remote scheduler writes
/// `remote_state` and `instance_id` concurrently; consumers re-read the
/// record rather than caching it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureState {
    pub name: FeatureName,
    pub current_owner: Owner,
    pub remote_state: RemoteState,
    /// Runtime handle of the active instance. The feature name itself when
    /// locally owned, an externally supplied id when remotely scheduled,
    /// empty when no instance is known.
    pub instance_id: String,
    pub system_state: SystemState,
    /// Unix timestamp (seconds) of the last write to this record.
    pub last_update: u64,
    /// Image version recorded for audit when a local instance is waited on.
    pub stable_version: Option<String>,
}

impl FeatureState {
    /// The quiescent record: no owner, no instance, system down.
    pub fn quiescent(name: &str) -> Self {
        Self {
            name: name.to_string(),
            current_owner: Owner::None,
            remote_state: RemoteState::None,
            instance_id: String::new(),
            system_state: SystemState::Down,
            last_update: 0,
            stable_version: None,
        }
    }
}

// ── Cluster connectivity ──────────────────────────────────────────

/// Global cluster-connectivity record, written by the cluster agent and
/// read-only to the arbiter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterConnectivity {
    pub connected: bool,
    /// Unix timestamp (seconds) of the last connectivity report.
    pub last_update: u64,
}
