//! Role-scoped accessor views over the shared [`StateStore`].
//!
//! The arbiter is constructed from these views rather than the raw store,
//! keeping config reads, live-state writes, label signaling, and
//! connectivity as separate injected collaborators. Each view is a cheap
//! `Clone` over the same underlying database.

use crate::error::StateResult;
use crate::store::StateStore;
use crate::types::*;

/// Read access to per-feature static configuration.
#[derive(Clone)]
pub struct FeatureConfigs {
    store: StateStore,
}

impl FeatureConfigs {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    pub fn get(&self, name: &str) -> StateResult<Option<FeatureConfig>> {
        self.store.get_config(name)
    }

    pub fn put(&self, config: &FeatureConfig) -> StateResult<()> {
        self.store.put_config(config)
    }

    pub fn list(&self) -> StateResult<Vec<FeatureConfig>> {
        self.store.list_configs()
    }
}

/// Read/write access to per-feature live state.
#[derive(Clone)]
pub struct FeatureStates {
    store: StateStore,
}

impl FeatureStates {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    pub fn get(&self, name: &str) -> StateResult<Option<FeatureState>> {
        self.store.get_state(name)
    }

    /// Get a feature's live state, or the quiescent record if none has
    /// been written yet (live state is created implicitly on first start).
    pub fn get_or_quiescent(&self, name: &str) -> StateResult<FeatureState> {
        Ok(self
            .store
            .get_state(name)?
            .unwrap_or_else(|| FeatureState::quiescent(name)))
    }

    pub fn put(&self, state: &FeatureState) -> StateResult<()> {
        self.store.put_state(state)
    }

    pub fn list(&self) -> StateResult<Vec<FeatureState>> {
        self.store.list_states()
    }
}

/// The per-feature remote-deploy trigger consumed by the cluster scheduler.
///
/// Setting the label asks the remote scheduler to provision the feature;
/// clearing it prevents (or stops) remote provisioning. Fire-and-forget:
/// the scheduler reports its progress through the feature's live state.
#[derive(Clone)]
pub struct DeployLabels {
    store: StateStore,
}

impl DeployLabels {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    pub fn set(&self, name: &str) -> StateResult<()> {
        self.store.put_label(name, true)
    }

    pub fn clear(&self, name: &str) -> StateResult<()> {
        self.store.put_label(name, false)
    }

    pub fn get(&self, name: &str) -> StateResult<bool> {
        self.store.get_label(name)
    }
}

/// The global cluster-connectivity record.
///
/// Written by the cluster agent; the arbiter only reads it. A record that
/// was never written reads as disconnected — before the agent has reported,
/// the cluster is not known to be reachable.
#[derive(Clone)]
pub struct ClusterLink {
    store: StateStore,
}

impl ClusterLink {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    pub fn connected(&self) -> StateResult<bool> {
        Ok(self
            .store
            .get_connectivity()?
            .is_some_and(|record| record.connected))
    }

    pub fn record(&self) -> StateResult<Option<ClusterConnectivity>> {
        self.store.get_connectivity()
    }

    /// Administrative override, also used by the cluster agent itself.
    pub fn report(&self, record: &ClusterConnectivity) -> StateResult<()> {
        self.store.put_connectivity(record)
    }
}
