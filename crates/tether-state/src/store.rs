//! StateStore — redb-backed state persistence for Tether.
//!
//! Provides typed CRUD operations over feature configs, live feature
//! state, deploy labels, and the cluster-connectivity record. All values
//! are JSON-serialized into redb's `&[u8]` value columns. The store
//! supports both on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(CONFIGS).map_err(map_err!(Table))?;
        txn.open_table(STATES).map_err(map_err!(Table))?;
        txn.open_table(LABELS).map_err(map_err!(Table))?;
        txn.open_table(CLUSTER).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Insert a JSON-serialized value under `key`.
    fn put_raw<T: serde::Serialize>(
        &self,
        table: redb::TableDefinition<&str, &[u8]>,
        key: &str,
        value: &T,
    ) -> StateResult<()> {
        let bytes = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            table
                .insert(key, bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Read and deserialize the value under `key`, if present.
    fn get_raw<T: serde::de::DeserializeOwned>(
        &self,
        table: redb::TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let value: T =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    // ── Feature configs ────────────────────────────────────────────

    /// Insert or update a feature's static configuration.
    pub fn put_config(&self, config: &FeatureConfig) -> StateResult<()> {
        self.put_raw(CONFIGS, &config.name, config)?;
        debug!(feature = %config.name, "feature config stored");
        Ok(())
    }

    /// Get a feature's static configuration by name.
    pub fn get_config(&self, name: &str) -> StateResult<Option<FeatureConfig>> {
        self.get_raw(CONFIGS, name)
    }

    /// List all configured features.
    pub fn list_configs(&self) -> StateResult<Vec<FeatureConfig>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CONFIGS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let config: FeatureConfig =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(config);
        }
        Ok(results)
    }

    // ── Live feature state ─────────────────────────────────────────

    /// Insert or update a feature's live state.
    pub fn put_state(&self, state: &FeatureState) -> StateResult<()> {
        self.put_raw(STATES, &state.name, state)
    }

    /// Get a feature's live state by name.
    pub fn get_state(&self, name: &str) -> StateResult<Option<FeatureState>> {
        self.get_raw(STATES, name)
    }

    /// List live state for all features that have any.
    pub fn list_states(&self) -> StateResult<Vec<FeatureState>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(STATES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let state: FeatureState =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(state);
        }
        Ok(results)
    }

    // ── Deploy labels ──────────────────────────────────────────────

    /// Set or clear a feature's remote-deploy trigger flag.
    pub fn put_label(&self, name: &str, value: bool) -> StateResult<()> {
        self.put_raw(LABELS, name, &value)?;
        debug!(feature = %name, value, "deploy label written");
        Ok(())
    }

    /// Read a feature's remote-deploy trigger flag. Absent reads as unset.
    pub fn get_label(&self, name: &str) -> StateResult<bool> {
        Ok(self.get_raw(LABELS, name)?.unwrap_or(false))
    }

    // ── Cluster connectivity ───────────────────────────────────────

    /// Write the global connectivity record.
    pub fn put_connectivity(&self, record: &ClusterConnectivity) -> StateResult<()> {
        self.put_raw(CLUSTER, CLUSTER_KEY, record)?;
        debug!(connected = record.connected, "connectivity record written");
        Ok(())
    }

    /// Read the global connectivity record, if any agent has written one.
    pub fn get_connectivity(&self) -> StateResult<Option<ClusterConnectivity>> {
        self.get_raw(CLUSTER, CLUSTER_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(name: &str) -> FeatureConfig {
        FeatureConfig {
            name: name.to_string(),
            owner_pref: OwnerPref::Remote,
            fallback_allowed: true,
            desired_state: DesiredState::Enabled,
        }
    }

    fn test_state(name: &str) -> FeatureState {
        FeatureState {
            name: name.to_string(),
            current_owner: Owner::Local,
            remote_state: RemoteState::None,
            instance_id: name.to_string(),
            system_state: SystemState::Up,
            last_update: 1000,
            stable_version: None,
        }
    }

    // ── Config CRUD ────────────────────────────────────────────────

    #[test]
    fn config_put_and_get() {
        let store = StateStore::open_in_memory().unwrap();
        let config = test_config("gps");

        store.put_config(&config).unwrap();
        let retrieved = store.get_config("gps").unwrap();

        assert_eq!(retrieved, Some(config));
    }

    #[test]
    fn config_get_nonexistent_returns_none() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.get_config("nope").unwrap().is_none());
    }

    #[test]
    fn config_list_all() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_config(&test_config("gps")).unwrap();
        store.put_config(&test_config("telemetry")).unwrap();
        store.put_config(&test_config("camera")).unwrap();

        let all = store.list_configs().unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn config_update_in_place() {
        let store = StateStore::open_in_memory().unwrap();
        let mut config = test_config("gps");
        store.put_config(&config).unwrap();

        config.owner_pref = OwnerPref::Local;
        config.fallback_allowed = false;
        store.put_config(&config).unwrap();

        let retrieved = store.get_config("gps").unwrap().unwrap();
        assert_eq!(retrieved.owner_pref, OwnerPref::Local);
        assert!(!retrieved.fallback_allowed);
    }

    // ── Live state CRUD ────────────────────────────────────────────

    #[test]
    fn state_put_and_get() {
        let store = StateStore::open_in_memory().unwrap();
        let state = test_state("gps");

        store.put_state(&state).unwrap();
        let retrieved = store.get_state("gps").unwrap();

        assert_eq!(retrieved, Some(state));
    }

    #[test]
    fn state_overwrite_keeps_latest() {
        let store = StateStore::open_in_memory().unwrap();
        let mut state = test_state("gps");
        store.put_state(&state).unwrap();

        state.current_owner = Owner::None;
        state.instance_id.clear();
        state.system_state = SystemState::Down;
        state.last_update = 2000;
        store.put_state(&state).unwrap();

        let retrieved = store.get_state("gps").unwrap().unwrap();
        assert_eq!(retrieved.current_owner, Owner::None);
        assert!(retrieved.instance_id.is_empty());
        assert_eq!(retrieved.last_update, 2000);
    }

    #[test]
    fn state_list_all() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_state(&test_state("gps")).unwrap();
        store.put_state(&test_state("telemetry")).unwrap();

        assert_eq!(store.list_states().unwrap().len(), 2);
    }

    // ── Labels ─────────────────────────────────────────────────────

    #[test]
    fn label_absent_reads_unset() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(!store.get_label("gps").unwrap());
    }

    #[test]
    fn label_set_and_clear() {
        let store = StateStore::open_in_memory().unwrap();

        store.put_label("gps", true).unwrap();
        assert!(store.get_label("gps").unwrap());

        store.put_label("gps", false).unwrap();
        assert!(!store.get_label("gps").unwrap());
    }

    #[test]
    fn labels_are_per_feature() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_label("gps", true).unwrap();

        assert!(store.get_label("gps").unwrap());
        assert!(!store.get_label("telemetry").unwrap());
    }

    // ── Connectivity ───────────────────────────────────────────────

    #[test]
    fn connectivity_absent_until_written() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.get_connectivity().unwrap().is_none());
    }

    #[test]
    fn connectivity_put_and_get() {
        let store = StateStore::open_in_memory().unwrap();
        let record = ClusterConnectivity {
            connected: true,
            last_update: 1000,
        };

        store.put_connectivity(&record).unwrap();
        assert_eq!(store.get_connectivity().unwrap(), Some(record));
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        {
            let store = StateStore::open(&db_path).unwrap();
            store.put_config(&test_config("gps")).unwrap();
            store.put_state(&test_state("gps")).unwrap();
            store.put_label("gps", true).unwrap();
        }

        // Reopen the same database file.
        let store = StateStore::open(&db_path).unwrap();
        assert!(store.get_config("gps").unwrap().is_some());
        assert!(store.get_state("gps").unwrap().is_some());
        assert!(store.get_label("gps").unwrap());
    }

    // ── Edge cases ─────────────────────────────────────────────────

    #[test]
    fn empty_store_operations() {
        let store = StateStore::open_in_memory().unwrap();

        assert!(store.list_configs().unwrap().is_empty());
        assert!(store.list_states().unwrap().is_empty());
        assert!(store.get_state("any").unwrap().is_none());
        assert!(!store.get_label("any").unwrap());
        assert!(store.get_connectivity().unwrap().is_none());
    }
}
