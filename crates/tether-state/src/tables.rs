//! redb table definitions for the Tether state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Feature tables are keyed by feature name; the connectivity
//! record is a singleton under a fixed key.

use redb::TableDefinition;

/// Static feature configuration keyed by feature name.
pub const CONFIGS: TableDefinition<&str, &[u8]> = TableDefinition::new("configs");

/// Live feature state keyed by feature name.
pub const STATES: TableDefinition<&str, &[u8]> = TableDefinition::new("states");

/// Remote-deploy trigger flags keyed by feature name.
pub const LABELS: TableDefinition<&str, &[u8]> = TableDefinition::new("labels");

/// Cluster connectivity, single record under [`CLUSTER_KEY`].
pub const CLUSTER: TableDefinition<&str, &[u8]> = TableDefinition::new("cluster");

/// Key of the singleton connectivity record in [`CLUSTER`].
pub const CLUSTER_KEY: &str = "connectivity";
