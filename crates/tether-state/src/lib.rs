//! tether-state — embedded state store for Tether.
//!
//! Backed by [redb](https://docs.rs/redb), holds the four shared records
//! the ownership arbiter works against: per-feature static configuration,
//! per-feature live state, the label map consumed by the remote scheduler,
//! and the global cluster-connectivity record.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns,
//! keyed by feature name. The `StateStore` is `Clone` + `Send` + `Sync`
//! (backed by `Arc<Database>`) and can be shared across tasks.
//!
//! The typed accessor views ([`FeatureConfigs`], [`FeatureStates`],
//! [`DeployLabels`], [`ClusterLink`]) are thin role-scoped handles over the
//! same store; they are what gets injected into the arbiter so that config
//! reads, live-state writes, label signaling, and connectivity stay
//! separate concerns at the call site.

pub mod accessors;
pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use accessors::{ClusterLink, DeployLabels, FeatureConfigs, FeatureStates};
pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
