//! tether-arbiter — ownership arbitration for managed features.
//!
//! Decides, per lifecycle operation, whether the local supervisor or the
//! remote cluster scheduler runs a feature, and drives the collaborators
//! that record and execute that decision:
//!
//! ```text
//! OwnershipArbiter
//!   ├── FeatureConfigs (owner preference, fallback permission, desired state)
//!   ├── FeatureStates  (current owner, remote state, instance id, up/down)
//!   ├── DeployLabels   (remote-deploy trigger consumed by the cluster)
//!   ├── ClusterLink    (connectivity record, read-only here)
//!   ├── RuntimeClient  (start/stop/kill/blocking-wait, image version)
//!   └── FallbackWaiter (bounded poll loop for the pending window)
//! ```
//!
//! Each operation is a short-lived, single-threaded invocation. The
//! invoking supervisor guarantees at most one in-flight operation per
//! feature; concurrent same-feature invocations are undefined behavior
//! (no internal locking is performed, by contract).

pub mod arbiter;
pub mod error;
pub mod settings;
pub mod waiter;

pub use arbiter::{decide_start_mode, resolve_instance, OwnershipArbiter, StartMode};
pub use error::{ArbiterError, ArbiterResult};
pub use settings::Settings;
pub use waiter::FallbackWaiter;
