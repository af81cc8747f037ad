//! Lifecycle operations — the per-feature surface the supervisor drives.
//!
//! Each function maps one subcommand onto the arbiter and returns the
//! process exit code. Only `wait` produces a nonzero code on success: it
//! forwards the runtime instance's own exit status.

use std::time::Duration;

use tether_arbiter::OwnershipArbiter;
use tether_runtime::RuntimeClient;

pub async fn start<R: RuntimeClient>(
    arbiter: &OwnershipArbiter<R>,
    feature: &str,
) -> anyhow::Result<i32> {
    arbiter.start(feature).await?;
    Ok(0)
}

pub async fn stop<R: RuntimeClient>(
    arbiter: &OwnershipArbiter<R>,
    feature: &str,
    timeout: Option<Duration>,
) -> anyhow::Result<i32> {
    arbiter.stop(feature, timeout).await?;
    Ok(0)
}

pub async fn kill<R: RuntimeClient>(
    arbiter: &OwnershipArbiter<R>,
    feature: &str,
) -> anyhow::Result<i32> {
    arbiter.kill(feature).await?;
    Ok(0)
}

/// Blocks until the instance terminates; under normal operation this only
/// returns when the runtime reports the instance's exit status.
pub async fn wait<R: RuntimeClient>(
    arbiter: &OwnershipArbiter<R>,
    feature: &str,
) -> anyhow::Result<i32> {
    Ok(arbiter.wait(feature).await?)
}

pub fn id<R: RuntimeClient>(arbiter: &OwnershipArbiter<R>, feature: &str) -> anyhow::Result<i32> {
    if let Some(id) = arbiter.instance_id(feature)? {
        println!("{id}");
    }
    Ok(0)
}
