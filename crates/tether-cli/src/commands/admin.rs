//! Operator surface — status dump, config provisioning, link override.

use serde_json::json;
use tracing::info;

use tether_state::{
    ClusterConnectivity, ClusterLink, DeployLabels, FeatureConfig, FeatureConfigs, FeatureStates,
};

/// Dump everything known about a feature as pretty JSON.
pub fn status(
    configs: &FeatureConfigs,
    states: &FeatureStates,
    labels: &DeployLabels,
    cluster: &ClusterLink,
    feature: &str,
) -> anyhow::Result<i32> {
    let report = json!({
        "config": configs.get(feature)?,
        "state": states.get(feature)?,
        "label": labels.get(feature)?,
        "cluster": cluster.record()?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}

/// Write a feature's static configuration into the shared store.
pub fn configure(configs: &FeatureConfigs, config: &FeatureConfig) -> anyhow::Result<i32> {
    configs.put(config)?;
    info!(feature = %config.name, owner = ?config.owner_pref, "feature configured");
    Ok(0)
}

/// Show or administratively override the connectivity record.
pub fn link(cluster: &ClusterLink, set_connected: Option<bool>) -> anyhow::Result<i32> {
    match set_connected {
        Some(connected) => {
            cluster.report(&ClusterConnectivity {
                connected,
                last_update: epoch_secs(),
            })?;
            info!(connected, "connectivity record overridden");
        }
        None => match cluster.record()? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("no connectivity report"),
        },
    }
    Ok(0)
}

fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
