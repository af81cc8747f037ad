//! tether — feature ownership supervisor CLI.
//!
//! One short-lived invocation per lifecycle operation, designed to be
//! driven by a process supervisor (one unit per feature):
//!
//! ```text
//! tether start gps
//! tether wait gps          # blocks until the instance terminates
//! tether stop gps --timeout 10
//! ```
//!
//! The process exit code is the operation result; `wait` exits with the
//! runtime instance's own exit status. The supervisor must guarantee at
//! most one in-flight invocation per feature (single-flight).

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use tether_arbiter::{FallbackWaiter, OwnershipArbiter, Settings};
use tether_runtime::ContainerCli;
use tether_state::{
    ClusterLink, DeployLabels, DesiredState, FeatureConfig, FeatureConfigs, FeatureStates,
    OwnerPref, StateStore,
};

mod commands;

#[derive(Parser)]
#[command(name = "tether", about = "Tether — feature ownership supervisor", version)]
struct Cli {
    /// Data directory holding the shared state store.
    #[arg(long, default_value = "/var/lib/tether")]
    data_dir: PathBuf,

    /// Settings file supplying the fallback pending-window override.
    #[arg(long, default_value = "/etc/tether/settings.toml")]
    settings: PathBuf,

    /// Container runtime binary.
    #[arg(long, default_value = "docker")]
    runtime_bin: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a feature with whichever owner(s) the decision engages.
    Start { feature: String },
    /// Stop a feature and write the authoritative down record.
    Stop {
        feature: String,
        /// Grace period handed to the runtime, in seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Kill a feature's instance (hard detach from remote ownership).
    Kill { feature: String },
    /// Wait for a feature's instance to terminate; exits with its status.
    Wait { feature: String },
    /// Print the instance id a feature is currently addressable by.
    Id { feature: String },
    /// Dump a feature's config, live state, label, and connectivity as JSON.
    Status { feature: String },
    /// Write a feature's static configuration into the store.
    Configure {
        feature: String,
        /// Preferred execution owner.
        #[arg(long, value_enum)]
        owner: OwnerArg,
        /// Permit local execution while remote scheduling is pending or
        /// the cluster is unreachable.
        #[arg(long)]
        fallback: bool,
        /// Desired administrative state.
        #[arg(long, value_enum, default_value = "enabled")]
        desired: DesiredArg,
    },
    /// Inspect or override the cluster-connectivity record.
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// Print the current connectivity record.
    Show,
    /// Mark the cluster reachable.
    Up,
    /// Mark the cluster unreachable.
    Down,
}

#[derive(Clone, Copy, ValueEnum)]
enum OwnerArg {
    Local,
    Remote,
}

impl From<OwnerArg> for OwnerPref {
    fn from(arg: OwnerArg) -> Self {
        match arg {
            OwnerArg::Local => OwnerPref::Local,
            OwnerArg::Remote => OwnerPref::Remote,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DesiredArg {
    Disabled,
    Enabled,
    AlwaysEnabled,
}

impl From<DesiredArg> for DesiredState {
    fn from(arg: DesiredArg) -> Self {
        match arg {
            DesiredArg::Disabled => DesiredState::Disabled,
            DesiredArg::Enabled => DesiredState::Enabled,
            DesiredArg::AlwaysEnabled => DesiredState::AlwaysEnabled,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tether=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.data_dir)?;
    let store = StateStore::open(&cli.data_dir.join("tether.redb"))?;

    let configs = FeatureConfigs::new(store.clone());
    let states = FeatureStates::new(store.clone());
    let labels = DeployLabels::new(store.clone());
    let cluster = ClusterLink::new(store);

    let settings = Settings::load(&cli.settings);
    let runtime = ContainerCli::new(cli.runtime_bin);
    let arbiter = OwnershipArbiter::new(
        configs.clone(),
        states.clone(),
        labels.clone(),
        cluster.clone(),
        runtime,
        FallbackWaiter::from_settings(&settings),
    );

    let code = match cli.command {
        Command::Start { feature } => commands::lifecycle::start(&arbiter, &feature).await?,
        Command::Stop { feature, timeout } => {
            commands::lifecycle::stop(&arbiter, &feature, timeout.map(Duration::from_secs)).await?
        }
        Command::Kill { feature } => commands::lifecycle::kill(&arbiter, &feature).await?,
        Command::Wait { feature } => commands::lifecycle::wait(&arbiter, &feature).await?,
        Command::Id { feature } => commands::lifecycle::id(&arbiter, &feature)?,
        Command::Status { feature } => {
            commands::admin::status(&configs, &states, &labels, &cluster, &feature)?
        }
        Command::Configure {
            feature,
            owner,
            fallback,
            desired,
        } => commands::admin::configure(
            &configs,
            &FeatureConfig {
                name: feature,
                owner_pref: owner.into(),
                fallback_allowed: fallback,
                desired_state: desired.into(),
            },
        )?,
        Command::Link { action } => {
            let set_connected = match action {
                LinkAction::Show => None,
                LinkAction::Up => Some(true),
                LinkAction::Down => Some(false),
            };
            commands::admin::link(&cluster, set_connected)?
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
