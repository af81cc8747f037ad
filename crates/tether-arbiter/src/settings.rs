//! Optional settings file supplying the fallback pending-window override.
//!
//! The file is small and entirely optional: a missing or malformed file
//! falls back to the built-in defaults rather than failing the lifecycle
//! operation that tried to read it.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

/// Built-in pending window: how long `wait` allows a remote-scheduled
/// instance to appear before yielding for local fallback, in seconds.
pub const DEFAULT_PENDING_WINDOW_SECS: u64 = 300;

/// Tether settings, normally read from `/etc/tether/settings.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub fallback: FallbackSettings,
}

/// Fallback tuning.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FallbackSettings {
    /// Pending window override, in seconds.
    pub pending_window_secs: u64,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            pending_window_secs: DEFAULT_PENDING_WINDOW_SECS,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults if the file is
    /// absent or malformed.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!(?path, error = %e, "no settings file, using defaults");
                return Settings::default();
            }
        };
        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(?path, error = %e, "malformed settings file, using defaults");
                Settings::default()
            }
        }
    }
}
