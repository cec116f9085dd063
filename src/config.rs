//! Tracker configuration: an optional JSON file, then command-line overrides.

use crate::model::TrackerConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("meta-humanos").join("tracker.json"))
}

fn read_config(path: &Path) -> Result<TrackerConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
}

/// Load the config file. An explicit path must exist; the default location is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<TrackerConfig> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            debug!(path = %path.display(), "using default config file");
            read_config(&path)
        }
        _ => Ok(TrackerConfig::default()),
    }
}

/// Values given on the command line. `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub tick_interval: Option<Duration>,
    pub max_wait: Option<Duration>,
    pub max_age: Option<Duration>,
    pub high_accuracy: Option<bool>,
}

impl ConfigOverrides {
    pub fn apply(&self, mut cfg: TrackerConfig) -> TrackerConfig {
        if let Some(v) = self.tick_interval {
            cfg.tick_interval = v;
        }
        if let Some(v) = self.max_wait {
            cfg.sampling.max_wait = v;
        }
        if let Some(v) = self.max_age {
            cfg.sampling.max_age = v;
        }
        if let Some(v) = self.high_accuracy {
            cfg.sampling.high_accuracy = v;
        }
        cfg
    }
}
