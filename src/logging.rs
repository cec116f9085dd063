//! Diagnostic logging setup.
//!
//! Text and JSON modes log to stderr so stdout stays clean for results. The TUI owns the terminal,
//! so it only logs when a file is given.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Off,
}

/// `RUST_LOG` wins over `level` when set.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,meta_humanos_run={level}")))
}

pub fn init(level: &str, target: LogTarget) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(level));
    match target {
        LogTarget::Off => Ok(()),
        LogTarget::Stderr => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(io::stderr);
            registry
                .with(layer)
                .try_init()
                .context("install log subscriber")
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file {}", path.display()))?;
            let layer = fmt::layer()
                .compact()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            registry
                .with(layer)
                .try_init()
                .context("install log subscriber")
        }
    }
}
