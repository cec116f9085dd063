mod cli;
mod config;
mod format;
mod logging;
mod metrics;
mod model;
mod orchestrator;
mod provider;
mod text_summary;
mod tracker;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = args.json || args.text;

    let res = cli::run(args).await;
    // Exit explicitly in headless modes so the pending Ctrl-C listener does not hold the process.
    if res.is_ok() && is_non_tui {
        std::process::exit(0);
    }
    res
}
