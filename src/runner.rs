//! CLI execution and dispatch logic.
//!
//! This module keeps the binary entry point minimal: it loads the
//! configuration named on the command line, runs the suite orchestrator,
//! and reports the outcome.

use crate::cli::Cli;
use crate::config::Config;
use crate::suite::Suite;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Execute the parsed [`Cli`].
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the
/// generation pass fails.
pub fn run(cli: &Cli) -> Result<()> {
    let config = Config::from_path(&cli.config)
        .with_context(|| format!("loading configuration at {}", cli.config))?;
    debug!(?config, "configuration loaded");
    let summary = Suite::new(config).run()?;
    info!(
        registered = summary.registered,
        excluded = summary.excluded,
        "generation finished"
    );
    Ok(())
}
