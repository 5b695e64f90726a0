//! Command line interface definition using clap.
//!
//! The generator takes one positional argument, the build configuration
//! file handed over by the outer build, plus a verbosity switch.

use camino::Utf8PathBuf;
use clap::Parser;

/// Plan the loader test-suite build from annotated test sources.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the `KEY = value...` build configuration file.
    #[arg(value_name = "CONFIG")]
    pub config: Utf8PathBuf,

    /// Enable verbose logging output.
    #[arg(short, long)]
    pub verbose: bool,
}
