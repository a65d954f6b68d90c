//! CLI definitions using clap.
//!
//! Every option here overrides the matching config value.

use clap::Parser;
use std::path::PathBuf;

use chloop::storage::Backend;

/// chloop - a single-keystroke command loop
#[derive(Parser, Debug)]
#[command(name = "chloop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Session name partitioning the invocation log
    #[arg(short, long)]
    pub name: Option<String>,

    /// Text shown before each keystroke
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Where invocation records are stored
    #[arg(short, long, value_enum)]
    pub backend: Option<Backend>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}
