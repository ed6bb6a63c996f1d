//! CLI module for apex-variants.
//!
//! Commands:
//! - plan: run the apex pass over a manifest and print every variant
//! - stats: print graph counts before and after the pass

pub mod plan;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "apex-variants")]
#[command(about = "Plan per-bundle module variants", long_about = None)]
pub struct Cli {
    /// Config file (TOML); defaults apply when missing
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the apex pass and print each module's variants and the registry
    Plan {
        /// Path to the manifest (TOML)
        manifest: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show graph statistics before and after the pass
    Stats {
        /// Path to the manifest (TOML)
        manifest: PathBuf,
    },
}
