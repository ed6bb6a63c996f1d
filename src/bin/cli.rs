//! apex-variants CLI - plan per-bundle module variants from a manifest.

use anyhow::{Context, Result};
use apex_variants::cli::{plan, Cli, Commands};
use apex_variants::ApexConfig;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("apex_variants=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            ApexConfig::from_toml_str(&contents)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => ApexConfig::default(),
    };

    match cli.command {
        Commands::Plan { manifest, json } => plan::execute(&manifest, config, json),
        Commands::Stats { manifest } => plan::stats(&manifest, config),
    }
}
