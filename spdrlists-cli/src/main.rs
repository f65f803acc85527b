//! SPDR Watchlists CLI — build TWS watchlists from State Street holdings.
//!
//! With no arguments, runs the standard three batches (Select Sector SPDRs,
//! industry group ETFs, simulated sector lists) into `~/Jts/watchlists`.
//! Flags override individual pieces of the built-in configuration.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use spdrlists_core::{
    pipeline, Environment, RunSummary, SsgaProvider, StdoutProgress, WatchlistConfig,
};

#[derive(Parser)]
#[command(
    name = "spdrlists",
    about = "Build TWS watchlists from SPDR ETF holdings spreadsheets"
)]
struct Cli {
    /// TOML file overriding the built-in configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory containing `Jts`. Defaults to the home directory (drive root on Windows).
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Watchlist subdirectory under `Jts`. Pass an empty string to write into `Jts` itself.
    #[arg(long)]
    watchlists: Option<String>,

    /// Run only the named batch (repeatable): select-sector, industry-group, simulated.
    #[arg(long = "only", value_name = "BATCH")]
    only: Vec<String>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long, default_value_t = false)]
    print_config: bool,
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    for name in &cli.only {
        if !config.batches.iter().any(|b| &b.name == name) {
            anyhow::bail!(
                "unknown batch '{name}'. Valid: {}",
                config
                    .batches
                    .iter()
                    .map(|b| b.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }

    let env = Environment::prepare(&config)?;
    std::env::set_current_dir(env.output_root()).with_context(|| {
        format!("failed to enter {}", env.output_root().display())
    })?;

    let provider = SsgaProvider::new(&config)?;
    let summary = pipeline::run_in(
        &provider,
        &config,
        env.output_root(),
        &cli.only,
        &StdoutProgress,
    )?;

    print_summary(&summary);
    Ok(())
}

fn build_config(cli: &Cli) -> Result<WatchlistConfig> {
    let mut config = match &cli.config {
        Some(path) => WatchlistConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => WatchlistConfig::default(),
    };
    if let Some(dir) = &cli.base_dir {
        config.base_dir = Some(dir.clone());
    }
    if let Some(name) = &cli.watchlists {
        config.watchlists = name.clone();
    }
    config.validate()?;
    Ok(config)
}

fn print_summary(summary: &RunSummary) {
    println!("=== Watchlists ===");
    println!("Output:   {}", summary.output_root.display());
    println!();
    println!("{:<16} {:>6} {:>9} {:>6}", "Batch", "Funds", "Holdings", "Files");
    println!("{}", "-".repeat(40));
    for b in &summary.batches {
        println!(
            "{:<16} {:>6} {:>9} {:>6}",
            b.name,
            b.funds,
            b.holdings,
            b.files.len()
        );
    }
    println!();
    println!("Total files written: {}", summary.files_written());
}
