// crates/xtes-cli/src/main.rs
//
// CLI entrypoint for the xTES staking vault developer tools.
//
// Replays scenario files against an in-memory pool and exposes the
// multiplier and discount math for quick checks.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::multiplier::MultiplierCmd;
use commands::quote::QuoteCmd;
use commands::simulate::SimulateCmd;

/// xTES CLI: developer tools for the share-based staking vault.
#[derive(Parser, Debug)]
#[command(
    name = "xtes",
    version = "0.1.0",
    about = "xTES staking vault CLI: simulate pools, compute multipliers and lock quotes"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "info", "xtes_vault=debug").
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a scenario file against a fresh pool and print the outcome.
    Simulate(SimulateCmd),

    /// Count emitting blocks in a block range.
    Multiplier(MultiplierCmd),

    /// Quote the fair value and payout of a locked exit.
    Quote(QuoteCmd),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Simulate(cmd) => commands::simulate::run(cmd)?,
        Commands::Multiplier(cmd) => commands::multiplier::run(cmd)?,
        Commands::Quote(cmd) => commands::quote::run(cmd)?,
    }

    Ok(())
}
