// crates/xtes-cli/src/commands/multiplier.rs
//
// `xtes multiplier`: count emitting blocks in [from, to) for a window.

use clap::Args;
use xtes_vault::EmissionSchedule;

/// Arguments for the multiplier command.
#[derive(Debug, Args)]
pub struct MultiplierCmd {
    /// First block of the emission window.
    #[arg(long, default_value_t = 100)]
    pub start: u64,
    /// Block at which emission stops.
    #[arg(long, default_value_t = 1_100)]
    pub end: u64,
    /// Range start (inclusive).
    #[arg(long)]
    pub from: u64,
    /// Range end (exclusive).
    #[arg(long)]
    pub to: u64,
}

/// Run the multiplier command.
pub fn run(cmd: &MultiplierCmd) -> Result<(), Box<dyn std::error::Error>> {
    let schedule = EmissionSchedule::new(cmd.start, cmd.end)?;
    let blocks = schedule.multiplier(cmd.from, cmd.to)?;
    println!("{}", blocks);
    Ok(())
}
