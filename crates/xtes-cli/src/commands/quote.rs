// crates/xtes-cli/src/commands/quote.rs
//
// `xtes quote`: fair value and discounted payout of a locked exit, given
// the vault balance and share supply it would be priced against.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use xtes_vault::{payout_fraction, quote, ExchangeRate, VaultLedger, SCALE};

use crate::output::{self, OutputFormat};

/// Arguments for the quote command.
#[derive(Debug, Args)]
pub struct QuoteCmd {
    /// Shares to lock.
    #[arg(long)]
    pub shares: u128,
    /// Lock duration in seconds.
    #[arg(long)]
    pub duration: u64,
    /// Vault balance in base-token units.
    #[arg(long)]
    pub vault: u128,
    /// Total share supply.
    #[arg(long)]
    pub supply: u128,
    /// Minimum lock duration.
    #[arg(long, default_value_t = 14)]
    pub min: u64,
    /// Maximum lock duration.
    #[arg(long, default_value_t = 90)]
    pub max: u64,
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct QuoteRow {
    #[tabled(rename = "Rate")]
    exchange_rate: ExchangeRate,
    #[tabled(rename = "Payout %")]
    payout_percent: String,
    #[tabled(rename = "Fair value")]
    fair_value: u128,
    #[tabled(rename = "Payout")]
    payout: u128,
    #[tabled(rename = "Penalty")]
    penalty: u128,
}

fn build_row(cmd: &QuoteCmd) -> Result<QuoteRow, Box<dyn std::error::Error>> {
    if cmd.min > cmd.max {
        return Err(xtes_core::XtesError::InvalidBounds {
            min: cmd.min,
            max: cmd.max,
        }
        .into());
    }
    let rate = VaultLedger::with_balance(cmd.vault).exchange_rate(cmd.supply)?;
    let q = quote(cmd.shares, cmd.duration, rate, cmd.min, cmd.max)?;
    let fraction = payout_fraction(cmd.duration, cmd.min, cmd.max);

    Ok(QuoteRow {
        exchange_rate: rate,
        payout_percent: format!("{:.2}", fraction as f64 * 100.0 / SCALE as f64),
        fair_value: q.fair_value,
        payout: q.payout,
        penalty: q.penalty(),
    })
}

/// Run the quote command.
pub fn run(cmd: &QuoteCmd) -> Result<(), Box<dyn std::error::Error>> {
    let row = build_row(cmd)?;
    match OutputFormat::from_json_flag(cmd.json) {
        OutputFormat::Json => println!("{}", output::format_json(&row)),
        OutputFormat::Table => println!("{}", output::format_table(&[row])),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(shares: u128, duration: u64, vault: u128, supply: u128) -> QuoteCmd {
        QuoteCmd {
            shares,
            duration,
            vault,
            supply,
            min: 14,
            max: 90,
            json: false,
        }
    }

    #[test]
    fn test_minimum_duration_pays_half() {
        let row = build_row(&cmd(20, 14, 2_700, 189)).unwrap();
        assert_eq!(row.fair_value, 285);
        assert_eq!(row.payout, 142);
        assert_eq!(row.penalty, 143);
        assert_eq!(row.payout_percent, "50.00");
    }

    #[test]
    fn test_maximum_duration_pays_in_full() {
        let row = build_row(&cmd(30, 90, 5_700, 189)).unwrap();
        assert_eq!((row.fair_value, row.payout, row.penalty), (904, 904, 0));
    }

    #[test]
    fn test_empty_pool_quotes_at_par() {
        let row = build_row(&cmd(10, 90, 0, 0)).unwrap();
        assert_eq!(row.exchange_rate, ExchangeRate::PAR);
        assert_eq!(row.fair_value, 10);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut bad = cmd(10, 20, 100, 10);
        bad.min = 50;
        assert!(build_row(&bad).is_err());
    }
}
