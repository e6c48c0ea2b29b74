// crates/xtes-vault/src/vault.rs
//
// Vault balance bookkeeping and the share/base exchange rate.
//
// The vault balance is the base-token amount backing outstanding shares:
//   deposits + realized reward - amounts paid out by released locks.
// It is tracked here rather than read from the base-token ledger, so tokens
// sent straight to the custody account never move the exchange rate.

use serde::{Deserialize, Serialize};
use xtes_core::XtesError;

use crate::token::{mul_div, ExchangeRate, SCALE};

/// Realized base-token balance backing the share supply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultLedger {
    balance: u128,
}

impl VaultLedger {
    pub fn new() -> Self {
        Self { balance: 0 }
    }

    pub fn with_balance(balance: u128) -> Self {
        Self { balance }
    }

    pub fn balance(&self) -> u128 {
        self.balance
    }

    /// Credit deposits or realized reward.
    pub fn credit(&mut self, amount: u128) -> Result<(), XtesError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(XtesError::ArithmeticOverflow("vault balance"))?;
        Ok(())
    }

    /// Debit a lock payout.
    ///
    /// # Errors
    /// Returns `XtesError::InsufficientBalance` if the vault holds less than
    /// `amount`; the balance is left unchanged.
    pub fn debit(&mut self, amount: u128) -> Result<(), XtesError> {
        if amount > self.balance {
            return Err(XtesError::InsufficientBalance {
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Base-token per share, scaled by `SCALE`. Par while no shares exist.
    pub fn exchange_rate(&self, total_shares: u128) -> Result<ExchangeRate, XtesError> {
        if total_shares == 0 {
            return Ok(ExchangeRate::PAR);
        }
        mul_div(self.balance, SCALE, total_shares, "exchange rate").map(ExchangeRate)
    }

    /// Shares minted for a deposit of `amount`, priced against the balance
    /// before the deposit lands.
    ///
    /// The first deposit (or any deposit into a vault with nothing backing
    /// it) mints at par.
    pub fn shares_for_deposit(&self, amount: u128, total_shares: u128) -> Result<u128, XtesError> {
        if total_shares == 0 || self.balance == 0 {
            return Ok(amount);
        }
        mul_div(amount, total_shares, self.balance, "share issuance")
    }
}
