// crates/xtes-vault/src/token.rs
//
// The xTES share token and fixed-point helpers.
//
// Shares are tracked in their smallest unit as u128. Exchange rates are
// fixed-point values scaled by SCALE (10^18), so a rate of SCALE means one
// base-token unit per share. All arithmetic is integer and truncating.

use std::collections::BTreeMap;
use std::fmt;

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use xtes_core::{Account, XtesError};

/// Fixed-point unit for exchange rates and payout fractions: 1.0 = 10^18.
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// Number of decimal digits carried by SCALE.
const SCALE_DIGITS: usize = 18;

/// Default share token metadata.
pub const DEFAULT_SHARE_NAME: &str = "xTES";
pub const DEFAULT_SHARE_SYMBOL: &str = "xTES";
pub const DEFAULT_SHARE_DECIMALS: u8 = 18;

/// Compute `floor(a * b / denominator)`.
///
/// The product is taken in 256 bits, so only a quotient that does not fit in
/// u128 (or a zero denominator) fails. `context` names the calculation in
/// the overflow error.
pub fn mul_div(a: u128, b: u128, denominator: u128, context: &'static str) -> Result<u128, XtesError> {
    if denominator == 0 {
        return Err(XtesError::ArithmeticOverflow(context));
    }
    let quotient = U256::from(a) * U256::from(b) / U256::from(denominator);
    if quotient > U256::from(u128::MAX) {
        return Err(XtesError::ArithmeticOverflow(context));
    }
    Ok(quotient.low_u128())
}

/// A base-token-per-share exchange rate, scaled by `SCALE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExchangeRate(pub u128);

impl ExchangeRate {
    /// The 1:1 rate used while no shares exist.
    pub const PAR: ExchangeRate = ExchangeRate(SCALE);

    pub fn scaled(&self) -> u128 {
        self.0
    }

    /// Base-token value of `shares` at this rate, floored.
    pub fn value_of(&self, shares: u128) -> Result<u128, XtesError> {
        mul_div(shares, self.0, SCALE, "share valuation")
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let frac = self.0 % SCALE;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            // Up to 18 decimal places, trailing zeros trimmed
            let frac_str = format!("{:0width$}", frac, width = SCALE_DIGITS);
            let trimmed = frac_str.trim_end_matches('0');
            write!(f, "{}.{}", whole, trimmed)
        }
    }
}

/// The share token ledger.
///
/// Holds liquid balances for holders plus the escrow account's balance of
/// shares posted as lock collateral. Only the vault mints and burns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareToken {
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: u128,
    balances: BTreeMap<Account, u128>,
}

impl ShareToken {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            total_supply: 0,
            balances: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn balance_of(&self, account: &Account) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Accounts holding a non-zero balance, in key order.
    pub fn holders(&self) -> impl Iterator<Item = (&Account, u128)> + '_ {
        self.balances.iter().map(|(account, balance)| (account, *balance))
    }

    pub fn mint(&mut self, to: &Account, amount: u128) -> Result<(), XtesError> {
        self.ensure_mintable(amount)?;
        self.issue(to, amount);
        Ok(())
    }

    pub fn burn(&mut self, from: &Account, amount: u128) -> Result<(), XtesError> {
        self.ensure_balance(from, amount)?;
        self.retire(from, amount);
        Ok(())
    }

    pub fn transfer(&mut self, from: &Account, to: &Account, amount: u128) -> Result<(), XtesError> {
        self.ensure_balance(from, amount)?;
        self.shift(from, to, amount);
        Ok(())
    }

    pub(crate) fn ensure_mintable(&self, amount: u128) -> Result<(), XtesError> {
        self.total_supply
            .checked_add(amount)
            .map(|_| ())
            .ok_or(XtesError::ArithmeticOverflow("share mint"))
    }

    pub(crate) fn ensure_balance(&self, from: &Account, amount: u128) -> Result<(), XtesError> {
        let available = self.balance_of(from);
        if amount > available {
            return Err(XtesError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    // The three movers below assume the matching `ensure_*` check passed.

    pub(crate) fn issue(&mut self, to: &Account, amount: u128) {
        self.total_supply = self.total_supply.saturating_add(amount);
        // Per-holder balance is bounded by supply.
        *self.balances.entry(*to).or_insert(0) += amount;
    }

    pub(crate) fn retire(&mut self, from: &Account, amount: u128) {
        self.take(from, amount);
        self.total_supply = self.total_supply.saturating_sub(amount);
    }

    pub(crate) fn shift(&mut self, from: &Account, to: &Account, amount: u128) {
        self.take(from, amount);
        *self.balances.entry(*to).or_insert(0) += amount;
    }

    fn take(&mut self, from: &Account, amount: u128) {
        let remaining = self.balance_of(from).saturating_sub(amount);
        if remaining == 0 {
            self.balances.remove(from);
        } else {
            self.balances.insert(*from, remaining);
        }
    }
}

impl Default for ShareToken {
    fn default() -> Self {
        Self::new(DEFAULT_SHARE_NAME, DEFAULT_SHARE_SYMBOL, DEFAULT_SHARE_DECIMALS)
    }
}
