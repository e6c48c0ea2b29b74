// crates/xtes-core/src/traits.rs

use crate::error::XtesError;
use crate::identity::Account;

/// One base-token movement inside a batch passed to `TokenLedger::execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// `from` sends `amount` to `to` on its own authority.
    Direct {
        from: Account,
        to: Account,
        amount: u128,
    },
    /// `spender` moves `amount` from `from` to `to` against an allowance.
    Delegated {
        spender: Account,
        from: Account,
        to: Account,
        amount: u128,
    },
}

/// Base-token ledger the vault custodies deposits and rewards on.
///
/// Implementations must be atomic per call: a failed transfer or batch
/// leaves every balance and allowance untouched and returns
/// `XtesError::CollaboratorFailure`. The vault never retries.
///
/// Implemented in-memory by `xtes_vault::InMemoryLedger`.
pub trait TokenLedger {
    /// Move `amount` from `from` to `to` on `from`'s own authority.
    fn transfer(&mut self, from: &Account, to: &Account, amount: u128) -> Result<(), XtesError>;

    /// Move `amount` from `from` to `to` using an allowance `from` granted
    /// to `spender`.
    fn transfer_from(
        &mut self,
        spender: &Account,
        from: &Account,
        to: &Account,
        amount: u128,
    ) -> Result<(), XtesError>;

    /// Current balance of `account`.
    fn balance_of(&self, account: &Account) -> u128;

    /// Apply `transfers` in order as one unit: either every transfer lands
    /// or none does. Later transfers see the effect of earlier ones.
    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), XtesError>;
}
