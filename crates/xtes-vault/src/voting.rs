// crates/xtes-vault/src/voting.rs
//
// Voting weight: liquid shares plus shares in locks that have not expired.
//
// Expiry is evaluated against the timestamp passed in, at read time. Nothing
// sweeps expired locks, so a lock silently stops counting the moment `now`
// reaches `unlocks_at` and no state changes when it does.

use xtes_core::Account;

use crate::locks::LockRegistry;
use crate::token::ShareToken;

/// Voting weight of `holder` at `now`.
///
/// Shares parked in `escrow` vote through their lock owners, so the escrow
/// account itself carries no weight.
pub fn voting_weight(
    shares: &ShareToken,
    locks: &LockRegistry,
    escrow: &Account,
    holder: &Account,
    now: u64,
) -> u128 {
    if holder == escrow {
        return 0;
    }
    shares.balance_of(holder) + locks.active_balance_of(holder, now)
}

/// Sum of every holder's voting weight at `now`.
///
/// Escrowed shares are part of the supply, so subtracting the expired locks
/// leaves liquid shares plus running locks.
pub fn total_voting_weight(shares: &ShareToken, locks: &LockRegistry, now: u64) -> u128 {
    shares.total_supply() - locks.expired_total(now)
}
