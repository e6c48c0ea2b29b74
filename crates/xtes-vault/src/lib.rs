// crates/xtes-vault/src/lib.rs
//
// xtes-vault: share-based staking vault for the xTES protocol.
//
// Depositors exchange a base token for shares in a vault whose balance
// grows as a reward allocation vests linearly over a block window. Shares
// can be locked for a duration to exit at a discount; locked shares keep
// their voting weight until the lock expires.
//
// All amounts are integer base-token or share units; exchange rates are
// scaled by SCALE (10^18).

pub mod admin;
pub mod config;
pub mod discount;
pub mod emission;
pub mod ledger;
pub mod locks;
pub mod pool;
pub mod token;
pub mod vault;
pub mod voting;

// Re-export key types for ergonomic access from downstream crates.
pub use config::PoolConfig;
pub use discount::{payout_fraction, quote, Quote};
pub use emission::EmissionSchedule;
pub use ledger::InMemoryLedger;
pub use locks::{Lock, LockId, LockRegistry};
pub use pool::{PoolSnapshot, Release, StakingPool};
pub use token::{mul_div, ExchangeRate, ShareToken, SCALE};
pub use vault::VaultLedger;
pub use voting::{total_voting_weight, voting_weight};
