// crates/xtes-core/src/error.rs

use thiserror::Error;

/// Protocol-wide error types for the xTES staking vault.
///
/// Every variant terminates the operation that raised it. The pool applies
/// nothing until all checks and its ledger batch have succeeded, so callers
/// never observe a partially applied operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XtesError {
    /// A deposit, lock, or transfer was requested for zero units (or would
    /// mint zero shares).
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// The caller holds fewer liquid shares than the operation needs.
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    /// Requested lock duration lies outside the configured bounds.
    #[error("lock duration {duration}s outside allowed range [{min}, {max}]")]
    InvalidDuration { duration: u64, min: u64, max: u64 },

    /// `multiplier(from, to)` called with `from > to`.
    #[error("invalid block range: from {from} > to {to}")]
    InvalidRange { from: u64, to: u64 },

    /// Emission window is empty or already exhausted.
    #[error("invalid emission window: {0}")]
    InvalidWindow(String),

    /// Lock duration bounds would violate `min <= max`.
    #[error("invalid lock bounds: min {min} > max {max}")]
    InvalidBounds { min: u64, max: u64 },

    /// Lock id unknown, or not owned by the caller.
    #[error("lock {0} not found")]
    NotFound(u64),

    /// Caller is not the privileged principal.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Release attempted before the lock's unlock time.
    #[error("lock {id} unexpired: unlocks at {unlocks_at}, now {now}")]
    Unexpired { id: u64, unlocks_at: u64, now: u64 },

    /// Cancel attempted at or after the lock's unlock time.
    #[error("lock {id} expired at {unlocks_at}, now {now}")]
    Expired { id: u64, unlocks_at: u64, now: u64 },

    /// The base-token collaborator refused a transfer or pull.
    #[error("token collaborator failure: {0}")]
    CollaboratorFailure(String),

    /// Checked u128 arithmetic overflowed.
    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// An encoded value (such as an account id) could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}
