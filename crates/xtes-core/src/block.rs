// crates/xtes-core/src/block.rs
//
// Block context supplied by the caller to every time-dependent operation.
// Reward vesting is measured in block heights; lock expiry in seconds.

use serde::{Deserialize, Serialize};

/// The block at which an operation executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block height, drives reward emission.
    pub height: u64,
    /// Block timestamp in seconds, drives lock expiry.
    pub timestamp: u64,
}

impl BlockContext {
    pub fn new(height: u64, timestamp: u64) -> Self {
        Self { height, timestamp }
    }
}
