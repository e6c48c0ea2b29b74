// crates/xtes-vault/src/emission.rs
//
// Linear reward emission over a fixed block window.
//
// The allocator commits a total reward that vests at `reward_per_block` over
// [emission_start, emission_end). Vested reward is realized lazily: nothing
// moves until a state-changing call pulls everything vested since
// `last_realized_block` into the vault. Window clamping lives only in
// `multiplier`.

use serde::{Deserialize, Serialize};
use xtes_core::XtesError;

/// Emission parameters and realization cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionSchedule {
    /// Reward (base-token units) vesting per block.
    reward_per_block: u128,
    /// First block of the emission window.
    start: u64,
    /// Block at which emission stops (exclusive).
    end: u64,
    /// Last block up to which reward has been realized. Never decreases.
    last_realized_block: u64,
}

impl EmissionSchedule {
    /// Create a schedule with a zero rate. The realization cursor starts at
    /// `start`, so nothing vests before the window opens.
    ///
    /// # Errors
    /// Returns `XtesError::InvalidWindow` unless `end > start`.
    pub fn new(start: u64, end: u64) -> Result<Self, XtesError> {
        if end <= start {
            return Err(XtesError::InvalidWindow(format!(
                "emission end {} must be after start {}",
                end, start
            )));
        }
        Ok(Self {
            reward_per_block: 0,
            start,
            end,
            last_realized_block: start,
        })
    }

    pub fn reward_per_block(&self) -> u128 {
        self.reward_per_block
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn last_realized_block(&self) -> u64 {
        self.last_realized_block
    }

    /// Number of emitting blocks in `[from, to)`, clamped at the window end.
    ///
    /// # Errors
    /// Returns `XtesError::InvalidRange` if `from > to`.
    pub fn multiplier(&self, from: u64, to: u64) -> Result<u64, XtesError> {
        if from > to {
            return Err(XtesError::InvalidRange { from, to });
        }
        if from >= self.end {
            return Ok(0);
        }
        Ok(to.min(self.end) - from)
    }

    /// Reward vested but not yet realized as of `current_block`.
    ///
    /// Zero when `current_block` is at or behind the realization cursor.
    pub fn pending(&self, current_block: u64) -> Result<u128, XtesError> {
        if current_block <= self.last_realized_block {
            return Ok(0);
        }
        let blocks = self.multiplier(self.last_realized_block, current_block)?;
        u128::from(blocks)
            .checked_mul(self.reward_per_block)
            .ok_or(XtesError::ArithmeticOverflow("pending reward"))
    }

    /// Move the realization cursor forward to `current_block`. Calls with an
    /// older block are ignored.
    pub fn advance_to(&mut self, current_block: u64) {
        if current_block > self.last_realized_block {
            self.last_realized_block = current_block;
        }
    }

    /// Blocks left in the window after the cursor; zero once exhausted.
    pub fn remaining_blocks(&self) -> u64 {
        self.end.saturating_sub(self.last_realized_block)
    }

    /// Allocation that has not vested yet at the current rate.
    pub fn unvested(&self) -> Result<u128, XtesError> {
        u128::from(self.remaining_blocks())
            .checked_mul(self.reward_per_block)
            .ok_or(XtesError::ArithmeticOverflow("unvested allocation"))
    }

    /// Spread `total_allocation` evenly over the remaining window.
    ///
    /// The caller realizes first so the cursor reflects the current block.
    /// Truncated remainder per block is never emitted.
    ///
    /// # Errors
    /// Returns `XtesError::InvalidWindow` if no blocks remain.
    pub fn set_rate_for_allocation(&mut self, total_allocation: u128) -> Result<u128, XtesError> {
        let remaining = self.remaining_blocks();
        if remaining == 0 {
            return Err(XtesError::InvalidWindow(format!(
                "emission ended at block {}, cursor at {}",
                self.end, self.last_realized_block
            )));
        }
        self.reward_per_block = total_allocation / u128::from(remaining);
        Ok(self.reward_per_block)
    }

    /// Push the window end out by `extra_blocks`, re-spreading the unvested
    /// allocation over the longer window.
    ///
    /// # Errors
    /// Returns `XtesError::InvalidWindow` if the extended window would still
    /// end at or before the cursor.
    pub fn extend(&mut self, extra_blocks: u64) -> Result<u128, XtesError> {
        let new_end = self
            .end
            .checked_add(extra_blocks)
            .ok_or(XtesError::ArithmeticOverflow("emission end"))?;
        let new_window = new_end.saturating_sub(self.last_realized_block);
        if new_window == 0 {
            return Err(XtesError::InvalidWindow(format!(
                "extended end {} does not pass cursor {}",
                new_end, self.last_realized_block
            )));
        }
        let unvested = self.unvested()?;
        self.reward_per_block = unvested / u128::from(new_window);
        self.end = new_end;
        Ok(self.reward_per_block)
    }
}
