// crates/xtes-vault/src/admin.rs
//
// Privileged pool controls: reward allocation, window extension, lock
// duration bounds, and ownership transfer. Only the pool owner may call
// these. Bounds changes apply to locks created afterwards; existing locks
// keep the duration they were created with.

use tracing::info;
use xtes_core::{Account, BlockContext, TokenLedger, XtesError};

use crate::pool::{logged, StakingPool};

impl<L: TokenLedger> StakingPool<L> {
    fn ensure_owner(&self, caller: &Account) -> Result<(), XtesError> {
        if *caller != self.state.owner {
            return Err(XtesError::Unauthorized(format!(
                "{} is not the pool owner",
                caller
            )));
        }
        Ok(())
    }

    /// Spread `total_allocation` over the rest of the emission window and
    /// make the caller the reward source. Reward vested under the previous
    /// rate is realized first.
    ///
    /// The caller must approve the custody account for the allocation;
    /// tokens are pulled lazily as they vest.
    pub fn set_reward_rate(
        &mut self,
        caller: &Account,
        total_allocation: u128,
        block: BlockContext,
    ) -> Result<u128, XtesError> {
        self.ensure_owner(caller)?;
        let cursor = self.state.emission.last_realized_block().max(block.height);
        if self.state.emission.end() <= cursor {
            return Err(XtesError::InvalidWindow(format!(
                "emission ended at block {}, now {}",
                self.state.emission.end(),
                cursor
            )));
        }

        logged("set_reward_rate", self.allocate(caller, total_allocation, block))
    }

    fn allocate(
        &mut self,
        caller: &Account,
        total_allocation: u128,
        block: BlockContext,
    ) -> Result<u128, XtesError> {
        let mut realization = self.state.plan_realization(block.height)?;
        let rate = realization
            .emission
            .set_rate_for_allocation(total_allocation)?;
        self.ledger.execute(&realization.transfers())?;

        self.state.commit(realization);
        self.state.reward_source = Some(*caller);
        info!(
            total_allocation,
            reward_per_block = rate,
            emission_end = self.state.emission.end(),
            "Reward allocated"
        );
        Ok(rate)
    }

    /// Push the emission end out by `extra_blocks`, re-spreading whatever
    /// has not vested yet.
    pub fn extend_window(
        &mut self,
        caller: &Account,
        extra_blocks: u64,
        block: BlockContext,
    ) -> Result<u128, XtesError> {
        self.ensure_owner(caller)?;

        logged("extend_window", self.prolong(extra_blocks, block))
    }

    fn prolong(&mut self, extra_blocks: u64, block: BlockContext) -> Result<u128, XtesError> {
        let mut realization = self.state.plan_realization(block.height)?;
        let rate = realization.emission.extend(extra_blocks)?;
        self.ledger.execute(&realization.transfers())?;

        self.state.commit(realization);
        info!(
            extra_blocks,
            reward_per_block = rate,
            emission_end = self.state.emission.end(),
            "Emission window extended"
        );
        Ok(rate)
    }

    pub fn set_min_lock_duration(&mut self, caller: &Account, min: u64) -> Result<(), XtesError> {
        self.ensure_owner(caller)?;
        let max = self.state.max_lock_duration;
        if min > max {
            return Err(XtesError::InvalidBounds { min, max });
        }
        self.state.min_lock_duration = min;
        info!(min, max, "Minimum lock duration updated");
        Ok(())
    }

    pub fn set_max_lock_duration(&mut self, caller: &Account, max: u64) -> Result<(), XtesError> {
        self.ensure_owner(caller)?;
        let min = self.state.min_lock_duration;
        if min > max {
            return Err(XtesError::InvalidBounds { min, max });
        }
        self.state.max_lock_duration = max;
        info!(min, max, "Maximum lock duration updated");
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: &Account, new_owner: Account) -> Result<(), XtesError> {
        self.ensure_owner(caller)?;
        info!(from = %self.state.owner, to = %new_owner, "Ownership transferred");
        self.state.owner = new_owner;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::ledger::InMemoryLedger;

    fn owner() -> Account {
        Account::from_label("owner")
    }

    fn alice() -> Account {
        Account::from_label("alice")
    }

    fn pool() -> StakingPool<InMemoryLedger> {
        StakingPool::new(&PoolConfig::default(), owner(), InMemoryLedger::new()).unwrap()
    }

    #[test]
    fn test_only_owner_allocates() {
        let mut pool = pool();
        let err = pool
            .set_reward_rate(&alice(), 10_000, BlockContext::new(1, 1))
            .unwrap_err();
        assert!(matches!(err, XtesError::Unauthorized(_)));
        assert_eq!(pool.reward_per_block(), 0);

        assert_eq!(
            pool.set_reward_rate(&owner(), 10_000, BlockContext::new(1, 1))
                .unwrap(),
            10
        );
        assert_eq!(pool.reward_source(), Some(&owner()));
    }

    #[test]
    fn test_only_owner_extends() {
        let mut pool = pool();
        pool.set_reward_rate(&owner(), 10_000, BlockContext::new(1, 1))
            .unwrap();
        assert!(pool
            .extend_window(&alice(), 1_000, BlockContext::new(2, 2))
            .is_err());
        assert_eq!(pool.reward_per_block(), 10);

        assert_eq!(
            pool.extend_window(&owner(), 1_000, BlockContext::new(2, 2))
                .unwrap(),
            5
        );
        assert_eq!(pool.emission_end(), 2_100);
    }

    #[test]
    fn test_allocation_after_window_rejected() {
        let mut pool = pool();
        let err = pool
            .set_reward_rate(&owner(), 10_000, BlockContext::new(1_100, 0))
            .unwrap_err();
        assert!(matches!(err, XtesError::InvalidWindow(_)));
        assert_eq!(pool.last_realized_block(), 100);
    }

    #[test]
    fn test_lock_bounds() {
        let mut pool = pool();
        assert!(pool.set_min_lock_duration(&alice(), 20).is_err());
        assert_eq!(pool.min_lock_duration(), 14);

        pool.set_min_lock_duration(&owner(), 20).unwrap();
        assert_eq!(pool.min_lock_duration(), 20);

        pool.set_max_lock_duration(&owner(), 100).unwrap();
        assert_eq!(pool.max_lock_duration(), 100);

        assert_eq!(
            pool.set_min_lock_duration(&owner(), 101),
            Err(XtesError::InvalidBounds { min: 101, max: 100 })
        );
        assert_eq!(
            pool.set_max_lock_duration(&owner(), 19),
            Err(XtesError::InvalidBounds { min: 20, max: 19 })
        );
        // Equal bounds are allowed
        pool.set_max_lock_duration(&owner(), 20).unwrap();
        assert_eq!(pool.max_lock_duration(), 20);
    }

    #[test]
    fn test_transfer_ownership() {
        let mut pool = pool();
        assert!(pool.transfer_ownership(&alice(), alice()).is_err());
        pool.transfer_ownership(&owner(), alice()).unwrap();
        assert_eq!(pool.owner(), &alice());
        assert!(pool.set_min_lock_duration(&owner(), 10).is_err());
        pool.set_min_lock_duration(&alice(), 10).unwrap();
    }

    #[test]
    fn test_failed_reallocation_keeps_old_rate() {
        let mut pool = pool();
        let bob = Account::from_label("bob");
        let custody = *pool.custody_account();
        pool.ledger_mut().mint(&owner(), 10_000).unwrap();
        pool.ledger_mut().approve(&owner(), &custody, 10_000);
        pool.ledger_mut().mint(&bob, 100).unwrap();
        pool.ledger_mut().approve(&bob, &custody, 100);
        pool.set_reward_rate(&owner(), 10_000, BlockContext::new(1, 1))
            .unwrap();
        pool.deposit(&bob, 100, BlockContext::new(110, 110)).unwrap();

        // Vested reward for 110..120 can no longer be pulled
        pool.ledger_mut().approve(&owner(), &custody, 0);
        let err = pool
            .set_reward_rate(&owner(), 20_000, BlockContext::new(120, 120))
            .unwrap_err();
        assert!(matches!(err, XtesError::CollaboratorFailure(_)));
        assert_eq!(pool.reward_per_block(), 10);
        assert_eq!(pool.last_realized_block(), 110);
        assert_eq!(pool.vault_balance(), 100);

        assert!(pool
            .extend_window(&owner(), 500, BlockContext::new(120, 120))
            .is_err());
        assert_eq!(pool.emission_end(), 1_100);
    }
}
