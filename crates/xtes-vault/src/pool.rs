// crates/xtes-vault/src/pool.rs
//
// The staking pool: one explicitly-owned context object tying together the
// emission schedule, vault ledger, share token, and lock registry, plus the
// base-token ledger they custody on.
//
// Every state-changing entry point validates and prices against copies of
// the emission schedule and vault, hands its base-token movements to the
// ledger as one atomic batch, and only then applies the planned state. A
// rejected batch therefore leaves the pool untouched. Deposits, exits,
// releases, and harvests realize vested reward before touching the share
// supply; cancels only move escrowed shares and leave emission alone.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use xtes_core::{Account, BlockContext, TokenLedger, Transfer, XtesError};

use crate::config::PoolConfig;
use crate::discount::{self, Quote};
use crate::emission::EmissionSchedule;
use crate::locks::{self, Lock, LockId, LockRegistry};
use crate::token::{ExchangeRate, ShareToken};
use crate::vault::VaultLedger;
use crate::voting;

/// Result of releasing an expired lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// The lock as it was registered.
    pub lock: Lock,
    /// Fair value and payout at the release-time rate.
    pub quote: Quote,
    /// Discount sent to the penalty recipient; zero when it stays in the vault.
    pub forfeited: u128,
}

/// Aggregate view of the pool for tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub exchange_rate: ExchangeRate,
    pub vault_balance: u128,
    pub total_shares: u128,
    pub escrowed_shares: u128,
    pub reward_per_block: u128,
    pub emission_start: u64,
    pub emission_end: u64,
    pub last_realized_block: u64,
    pub min_lock_duration: u64,
    pub max_lock_duration: u64,
    pub lock_count: usize,
    pub owner: Account,
    pub reward_source: Option<Account>,
}

/// Engine state.
#[derive(Debug, Clone)]
pub(crate) struct PoolState {
    pub(crate) custody: Account,
    pub(crate) escrow: Account,
    pub(crate) owner: Account,
    pub(crate) reward_source: Option<Account>,
    pub(crate) penalty_recipient: Option<Account>,
    pub(crate) min_lock_duration: u64,
    pub(crate) max_lock_duration: u64,
    pub(crate) emission: EmissionSchedule,
    pub(crate) vault: VaultLedger,
    pub(crate) shares: ShareToken,
    pub(crate) locks: LockRegistry,
}

/// Realization computed against copies of the emission schedule and vault,
/// applied only after the ledger accepts `pull`.
#[derive(Debug, Clone)]
pub(crate) struct Realization {
    pub(crate) emission: EmissionSchedule,
    pub(crate) vault: VaultLedger,
    pull: Option<Transfer>,
    amount: u128,
}

impl Realization {
    /// Ledger transfers the realization needs, to be extended by the caller.
    pub(crate) fn transfers(&self) -> Vec<Transfer> {
        self.pull.into_iter().collect()
    }
}

impl PoolState {
    pub(crate) fn exchange_rate(&self) -> Result<ExchangeRate, XtesError> {
        self.vault.exchange_rate(self.shares.total_supply())
    }

    pub(crate) fn quote(&self, share_amount: u128, duration: u64) -> Result<Quote, XtesError> {
        self.quote_against(&self.vault, share_amount, duration)
    }

    fn quote_against(
        &self,
        vault: &VaultLedger,
        share_amount: u128,
        duration: u64,
    ) -> Result<Quote, XtesError> {
        discount::quote(
            share_amount,
            duration,
            vault.exchange_rate(self.shares.total_supply())?,
            self.min_lock_duration,
            self.max_lock_duration,
        )
    }

    /// Plan pulling everything vested since the cursor into the vault.
    ///
    /// With no shares outstanding the cursor advances without pulling, so
    /// reward vesting over an empty pool stays with the allocator.
    pub(crate) fn plan_realization(&self, current_block: u64) -> Result<Realization, XtesError> {
        let mut realization = Realization {
            emission: self.emission.clone(),
            vault: self.vault.clone(),
            pull: None,
            amount: 0,
        };
        if current_block <= self.emission.last_realized_block() {
            return Ok(realization);
        }

        if self.shares.total_supply() > 0 {
            let pending = self.emission.pending(current_block)?;
            if pending > 0 {
                let source = self.reward_source.ok_or_else(|| {
                    XtesError::CollaboratorFailure(
                        "reward vesting without a reward source".to_string(),
                    )
                })?;
                realization.vault.credit(pending)?;
                realization.pull = Some(Transfer::Delegated {
                    spender: self.custody,
                    from: source,
                    to: self.custody,
                    amount: pending,
                });
                realization.amount = pending;
            }
        }
        realization.emission.advance_to(current_block);
        Ok(realization)
    }

    /// Adopt a planned realization once its transfers have been executed.
    pub(crate) fn commit(&mut self, realization: Realization) -> u128 {
        self.emission = realization.emission;
        self.vault = realization.vault;
        if realization.amount > 0 {
            debug!(
                block = self.emission.last_realized_block(),
                realized = realization.amount,
                vault_balance = self.vault.balance(),
                "Realized vested reward"
            );
        }
        realization.amount
    }

    fn harvest<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        block: BlockContext,
    ) -> Result<u128, XtesError> {
        let realization = self.plan_realization(block.height)?;
        ledger.execute(&realization.transfers())?;
        Ok(self.commit(realization))
    }

    fn deposit<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        caller: &Account,
        amount: u128,
        block: BlockContext,
    ) -> Result<u128, XtesError> {
        if amount == 0 {
            return Err(XtesError::ZeroAmount);
        }
        let mut realization = self.plan_realization(block.height)?;

        let minted = realization
            .vault
            .shares_for_deposit(amount, self.shares.total_supply())?;
        if minted == 0 {
            return Err(XtesError::ZeroAmount);
        }
        self.shares.ensure_mintable(minted)?;
        realization.vault.credit(amount)?;

        let mut transfers = realization.transfers();
        transfers.push(Transfer::Delegated {
            spender: self.custody,
            from: *caller,
            to: self.custody,
            amount,
        });
        ledger.execute(&transfers)?;

        self.commit(realization);
        self.shares.issue(caller, minted);

        info!(
            holder = %caller,
            amount,
            minted,
            block = block.height,
            "Deposit accepted"
        );
        Ok(minted)
    }

    fn exit_to_lock<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        caller: &Account,
        share_amount: u128,
        duration: u64,
        block: BlockContext,
    ) -> Result<LockId, XtesError> {
        if share_amount == 0 {
            return Err(XtesError::ZeroAmount);
        }
        if duration < self.min_lock_duration || duration > self.max_lock_duration {
            return Err(XtesError::InvalidDuration {
                duration,
                min: self.min_lock_duration,
                max: self.max_lock_duration,
            });
        }
        self.shares.ensure_balance(caller, share_amount)?;
        let unlocks_at = locks::unlock_time(block.timestamp, duration)?;

        let realization = self.plan_realization(block.height)?;
        ledger.execute(&realization.transfers())?;

        self.commit(realization);
        self.shares.shift(caller, &self.escrow, share_amount);
        let id = self
            .locks
            .insert(*caller, share_amount, duration, block.timestamp, unlocks_at);

        info!(
            holder = %caller,
            lock_id = id,
            shares = share_amount,
            duration,
            unlocks_at,
            "Shares locked"
        );
        Ok(id)
    }

    fn release<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        caller: &Account,
        lock_id: LockId,
        block: BlockContext,
    ) -> Result<Release, XtesError> {
        let lock = self.locks.get_owned(lock_id, caller)?.clone();
        if !lock.is_expired(block.timestamp) {
            return Err(XtesError::Unexpired {
                id: lock_id,
                unlocks_at: lock.unlocks_at,
                now: block.timestamp,
            });
        }
        self.shares.ensure_balance(&self.escrow, lock.share_amount)?;

        let mut realization = self.plan_realization(block.height)?;
        let quote = self.quote_against(&realization.vault, lock.share_amount, lock.duration)?;

        let mut transfers = realization.transfers();
        let forfeited = match self.penalty_recipient {
            Some(recipient) if quote.penalty() > 0 => {
                transfers.push(Transfer::Direct {
                    from: self.custody,
                    to: recipient,
                    amount: quote.penalty(),
                });
                quote.penalty()
            }
            _ => 0,
        };
        if quote.payout > 0 {
            transfers.push(Transfer::Direct {
                from: self.custody,
                to: lock.owner,
                amount: quote.payout,
            });
        }
        realization.vault.debit(quote.payout + forfeited)?;
        ledger.execute(&transfers)?;

        self.commit(realization);
        self.shares.retire(&self.escrow, lock.share_amount);
        self.locks.remove(lock_id);

        info!(
            holder = %caller,
            lock_id,
            shares = lock.share_amount,
            fair_value = quote.fair_value,
            payout = quote.payout,
            forfeited,
            "Lock released"
        );
        Ok(Release {
            lock,
            quote,
            forfeited,
        })
    }

    fn cancel(
        &mut self,
        caller: &Account,
        lock_id: LockId,
        block: BlockContext,
    ) -> Result<Lock, XtesError> {
        let lock = self.locks.get_owned(lock_id, caller)?.clone();
        if lock.is_expired(block.timestamp) {
            return Err(XtesError::Expired {
                id: lock_id,
                unlocks_at: lock.unlocks_at,
                now: block.timestamp,
            });
        }
        self.shares.ensure_balance(&self.escrow, lock.share_amount)?;

        self.shares.shift(&self.escrow, caller, lock.share_amount);
        self.locks.remove(lock_id);

        info!(holder = %caller, lock_id, shares = lock.share_amount, "Lock cancelled");
        Ok(lock)
    }
}

/// Log a rejected operation and pass its result through.
pub(crate) fn logged<T>(op: &'static str, result: Result<T, XtesError>) -> Result<T, XtesError> {
    if let Err(e) = &result {
        warn!(op, error = %e, "Operation rejected");
    }
    result
}

/// A share-based staking vault over a base-token ledger `L`.
///
/// Owns its state and its ledger; independent pools share nothing.
#[derive(Debug, Clone)]
pub struct StakingPool<L> {
    pub(crate) state: PoolState,
    pub(crate) ledger: L,
}

impl<L: TokenLedger> StakingPool<L> {
    /// Create a pool from validated configuration, administered by `owner`.
    ///
    /// The reward rate starts at zero until the owner allocates.
    pub fn new(config: &PoolConfig, owner: Account, ledger: L) -> Result<Self, XtesError> {
        config.validate()?;
        let emission = EmissionSchedule::new(config.emission_start, config.emission_end)?;

        let state = PoolState {
            custody: config.custody_account(),
            escrow: config.escrow_account(),
            owner,
            reward_source: None,
            penalty_recipient: config.penalty_recipient_account(),
            min_lock_duration: config.min_lock_duration,
            max_lock_duration: config.max_lock_duration,
            emission,
            vault: VaultLedger::new(),
            shares: ShareToken::new(
                config.share_name.clone(),
                config.share_symbol.clone(),
                config.share_decimals,
            ),
            locks: LockRegistry::new(),
        };

        info!(
            instance = %config.instance,
            owner = %owner,
            emission_start = config.emission_start,
            emission_end = config.emission_end,
            "Staking pool created"
        );
        Ok(Self { state, ledger })
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct access to the base-token ledger, for funding and approvals.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    // -----------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------

    /// Realize vested reward without any other effect. Returns the amount
    /// pulled into the vault.
    pub fn harvest(&mut self, block: BlockContext) -> Result<u128, XtesError> {
        logged("harvest", self.state.harvest(&mut self.ledger, block))
    }

    /// Deposit `amount` base tokens for shares. Returns the shares minted.
    ///
    /// The caller must have approved the custody account for `amount`.
    pub fn deposit(
        &mut self,
        caller: &Account,
        amount: u128,
        block: BlockContext,
    ) -> Result<u128, XtesError> {
        logged(
            "deposit",
            self.state.deposit(&mut self.ledger, caller, amount, block),
        )
    }

    /// Move `share_amount` liquid shares into a lock of `duration` seconds.
    pub fn exit_to_lock(
        &mut self,
        caller: &Account,
        share_amount: u128,
        duration: u64,
        block: BlockContext,
    ) -> Result<LockId, XtesError> {
        logged(
            "exit_to_lock",
            self.state
                .exit_to_lock(&mut self.ledger, caller, share_amount, duration, block),
        )
    }

    /// Burn an expired lock's shares and pay out its discounted value at
    /// the current rate.
    pub fn release(
        &mut self,
        caller: &Account,
        lock_id: LockId,
        block: BlockContext,
    ) -> Result<Release, XtesError> {
        logged(
            "release",
            self.state.release(&mut self.ledger, caller, lock_id, block),
        )
    }

    /// Return a running lock's shares to the owner unchanged.
    pub fn cancel(
        &mut self,
        caller: &Account,
        lock_id: LockId,
        block: BlockContext,
    ) -> Result<Lock, XtesError> {
        logged("cancel", self.state.cancel(caller, lock_id, block))
    }

    /// Move liquid shares between holders.
    pub fn transfer_shares(
        &mut self,
        caller: &Account,
        to: &Account,
        amount: u128,
    ) -> Result<(), XtesError> {
        if *to == self.state.escrow {
            return Err(XtesError::Unauthorized(
                "escrow account only receives shares through locks".to_string(),
            ));
        }
        logged(
            "transfer_shares",
            self.state.shares.transfer(caller, to, amount),
        )
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Current rate from realized balances. Does not realize.
    pub fn exchange_rate(&self) -> Result<ExchangeRate, XtesError> {
        self.state.exchange_rate()
    }

    /// Fair value and discounted payout of `share_amount` locked for
    /// `duration`, at the current rate.
    pub fn quote(&self, share_amount: u128, duration: u64) -> Result<Quote, XtesError> {
        self.state.quote(share_amount, duration)
    }

    pub fn multiplier(&self, from: u64, to: u64) -> Result<u64, XtesError> {
        self.state.emission.multiplier(from, to)
    }

    /// Reward that a realization at `current_block` would pull.
    pub fn pending_reward(&self, current_block: u64) -> Result<u128, XtesError> {
        if self.state.shares.total_supply() == 0 {
            return Ok(0);
        }
        self.state.emission.pending(current_block)
    }

    pub fn reward_per_block(&self) -> u128 {
        self.state.emission.reward_per_block()
    }

    pub fn emission_start(&self) -> u64 {
        self.state.emission.start()
    }

    pub fn emission_end(&self) -> u64 {
        self.state.emission.end()
    }

    pub fn last_realized_block(&self) -> u64 {
        self.state.emission.last_realized_block()
    }

    pub fn min_lock_duration(&self) -> u64 {
        self.state.min_lock_duration
    }

    pub fn max_lock_duration(&self) -> u64 {
        self.state.max_lock_duration
    }

    pub fn vault_balance(&self) -> u128 {
        self.state.vault.balance()
    }

    pub fn total_shares(&self) -> u128 {
        self.state.shares.total_supply()
    }

    /// Liquid shares of `holder`.
    pub fn balance_of(&self, holder: &Account) -> u128 {
        self.state.shares.balance_of(holder)
    }

    pub fn escrow_balance(&self) -> u128 {
        self.state.shares.balance_of(&self.state.escrow)
    }

    pub fn share_token(&self) -> &ShareToken {
        &self.state.shares
    }

    pub fn owner(&self) -> &Account {
        &self.state.owner
    }

    pub fn reward_source(&self) -> Option<&Account> {
        self.state.reward_source.as_ref()
    }

    pub fn custody_account(&self) -> &Account {
        &self.state.custody
    }

    pub fn escrow_account(&self) -> &Account {
        &self.state.escrow
    }

    pub fn penalty_recipient(&self) -> Option<&Account> {
        self.state.penalty_recipient.as_ref()
    }

    /// Registered locks, expired or not.
    pub fn lock_count(&self) -> usize {
        self.state.locks.count()
    }

    pub fn lock_count_of(&self, holder: &Account) -> usize {
        self.state.locks.count_of(holder)
    }

    /// The holder's `index`-th lock in creation order.
    pub fn lock_at(&self, holder: &Account, index: usize) -> Option<&Lock> {
        self.state.locks.lock_at(holder, index)
    }

    pub fn lock(&self, lock_id: LockId) -> Option<&Lock> {
        self.state.locks.get(lock_id)
    }

    pub fn locks_of<'a>(&'a self, holder: &Account) -> impl Iterator<Item = &'a Lock> + 'a {
        self.state.locks.locks_of(holder)
    }

    /// Shares the holder has locked, expired or not.
    pub fn locked_balance_of(&self, holder: &Account) -> u128 {
        self.state.locks.locked_balance_of(holder)
    }

    pub fn voting_weight(&self, holder: &Account, now: u64) -> u128 {
        voting::voting_weight(
            &self.state.shares,
            &self.state.locks,
            &self.state.escrow,
            holder,
            now,
        )
    }

    pub fn total_voting_weight(&self, now: u64) -> u128 {
        voting::total_voting_weight(&self.state.shares, &self.state.locks, now)
    }

    pub fn snapshot(&self) -> Result<PoolSnapshot, XtesError> {
        Ok(PoolSnapshot {
            exchange_rate: self.exchange_rate()?,
            vault_balance: self.vault_balance(),
            total_shares: self.total_shares(),
            escrowed_shares: self.escrow_balance(),
            reward_per_block: self.reward_per_block(),
            emission_start: self.emission_start(),
            emission_end: self.emission_end(),
            last_realized_block: self.last_realized_block(),
            min_lock_duration: self.min_lock_duration(),
            max_lock_duration: self.max_lock_duration(),
            lock_count: self.lock_count(),
            owner: self.state.owner,
            reward_source: self.state.reward_source,
        })
    }
}
