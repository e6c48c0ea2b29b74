// crates/xtes-vault/src/locks.rs
//
// Lock registry: time-locked share collateral created by exit requests.
//
// A lock records shares moved into the escrow account, the chosen duration,
// and the timestamp it unlocks at. Lifecycle:
//   - created by an exit-to-lock request
//   - released (shares burned, payout sent) at or after `unlocks_at`
//   - cancelled (shares returned) strictly before `unlocks_at`
//
// An expired lock that has not been released stays registered and keeps its
// slot in the owner's list; it only stops counting toward voting weight.
// Lock ids come from a counter starting at 1 and are never reused.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use xtes_core::{Account, XtesError};

/// Global lock identifier.
pub type LockId = u64;

/// A single time lock over escrowed shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    /// Global id, assigned at creation.
    pub id: LockId,
    /// Holder the shares (and eventual payout) belong to.
    pub owner: Account,
    /// Shares held in escrow.
    pub share_amount: u128,
    /// Lock duration in seconds. Fixed at creation.
    pub duration: u64,
    /// Timestamp the lock was created at.
    pub created_at: u64,
    /// `created_at + duration`.
    pub unlocks_at: u64,
}

impl Lock {
    /// True once `now` has reached the unlock time.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.unlocks_at
    }
}

/// Timestamp at which a lock created at `now` for `duration` expires.
pub(crate) fn unlock_time(now: u64, duration: u64) -> Result<u64, XtesError> {
    now.checked_add(duration)
        .ok_or(XtesError::ArithmeticOverflow("lock unlock time"))
}

/// All outstanding locks, indexed by id and by owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRegistry {
    next_id: LockId,
    locks: BTreeMap<LockId, Lock>,
    /// Each owner's lock ids in creation order.
    by_owner: HashMap<Account, Vec<LockId>>,
    /// Escrowed shares bucketed by unlock time.
    by_unlock: BTreeMap<u64, u128>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            locks: BTreeMap::new(),
            by_owner: HashMap::new(),
            by_unlock: BTreeMap::new(),
        }
    }

    /// Register a new lock and return its id. `unlocks_at` comes from
    /// `unlock_time`, checked before the caller commits to anything.
    ///
    /// Duration bounds are the caller's concern; the registry only records.
    pub(crate) fn insert(
        &mut self,
        owner: Account,
        share_amount: u128,
        duration: u64,
        now: u64,
        unlocks_at: u64,
    ) -> LockId {
        let id = self.next_id;
        self.next_id += 1;

        self.locks.insert(
            id,
            Lock {
                id,
                owner,
                share_amount,
                duration,
                created_at: now,
                unlocks_at,
            },
        );
        self.by_owner.entry(owner).or_default().push(id);
        *self.by_unlock.entry(unlocks_at).or_insert(0) += share_amount;
        id
    }

    pub fn get(&self, id: LockId) -> Option<&Lock> {
        self.locks.get(&id)
    }

    /// Look up a lock that must belong to `owner`.
    ///
    /// # Errors
    /// Returns `XtesError::NotFound` if the id is unknown or owned by someone
    /// else, so one holder cannot see another's locks.
    pub fn get_owned(&self, id: LockId, owner: &Account) -> Result<&Lock, XtesError> {
        match self.locks.get(&id) {
            Some(lock) if lock.owner == *owner => Ok(lock),
            _ => Err(XtesError::NotFound(id)),
        }
    }

    /// Remove a lock, keeping the owner's remaining locks in order.
    pub fn remove(&mut self, id: LockId) -> Option<Lock> {
        let lock = self.locks.remove(&id)?;
        if let Some(ids) = self.by_owner.get_mut(&lock.owner) {
            ids.retain(|existing| *existing != id);
            if ids.is_empty() {
                self.by_owner.remove(&lock.owner);
            }
        }
        if let Some(bucket) = self.by_unlock.get_mut(&lock.unlocks_at) {
            *bucket -= lock.share_amount;
            if *bucket == 0 {
                self.by_unlock.remove(&lock.unlocks_at);
            }
        }
        Some(lock)
    }

    /// Number of registered locks, expired or not.
    pub fn count(&self) -> usize {
        self.locks.len()
    }

    pub fn count_of(&self, owner: &Account) -> usize {
        self.by_owner.get(owner).map_or(0, Vec::len)
    }

    /// The owner's `index`-th lock in creation order.
    pub fn lock_at(&self, owner: &Account, index: usize) -> Option<&Lock> {
        let id = self.by_owner.get(owner)?.get(index)?;
        self.locks.get(id)
    }

    /// The owner's locks in creation order.
    pub fn locks_of<'a>(&'a self, owner: &Account) -> impl Iterator<Item = &'a Lock> + 'a {
        self.by_owner
            .get(owner)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.locks.get(id))
    }

    /// Shares escrowed by `owner`, expired or not.
    pub fn locked_balance_of(&self, owner: &Account) -> u128 {
        self.locks_of(owner).map(|l| l.share_amount).sum()
    }

    /// Shares escrowed by `owner` in locks still running at `now`.
    pub fn active_balance_of(&self, owner: &Account, now: u64) -> u128 {
        self.locks_of(owner)
            .filter(|l| !l.is_expired(now))
            .map(|l| l.share_amount)
            .sum()
    }

    /// Shares in expired but unreleased locks across all owners.
    ///
    /// Reads only the unlock buckets at or before `now`.
    pub fn expired_total(&self, now: u64) -> u128 {
        self.by_unlock.range(..=now).map(|(_, shares)| *shares).sum()
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
