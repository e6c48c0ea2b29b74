// crates/xtes-vault/tests/reference_scenarios.rs
//
// End-to-end scenarios for the staking pool: deposits across the emission
// window, locked exits, releases, cancellations, and voting weight.
//
// Blocks are one second apart unless a test moves the clock explicitly, so
// `at(h)` executes at height h with timestamp h.

use xtes_core::{Account, BlockContext, TokenLedger, XtesError};
use xtes_vault::{ExchangeRate, InMemoryLedger, PoolConfig, StakingPool, SCALE};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    pool: StakingPool<InMemoryLedger>,
    owner: Account,
    alice: Account,
    bob: Account,
    carol: Account,
}

impl Harness {
    fn custody_balance(&self) -> u128 {
        self.pool.ledger().balance_of(self.pool.custody_account())
    }

    fn base_balance(&self, account: &Account) -> u128 {
        self.pool.ledger().balance_of(account)
    }
}

fn at(height: u64) -> BlockContext {
    BlockContext::new(height, height)
}

/// Pool over [start, start + 1000) with 100 reward per block. The owner
/// funds 100_000; alice, bob, and carol hold 1_000 each, all approved.
fn harness_with(config: PoolConfig) -> Harness {
    let owner = Account::from_label("owner");
    let alice = Account::from_label("alice");
    let bob = Account::from_label("bob");
    let carol = Account::from_label("carol");

    let mut pool = StakingPool::new(&config, owner, InMemoryLedger::new()).unwrap();
    let custody = *pool.custody_account();
    let ledger = pool.ledger_mut();
    ledger.mint(&owner, 100_000).unwrap();
    ledger.approve(&owner, &custody, 100_000);
    for holder in [&alice, &bob, &carol] {
        ledger.mint(holder, 1_000).unwrap();
        ledger.approve(holder, &custody, 1_000);
    }
    pool.set_reward_rate(&owner, 100_000, at(1)).unwrap();
    assert_eq!(pool.reward_per_block(), 100);

    Harness {
        pool,
        owner,
        alice,
        bob,
        carol,
    }
}

fn harness(start: u64) -> Harness {
    harness_with(PoolConfig {
        emission_start: start,
        emission_end: start + 1_000,
        ..PoolConfig::default()
    })
}

// ---------------------------------------------------------------------------
// Emission and deposits
// ---------------------------------------------------------------------------

#[test]
fn test_reward_vests_only_inside_window() {
    let mut h = harness(100);
    let (bob, carol) = (h.bob, h.carol);

    assert_eq!(h.pool.exchange_rate().unwrap(), ExchangeRate::PAR);
    assert_eq!(h.pool.deposit(&bob, 100, at(40)).unwrap(), 100);
    assert_eq!(h.base_balance(&bob), 900);
    assert_eq!(h.custody_balance(), 100);

    assert_eq!(h.pool.exchange_rate().unwrap(), ExchangeRate::PAR);
    assert_eq!(h.pool.deposit(&carol, 100, at(45)).unwrap(), 100);
    assert_eq!(h.custody_balance(), 200);

    assert_eq!(h.pool.exchange_rate().unwrap(), ExchangeRate::PAR);
    h.pool.deposit(&bob, 100, at(100)).unwrap();
    assert_eq!(h.pool.balance_of(&bob), 200);
    assert_eq!(h.custody_balance(), 300);

    // 500 vested by block 105: 300 shares backed by 800
    assert_eq!(h.pool.deposit(&bob, 100, at(105)).unwrap(), 37);
    assert_eq!(h.base_balance(&bob), 700);
    assert_eq!(h.pool.balance_of(&bob), 237);
    assert_eq!(h.custody_balance(), 900);
    assert_eq!(
        h.pool.exchange_rate().unwrap(),
        ExchangeRate(SCALE * 900 / 337)
    );
}

#[test]
fn test_empty_pool_does_not_accrue() {
    let mut h = harness(200);
    let bob = h.bob;

    assert_eq!(h.pool.harvest(at(199)).unwrap(), 0);
    assert_eq!(h.custody_balance(), 0);
    assert_eq!(h.pool.harvest(at(204)).unwrap(), 0);
    assert_eq!(h.custody_balance(), 0);
    assert_eq!(h.pool.last_realized_block(), 204);

    h.pool.deposit(&bob, 100, at(210)).unwrap();
    assert_eq!(h.pool.balance_of(&bob), 100);
    assert_eq!(h.custody_balance(), 100);

    assert_eq!(h.pool.harvest(at(220)).unwrap(), 1_000);
    assert_eq!(h.pool.exchange_rate().unwrap(), ExchangeRate(SCALE * 11));
    assert_eq!(h.custody_balance(), 1_100);

    // Rate 12 at block 221: 100 buys 8 shares
    h.pool.deposit(&bob, 100, at(221)).unwrap();
    assert_eq!(h.custody_balance(), 1_300);
    assert_eq!(h.pool.balance_of(&bob), 108);
}

#[test]
fn test_harvest_is_idempotent_within_a_block() {
    let mut h = harness(100);
    let bob = h.bob;
    h.pool.deposit(&bob, 100, at(110)).unwrap();

    assert_eq!(h.pool.harvest(at(120)).unwrap(), 1_000);
    assert_eq!(h.pool.harvest(at(120)).unwrap(), 0);
    assert_eq!(h.pool.vault_balance(), 1_100);
}

#[test]
fn test_emission_stops_at_window_end() {
    let mut h = harness(100);
    let bob = h.bob;
    h.pool.deposit(&bob, 100, at(1_000)).unwrap();

    assert_eq!(h.pool.pending_reward(5_000).unwrap(), 10_000);
    assert_eq!(h.pool.harvest(at(5_000)).unwrap(), 10_000);
    assert_eq!(h.pool.harvest(at(6_000)).unwrap(), 0);
    assert_eq!(h.pool.last_realized_block(), 6_000);
}

// ---------------------------------------------------------------------------
// Locks and voting
// ---------------------------------------------------------------------------

#[test]
fn test_stakers_share_rewards_and_lock_at_discount() {
    let mut h = harness(300);
    let (alice, bob, carol) = (h.alice, h.bob, h.carol);

    assert_eq!(h.pool.deposit(&alice, 100, at(310)).unwrap(), 100);
    assert_eq!(h.pool.voting_weight(&alice, 310), 100);
    assert_eq!(h.pool.total_voting_weight(310), 100);

    assert_eq!(h.pool.deposit(&bob, 200, at(314)).unwrap(), 40);
    assert_eq!(h.pool.voting_weight(&bob, 314), 40);
    assert_eq!(h.pool.total_voting_weight(314), 140);

    assert_eq!(h.pool.deposit(&carol, 300, at(318)).unwrap(), 38);
    assert_eq!(h.pool.total_voting_weight(318), 178);

    assert_eq!(h.pool.deposit(&alice, 100, at(320)).unwrap(), 11);
    assert_eq!(h.pool.balance_of(&alice), 111);
    assert_eq!(h.pool.total_voting_weight(320), 189);

    // Bob locks 20 for the minimum duration at block 330: rate 2700/189
    let id = h.pool.exit_to_lock(&bob, 20, 14, at(330)).unwrap();
    assert_eq!(id, 1);
    assert_eq!(h.pool.lock_count(), 1);
    let lock = h.pool.lock_at(&bob, 0).unwrap().clone();
    assert_eq!(lock.share_amount, 20);
    assert_eq!(lock.duration, 14);
    assert_eq!(lock.unlocks_at, 344);
    let quote = h.pool.quote(20, 14).unwrap();
    assert_eq!((quote.fair_value, quote.payout), (285, 142));
    assert_eq!(h.pool.lock_count_of(&bob), 1);
    assert_eq!(h.pool.locked_balance_of(&bob), 20);
    assert_eq!(h.pool.balance_of(&bob), 20);
    assert_eq!(h.pool.voting_weight(&bob, 330), 40);
    assert_eq!(h.pool.total_voting_weight(330), 189);
    assert_eq!(h.custody_balance(), 2_700);

    // Alice locks 20 for the maximum duration at block 340
    let id = h.pool.exit_to_lock(&alice, 20, 90, at(340)).unwrap();
    assert_eq!(id, 2);
    let lock = h.pool.lock_at(&alice, 0).unwrap();
    assert_eq!(lock.unlocks_at, 430);
    let quote = h.pool.quote(20, 90).unwrap();
    assert_eq!(quote.fair_value, 391);
    assert_eq!(quote.payout, quote.fair_value);
    assert_eq!(h.pool.balance_of(&alice), 91);
    assert_eq!(h.pool.voting_weight(&alice, 340), 111);
    assert_eq!(h.pool.total_voting_weight(340), 189);
    assert_eq!(h.custody_balance(), 3_700);

    // Bob locks 15 more at block 350; his first lock expired at 344
    let id = h.pool.exit_to_lock(&bob, 15, 90, at(350)).unwrap();
    assert_eq!(id, 3);
    assert_eq!(h.pool.lock_count(), 3);
    assert_eq!(h.pool.lock_count_of(&bob), 2);
    assert_eq!(h.pool.lock_at(&bob, 1).unwrap().id, 3);
    assert_eq!(h.pool.locked_balance_of(&bob), 35);
    let quote = h.pool.quote(15, 90).unwrap();
    assert_eq!((quote.fair_value, quote.payout), (373, 373));
    assert_eq!(h.pool.balance_of(&bob), 5);
    assert!(h.pool.lock_at(&bob, 0).unwrap().unlocks_at < 350);
    assert_eq!(h.pool.voting_weight(&bob, 350), 20);
    assert_eq!(h.pool.total_voting_weight(350), 169);
    assert_eq!(h.custody_balance(), 4_700);

    // Carol locks 30 at block 360: rate 5700/189
    let id = h.pool.exit_to_lock(&carol, 30, 90, at(360)).unwrap();
    assert_eq!(id, 4);
    let quote = h.pool.quote(30, 90).unwrap();
    assert_eq!((quote.fair_value, quote.payout), (904, 904));
    assert_eq!(h.pool.balance_of(&carol), 8);
    assert_eq!(h.pool.voting_weight(&carol, 360), 38);
    assert_eq!(h.pool.voting_weight(&alice, 360), 111);
    assert_eq!(h.pool.total_voting_weight(360), 169);
    assert_eq!(h.custody_balance(), 5_700);
    assert_eq!(h.pool.total_shares(), 189);
}

#[test]
fn test_release_with_penalty_recipient_drains_fair_value() {
    let mut h = harness_with(PoolConfig {
        emission_start: 400,
        emission_end: 1_400,
        penalty_recipient: Some("treasury".to_string()),
        ..PoolConfig::default()
    });
    let bob = h.bob;
    let treasury = Account::from_label("treasury");
    let escrow = *h.pool.escrow_account();

    h.pool.deposit(&bob, 100, at(410)).unwrap();
    assert_eq!(h.pool.total_shares(), 100);

    // Lock half at block 420: vault 1100
    let id = h.pool.exit_to_lock(&bob, 50, 14, at(420)).unwrap();
    assert_eq!(h.pool.lock(id).unwrap().unlocks_at, 434);
    assert_eq!(h.pool.balance_of(&bob), 50);
    assert_eq!(h.pool.share_token().balance_of(&escrow), 50);
    assert_eq!(h.pool.voting_weight(&bob, 420), 100);
    assert_eq!(h.custody_balance(), 1_100);
    assert_eq!(h.pool.total_voting_weight(420), 100);
    assert_eq!(h.base_balance(&bob), 900);

    // Too early: nothing changes, including the reward cursor
    let err = h
        .pool
        .release(&bob, id, BlockContext::new(422, 430))
        .unwrap_err();
    assert_eq!(
        err,
        XtesError::Unexpired {
            id,
            unlocks_at: 434,
            now: 430
        }
    );
    assert_eq!(h.pool.lock_count(), 1);
    assert_eq!(h.custody_balance(), 1_100);
    assert_eq!(h.pool.last_realized_block(), 420);

    // At 434 the lock stops voting, then releases at rate 15
    assert_eq!(h.pool.total_voting_weight(434), 50);
    let released = h
        .pool
        .release(&bob, id, BlockContext::new(424, 434))
        .unwrap();
    assert_eq!(released.quote.fair_value, 750);
    assert_eq!(released.quote.payout, 375);
    assert_eq!(released.forfeited, 375);
    assert_eq!(h.pool.lock_count(), 0);
    assert_eq!(h.pool.lock_count_of(&bob), 0);
    assert_eq!(h.pool.locked_balance_of(&bob), 0);
    assert_eq!(h.pool.balance_of(&bob), 50);
    assert_eq!(h.pool.escrow_balance(), 0);
    assert_eq!(h.pool.voting_weight(&bob, 434), 50);
    assert_eq!(h.custody_balance(), 750);
    assert_eq!(h.pool.vault_balance(), 750);
    assert_eq!(h.pool.total_shares(), 50);
    assert_eq!(h.base_balance(&bob), 1_275);
    assert_eq!(h.base_balance(&treasury), 375);

    // Lock the rest at block 434: rate 35
    let id = h
        .pool
        .exit_to_lock(&bob, 50, 90, BlockContext::new(434, 444))
        .unwrap();
    assert_eq!(id, 2);
    assert_eq!(h.pool.lock(id).unwrap().unlocks_at, 534);
    assert_eq!(h.pool.balance_of(&bob), 0);
    assert_eq!(h.pool.voting_weight(&bob, 444), 50);
    assert_eq!(h.custody_balance(), 1_750);
    assert_eq!(h.pool.total_voting_weight(444), 50);

    assert_eq!(h.pool.total_voting_weight(534), 0);
    let released = h
        .pool
        .release(&bob, id, BlockContext::new(436, 534))
        .unwrap();
    assert_eq!(released.quote.payout, 1_950);
    assert_eq!(released.forfeited, 0);
    assert_eq!(h.pool.lock_count(), 0);
    assert_eq!(h.pool.voting_weight(&bob, 534), 0);
    assert_eq!(h.custody_balance(), 0);
    assert_eq!(h.pool.total_shares(), 0);
    assert_eq!(h.base_balance(&bob), 3_225);
}

#[test]
fn test_cancel_does_not_touch_rewards() {
    let mut h = harness(500);
    let bob = h.bob;

    h.pool.deposit(&bob, 100, at(510)).unwrap();

    let first = h.pool.exit_to_lock(&bob, 25, 14, at(520)).unwrap();
    assert_eq!(h.pool.balance_of(&bob), 75);
    assert_eq!(h.pool.escrow_balance(), 25);
    assert_eq!(h.custody_balance(), 1_100);

    let second = h.pool.exit_to_lock(&bob, 75, 90, at(530)).unwrap();
    assert_eq!(second, 2);
    assert_eq!(h.pool.lock_at(&bob, 1).unwrap().id, second);
    assert_eq!(h.pool.locked_balance_of(&bob), 100);
    assert_eq!(h.pool.balance_of(&bob), 0);
    assert_eq!(h.pool.voting_weight(&bob, 530), 100);
    assert_eq!(h.custody_balance(), 2_100);

    let cancelled = h.pool.cancel(&bob, first, at(531)).unwrap();
    assert_eq!(cancelled.share_amount, 25);
    assert_eq!(h.pool.lock_count(), 1);
    assert_eq!(h.pool.lock_at(&bob, 0).unwrap().id, second);
    assert_eq!(h.pool.lock_count_of(&bob), 1);
    assert_eq!(h.pool.locked_balance_of(&bob), 75);
    assert_eq!(h.pool.balance_of(&bob), 25);
    assert_eq!(h.pool.escrow_balance(), 75);
    assert_eq!(h.pool.voting_weight(&bob, 531), 100);
    assert_eq!(h.custody_balance(), 2_100);
    assert_eq!(h.pool.vault_balance(), 2_100);
    assert_eq!(h.pool.last_realized_block(), 530);
    assert_eq!(h.pool.total_shares(), 100);
    assert_eq!(h.pool.total_voting_weight(531), 100);
    assert_eq!(h.base_balance(&bob), 900);
}

#[test]
fn test_expired_locks_cannot_be_cancelled() {
    let mut h = harness(600);
    let bob = h.bob;

    h.pool.deposit(&bob, 100, at(610)).unwrap();
    let id = h.pool.exit_to_lock(&bob, 25, 14, at(620)).unwrap();
    assert_eq!(h.pool.lock(id).unwrap().unlocks_at, 634);

    let err = h
        .pool
        .cancel(&bob, id, BlockContext::new(621, 720))
        .unwrap_err();
    assert_eq!(
        err,
        XtesError::Expired {
            id,
            unlocks_at: 634,
            now: 720
        }
    );
    // Exactly at the unlock time is already too late
    assert!(h.pool.cancel(&bob, id, BlockContext::new(621, 634)).is_err());
    assert_eq!(h.pool.balance_of(&bob), 75);
    assert_eq!(h.pool.lock_count(), 1);
}

#[test]
fn test_expired_locks_leave_the_vote() {
    let mut h = harness(700);
    let bob = h.bob;
    let escrow = *h.pool.escrow_account();

    h.pool.deposit(&bob, 100, at(710)).unwrap();
    h.pool.exit_to_lock(&bob, 25, 14, at(720)).unwrap();
    assert_eq!(h.pool.voting_weight(&bob, 720), 100);
    assert_eq!(h.pool.total_voting_weight(720), 100);

    let later = 820;
    let lock = h.pool.lock_at(&bob, 0).unwrap();
    assert_eq!((lock.id, lock.share_amount, lock.unlocks_at), (1, 25, 734));
    assert_eq!(h.pool.lock_count_of(&bob), 1);
    assert_eq!(h.pool.locked_balance_of(&bob), 25);
    assert_eq!(h.pool.lock_count(), 1);
    assert_eq!(h.pool.balance_of(&bob), 75);
    assert_eq!(h.pool.share_token().balance_of(&escrow), 25);
    assert_eq!(h.pool.voting_weight(&bob, later), 75);
    assert_eq!(h.pool.total_shares(), 100);
    assert_eq!(h.pool.total_voting_weight(later), 75);
    assert_eq!(h.custody_balance(), 1_100);
    // Escrowed shares belong to the lock owners, not the escrow account
    assert_eq!(h.pool.voting_weight(&escrow, 720), 0);
    assert_eq!(h.pool.voting_weight(&escrow, later), 0);
}

#[test]
fn test_bounds_change_spares_existing_locks() {
    let mut h = harness(100);
    let (owner, bob) = (h.owner, h.bob);

    h.pool.deposit(&bob, 100, at(110)).unwrap();
    let id = h.pool.exit_to_lock(&bob, 50, 14, at(120)).unwrap();

    h.pool.set_min_lock_duration(&owner, 30).unwrap();
    assert!(matches!(
        h.pool.exit_to_lock(&bob, 10, 14, at(121)),
        Err(XtesError::InvalidDuration { .. })
    ));

    // The old 14s lock still releases, paying the minimum fraction
    let released = h.pool.release(&bob, id, at(134)).unwrap();
    assert_eq!(released.lock.duration, 14);
    assert_eq!(released.quote.payout, released.quote.fair_value / 2);
}

#[test]
fn test_reallocation_realizes_under_old_rate_first() {
    let mut h = harness(100);
    let (owner, bob) = (h.owner, h.bob);

    h.pool.deposit(&bob, 100, at(110)).unwrap();
    // 10 blocks at 100, then 50_000 more spread over the remaining 980
    let rate = h.pool.set_reward_rate(&owner, 49_000, at(120)).unwrap();
    assert_eq!(rate, 50);
    assert_eq!(h.pool.vault_balance(), 1_100);
    assert_eq!(h.pool.last_realized_block(), 120);

    h.pool.harvest(at(130)).unwrap();
    assert_eq!(h.pool.vault_balance(), 1_600);
}

// ---------------------------------------------------------------------------
// 18-decimal amounts
// ---------------------------------------------------------------------------

const UNIT: u128 = 1_000_000_000_000_000_000;

#[test]
fn test_full_cycle_with_token_decimals() {
    let owner = Account::from_label("owner");
    let bob = Account::from_label("bob");
    let carol = Account::from_label("carol");

    let mut pool = StakingPool::new(&PoolConfig::default(), owner, InMemoryLedger::new()).unwrap();
    let custody = *pool.custody_account();
    let ledger = pool.ledger_mut();
    ledger.mint(&owner, 100_000 * UNIT).unwrap();
    ledger.approve(&owner, &custody, 100_000 * UNIT);
    for holder in [&bob, &carol] {
        ledger.mint(holder, 1_000 * UNIT).unwrap();
        ledger.approve(holder, &custody, 1_000 * UNIT);
    }
    assert_eq!(
        pool.set_reward_rate(&owner, 100_000 * UNIT, at(1)).unwrap(),
        100 * UNIT
    );

    assert_eq!(pool.deposit(&bob, 1_000 * UNIT, at(110)).unwrap(), 1_000 * UNIT);
    // 1e21 * 1e21 does not fit in u128; the mint still prices exactly
    assert_eq!(pool.deposit(&carol, 1_000 * UNIT, at(120)).unwrap(), 500 * UNIT);
    assert_eq!(pool.vault_balance(), 3_000 * UNIT);
    assert_eq!(pool.exchange_rate().unwrap(), ExchangeRate(2 * SCALE));

    let id = pool.exit_to_lock(&bob, 500 * UNIT, 90, at(130)).unwrap();
    assert_eq!(pool.vault_balance(), 4_000 * UNIT);
    assert_eq!(
        pool.exchange_rate().unwrap(),
        ExchangeRate(2_666_666_666_666_666_666)
    );

    let released = pool.release(&bob, id, at(220)).unwrap();
    assert_eq!(released.quote.fair_value, 4_333_333_333_333_333_333_000);
    assert_eq!(released.quote.payout, released.quote.fair_value);
    assert_eq!(pool.ledger().balance_of(&bob), 4_333_333_333_333_333_333_000);
    assert_eq!(pool.vault_balance(), 8_666_666_666_666_666_667_000);
    assert_eq!(
        pool.ledger().balance_of(&custody),
        pool.vault_balance()
    );
    assert_eq!(pool.ledger().balance_of(&owner), 89_000 * UNIT);
    assert_eq!(pool.total_shares(), 1_000 * UNIT);
    assert_eq!(
        pool.exchange_rate().unwrap(),
        ExchangeRate(8_666_666_666_666_666_667)
    );

    let q = pool.quote(500 * UNIT, 14).unwrap();
    assert_eq!(q.fair_value, 4_333_333_333_333_333_333_500);
    assert_eq!(q.payout, 2_166_666_666_666_666_666_750);
}
