// crates/xtes-cli/src/commands/simulate.rs
//
// `xtes simulate`: replay a scenario against a fresh in-memory pool.
//
// Every step runs even after a failure; a rejected step leaves the pool
// untouched. The command fails at the end if any step's outcome differs
// from its `expect_error` flag.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use tracing::{info, warn};
use xtes_core::{Account, TokenLedger, XtesError};
use xtes_vault::{InMemoryLedger, PoolConfig, PoolSnapshot, StakingPool};

use super::scenario::{resolve_account, Action, Scenario, ScenarioError, Step};
use crate::output::{self, OutputFormat};

/// Arguments for the simulate command.
#[derive(Debug, Args)]
pub struct SimulateCmd {
    /// Pool configuration (TOML). Defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Scenario file (TOML).
    #[arg(long)]
    pub scenario: PathBuf,
    /// Print JSON instead of tables.
    #[arg(long)]
    pub json: bool,
}

/// Outcome of one scenario step.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct StepRecord {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Block")]
    pub block: u64,
    #[tabled(rename = "Time")]
    pub timestamp: u64,
    #[tabled(rename = "Action")]
    pub action: &'static str,
    #[tabled(rename = "Caller")]
    pub caller: String,
    #[tabled(rename = "Ok")]
    pub ok: bool,
    #[tabled(rename = "Outcome")]
    pub outcome: String,
    #[tabled(skip)]
    pub as_expected: bool,
}

/// Per-account balances at the end of the run.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct HolderRow {
    #[tabled(rename = "Account")]
    pub name: String,
    #[tabled(rename = "Base")]
    pub base_balance: u128,
    #[tabled(rename = "Shares")]
    pub shares: u128,
    #[tabled(rename = "Locked")]
    pub locked: u128,
    #[tabled(rename = "Votes")]
    pub voting_weight: u128,
}

/// Locks still registered at the end of the run.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct LockRow {
    #[tabled(rename = "Id")]
    pub id: u64,
    #[tabled(rename = "Owner")]
    pub owner: String,
    #[tabled(rename = "Shares")]
    pub shares: u128,
    #[tabled(rename = "Duration")]
    pub duration: u64,
    #[tabled(rename = "Unlocks at")]
    pub unlocks_at: u64,
    #[tabled(rename = "Expired")]
    pub expired: bool,
}

#[derive(Debug, Clone, Serialize, Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Everything `simulate` prints.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub steps: Vec<StepRecord>,
    pub pool: PoolSnapshot,
    pub holders: Vec<HolderRow>,
    pub locks: Vec<LockRow>,
    /// Timestamp voting weight and expiry are evaluated at.
    pub evaluated_at: u64,
}

impl SimulationReport {
    pub fn mismatches(&self) -> usize {
        self.steps.iter().filter(|s| !s.as_expected).count()
    }

    fn pool_rows(&self) -> Vec<FieldRow> {
        let p = &self.pool;
        let row = |field, value: String| FieldRow { field, value };
        vec![
            row("exchange rate", p.exchange_rate.to_string()),
            row("vault balance", p.vault_balance.to_string()),
            row("total shares", p.total_shares.to_string()),
            row("escrowed shares", p.escrowed_shares.to_string()),
            row("reward per block", p.reward_per_block.to_string()),
            row(
                "emission window",
                format!("[{}, {})", p.emission_start, p.emission_end),
            ),
            row("last realized block", p.last_realized_block.to_string()),
            row(
                "lock duration",
                format!("{}..={}", p.min_lock_duration, p.max_lock_duration),
            ),
            row("locks", p.lock_count.to_string()),
        ]
    }
}

/// A pool plus the labels scenario accounts were introduced under.
pub struct Simulator {
    pool: StakingPool<InMemoryLedger>,
    names: BTreeMap<Account, String>,
}

impl Simulator {
    pub fn new(config: &PoolConfig, scenario: &Scenario) -> Result<Self, XtesError> {
        let owner = resolve_account(&scenario.owner);
        let mut pool = StakingPool::new(config, owner, InMemoryLedger::new())?;
        let custody = *pool.custody_account();

        let mut names = BTreeMap::new();
        names.insert(owner, scenario.owner.clone());
        for funding in &scenario.accounts {
            let account = resolve_account(&funding.name);
            let ledger = pool.ledger_mut();
            ledger.mint(&account, funding.balance)?;
            ledger.approve(
                &account,
                &custody,
                funding.allowance.unwrap_or(funding.balance),
            );
            names.insert(account, funding.name.clone());
        }

        Ok(Self { pool, names })
    }

    fn account(&mut self, name: &str) -> Account {
        let account = resolve_account(name);
        self.names
            .entry(account)
            .or_insert_with(|| name.to_string());
        account
    }

    fn name_of(&self, account: &Account) -> String {
        self.names
            .get(account)
            .cloned()
            .unwrap_or_else(|| account.to_string())
    }

    /// Execute one step, returning a short description of what happened.
    pub fn apply(&mut self, step: &Step) -> Result<String, XtesError> {
        let block = step.context();
        match &step.action {
            Action::Allocate { caller, amount } => {
                let caller = self.account(caller);
                let rate = self.pool.set_reward_rate(&caller, *amount, block)?;
                Ok(format!("reward per block {}", rate))
            }
            Action::Extend { caller, blocks } => {
                let caller = self.account(caller);
                let rate = self.pool.extend_window(&caller, *blocks, block)?;
                Ok(format!(
                    "window ends at {}, reward per block {}",
                    self.pool.emission_end(),
                    rate
                ))
            }
            Action::Deposit { caller, amount } => {
                let caller = self.account(caller);
                let minted = self.pool.deposit(&caller, *amount, block)?;
                Ok(format!("minted {} shares", minted))
            }
            Action::Lock {
                caller,
                shares,
                duration,
            } => {
                let caller = self.account(caller);
                let id = self.pool.exit_to_lock(&caller, *shares, *duration, block)?;
                let quote = self.pool.quote(*shares, *duration)?;
                Ok(format!(
                    "lock {} created, quoted {} of {}",
                    id, quote.payout, quote.fair_value
                ))
            }
            Action::Release { caller, lock_id } => {
                let caller = self.account(caller);
                let released = self.pool.release(&caller, *lock_id, block)?;
                Ok(format!(
                    "paid {} of {}, forfeited {}",
                    released.quote.payout, released.quote.fair_value, released.forfeited
                ))
            }
            Action::Cancel { caller, lock_id } => {
                let caller = self.account(caller);
                let lock = self.pool.cancel(&caller, *lock_id, block)?;
                Ok(format!("returned {} shares", lock.share_amount))
            }
            Action::Harvest => {
                let realized = self.pool.harvest(block)?;
                Ok(format!("realized {}", realized))
            }
            Action::SetMinDuration { caller, seconds } => {
                let caller = self.account(caller);
                self.pool.set_min_lock_duration(&caller, *seconds)?;
                Ok(format!("minimum lock duration {}s", seconds))
            }
            Action::SetMaxDuration { caller, seconds } => {
                let caller = self.account(caller);
                self.pool.set_max_lock_duration(&caller, *seconds)?;
                Ok(format!("maximum lock duration {}s", seconds))
            }
            Action::Transfer { caller, to, shares } => {
                let caller = self.account(caller);
                let recipient = self.account(to);
                self.pool.transfer_shares(&caller, &recipient, *shares)?;
                Ok(format!("moved {} shares to {}", shares, to))
            }
            Action::TransferOwnership { caller, new_owner } => {
                let caller = self.account(caller);
                let new_owner_account = self.account(new_owner);
                self.pool.transfer_ownership(&caller, new_owner_account)?;
                Ok(format!("owner is now {}", new_owner))
            }
        }
    }

    /// Run every step in order, recording each outcome.
    pub fn run(&mut self, steps: &[Step]) -> Vec<StepRecord> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let result = self.apply(step);
                let ok = result.is_ok();
                let as_expected = ok != step.expect_error;
                if !as_expected {
                    warn!(
                        step = index,
                        action = step.action.name(),
                        "Step outcome differs from expectation"
                    );
                }
                let context = step.context();
                StepRecord {
                    index,
                    block: context.height,
                    timestamp: context.timestamp,
                    action: step.action.name(),
                    caller: step.action.caller().unwrap_or("-").to_string(),
                    ok,
                    outcome: result.unwrap_or_else(|e| e.to_string()),
                    as_expected,
                }
            })
            .collect()
    }

    /// Summarize the pool at timestamp `now`.
    pub fn report(&self, steps: Vec<StepRecord>, now: u64) -> Result<SimulationReport, XtesError> {
        let escrow = self.pool.escrow_account();
        let custody = self.pool.custody_account();
        let holders = self
            .names
            .keys()
            .filter(|account| *account != escrow && *account != custody)
            .map(|account| HolderRow {
                name: self.name_of(account),
                base_balance: self.pool.ledger().balance_of(account),
                shares: self.pool.balance_of(account),
                locked: self.pool.locked_balance_of(account),
                voting_weight: self.pool.voting_weight(account, now),
            })
            .collect();

        let mut locks = Vec::new();
        for account in self.names.keys() {
            for lock in self.pool.locks_of(account) {
                locks.push(LockRow {
                    id: lock.id,
                    owner: self.name_of(&lock.owner),
                    shares: lock.share_amount,
                    duration: lock.duration,
                    unlocks_at: lock.unlocks_at,
                    expired: lock.is_expired(now),
                });
            }
        }
        locks.sort_by_key(|row| row.id);

        Ok(SimulationReport {
            steps,
            pool: self.pool.snapshot()?,
            holders,
            locks,
            evaluated_at: now,
        })
    }
}

/// Run the simulate command.
pub fn run(cmd: &SimulateCmd) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cmd.config {
        Some(path) => PoolConfig::load(path)?,
        None => PoolConfig::default(),
    };
    let scenario = Scenario::load(&cmd.scenario)?;
    info!(
        scenario = %cmd.scenario.display(),
        steps = scenario.steps.len(),
        "Running scenario"
    );

    let report = simulate(&config, &scenario)?;
    match OutputFormat::from_json_flag(cmd.json) {
        OutputFormat::Json => println!("{}", output::format_json(&report)),
        OutputFormat::Table => print_tables(&report),
    }

    match report.mismatches() {
        0 => Ok(()),
        n => Err(ScenarioError::Mismatched(n).into()),
    }
}

/// Replay `scenario` on a pool built from `config`.
pub fn simulate(config: &PoolConfig, scenario: &Scenario) -> Result<SimulationReport, ScenarioError> {
    let mut simulator = Simulator::new(config, scenario)?;
    let steps = simulator.run(&scenario.steps);
    let now = scenario
        .steps
        .iter()
        .map(|step| step.context().timestamp)
        .max()
        .unwrap_or(0);
    Ok(simulator.report(steps, now)?)
}

fn print_tables(report: &SimulationReport) {
    println!("Steps");
    println!("{}", output::format_table(&report.steps));
    println!();
    println!("Pool (at t={})", report.evaluated_at);
    println!("{}", output::format_table(&report.pool_rows()));
    println!();
    println!("Holders");
    println!("{}", output::format_table(&report.holders));
    if !report.locks.is_empty() {
        println!();
        println!("Locks");
        println!("{}", output::format_table(&report.locks));
    }
}
