// crates/xtes-cli/src/commands/scenario.rs
//
// Scenario files for `xtes simulate`.
//
// A scenario names the pool owner, funds accounts on the in-memory base
// ledger, and lists steps executed in order. Each step carries the block
// height and (optionally) timestamp it runs at; timestamps default to the
// height. Accounts are referred to by label or 64-character hex.
//
//   owner = "owner"
//
//   [[accounts]]
//   name = "bob"
//   balance = 1000
//
//   [[steps]]
//   action = "deposit"
//   block = 110
//   caller = "bob"
//   amount = 100

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use xtes_core::{Account, BlockContext, XtesError};

/// Failures specific to loading and replaying scenarios.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} step(s) did not match their expected outcome")]
    Mismatched(usize),

    #[error(transparent)]
    Pool(#[from] XtesError),
}

/// A full scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Pool owner and first reward allocator.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Base-token balances minted before the first step.
    #[serde(default)]
    pub accounts: Vec<Funding>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_owner() -> String {
    "owner".to_string()
}

/// Initial base-token funding for one account.
#[derive(Debug, Clone, Deserialize)]
pub struct Funding {
    pub name: String,
    pub balance: u128,
    /// Allowance granted to the pool custody account. Defaults to the
    /// full balance.
    #[serde(default)]
    pub allowance: Option<u128>,
}

/// One scenario step.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub block: u64,
    #[serde(default)]
    pub timestamp: Option<u64>,
    /// The step is expected to be rejected.
    #[serde(default)]
    pub expect_error: bool,
    #[serde(flatten)]
    pub action: Action,
}

impl Step {
    pub fn context(&self) -> BlockContext {
        BlockContext::new(self.block, self.timestamp.unwrap_or(self.block))
    }
}

/// The pool operation a step performs.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Allocate { caller: String, amount: u128 },
    Extend { caller: String, blocks: u64 },
    Deposit { caller: String, amount: u128 },
    Lock { caller: String, shares: u128, duration: u64 },
    Release { caller: String, lock_id: u64 },
    Cancel { caller: String, lock_id: u64 },
    Harvest,
    SetMinDuration { caller: String, seconds: u64 },
    SetMaxDuration { caller: String, seconds: u64 },
    Transfer { caller: String, to: String, shares: u128 },
    TransferOwnership { caller: String, new_owner: String },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Allocate { .. } => "allocate",
            Action::Extend { .. } => "extend",
            Action::Deposit { .. } => "deposit",
            Action::Lock { .. } => "lock",
            Action::Release { .. } => "release",
            Action::Cancel { .. } => "cancel",
            Action::Harvest => "harvest",
            Action::SetMinDuration { .. } => "set_min_duration",
            Action::SetMaxDuration { .. } => "set_max_duration",
            Action::Transfer { .. } => "transfer",
            Action::TransferOwnership { .. } => "transfer_ownership",
        }
    }

    /// Label of the account performing the step, if any.
    pub fn caller(&self) -> Option<&str> {
        match self {
            Action::Harvest => None,
            Action::Allocate { caller, .. }
            | Action::Extend { caller, .. }
            | Action::Deposit { caller, .. }
            | Action::Lock { caller, .. }
            | Action::Release { caller, .. }
            | Action::Cancel { caller, .. }
            | Action::SetMinDuration { caller, .. }
            | Action::SetMaxDuration { caller, .. }
            | Action::Transfer { caller, .. }
            | Action::TransferOwnership { caller, .. } => Some(caller),
        }
    }
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(contents)?)
    }
}

/// Resolve a scenario account reference: hex if it parses, label otherwise.
pub fn resolve_account(name: &str) -> Account {
    Account::from_hex(name).unwrap_or_else(|_| Account::from_label(name))
}
