// crates/xtes-vault/src/config.rs
//
// Pool deployment parameters.
// Loaded from a TOML file or populated with the reference deployment's
// defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use xtes_core::{Account, XtesError};

use crate::token::{DEFAULT_SHARE_DECIMALS, DEFAULT_SHARE_NAME, DEFAULT_SHARE_SYMBOL};

/// Parameters fixed when a pool is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Instance label. The pool's custody and escrow accounts are derived
    /// from it, so two pools sharing a ledger need different labels.
    #[serde(default = "default_instance")]
    pub instance: String,

    /// First block of the reward emission window.
    #[serde(default = "default_emission_start")]
    pub emission_start: u64,

    /// Block at which emission stops. Must be after `emission_start`.
    #[serde(default = "default_emission_end")]
    pub emission_end: u64,

    /// Shortest lock duration accepted, in seconds.
    #[serde(default = "default_min_lock_duration")]
    pub min_lock_duration: u64,

    /// Longest lock duration accepted, in seconds.
    #[serde(default = "default_max_lock_duration")]
    pub max_lock_duration: u64,

    #[serde(default = "default_share_name")]
    pub share_name: String,

    #[serde(default = "default_share_symbol")]
    pub share_symbol: String,

    #[serde(default = "default_share_decimals")]
    pub share_decimals: u8,

    /// Where the discount on released locks goes. When unset the discount
    /// stays in the vault and accrues to remaining holders. Accepts a
    /// 64-character hex account or a label.
    #[serde(default)]
    pub penalty_recipient: Option<String>,
}

fn default_instance() -> String {
    "xtes".to_string()
}

fn default_emission_start() -> u64 {
    100
}

fn default_emission_end() -> u64 {
    1_100
}

fn default_min_lock_duration() -> u64 {
    14
}

fn default_max_lock_duration() -> u64 {
    90
}

fn default_share_name() -> String {
    DEFAULT_SHARE_NAME.to_string()
}

fn default_share_symbol() -> String {
    DEFAULT_SHARE_SYMBOL.to_string()
}

fn default_share_decimals() -> u8 {
    DEFAULT_SHARE_DECIMALS
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            instance: default_instance(),
            emission_start: default_emission_start(),
            emission_end: default_emission_end(),
            min_lock_duration: default_min_lock_duration(),
            max_lock_duration: default_max_lock_duration(),
            share_name: default_share_name(),
            share_symbol: default_share_symbol(),
            share_decimals: default_share_decimals(),
            penalty_recipient: None,
        }
    }
}

impl PoolConfig {
    /// Load and validate configuration from a TOML file at the given path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, XtesError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| XtesError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, XtesError> {
        let config: PoolConfig =
            toml::from_str(contents).map_err(|e| XtesError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the window and lock bounds invariants.
    pub fn validate(&self) -> Result<(), XtesError> {
        if self.emission_end <= self.emission_start {
            return Err(XtesError::InvalidWindow(format!(
                "emission end {} must be after start {}",
                self.emission_end, self.emission_start
            )));
        }
        if self.min_lock_duration > self.max_lock_duration {
            return Err(XtesError::InvalidBounds {
                min: self.min_lock_duration,
                max: self.max_lock_duration,
            });
        }
        Ok(())
    }

    /// Custody account holding the pool's base tokens.
    pub fn custody_account(&self) -> Account {
        Account::from_label(&format!("{}/custody", self.instance))
    }

    /// Escrow account holding locked shares.
    pub fn escrow_account(&self) -> Account {
        Account::from_label(&format!("{}/escrow", self.instance))
    }

    /// Resolve `penalty_recipient`: hex if it parses as an account, a label
    /// otherwise.
    pub fn penalty_recipient_account(&self) -> Option<Account> {
        self.penalty_recipient
            .as_deref()
            .map(|raw| Account::from_hex(raw).unwrap_or_else(|_| Account::from_label(raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = PoolConfig::default();
        assert_eq!(config.emission_start, 100);
        assert_eq!(config.emission_end, 1_100);
        assert_eq!(config.min_lock_duration, 14);
        assert_eq!(config.max_lock_duration, 90);
        assert_eq!(config.share_symbol, "xTES");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PoolConfig::from_toml_str(
            r#"
            emission_start = 300
            emission_end = 1300
            penalty_recipient = "treasury"
            "#,
        )
        .unwrap();
        assert_eq!(config.emission_start, 300);
        assert_eq!(config.max_lock_duration, 90);
        assert_eq!(
            config.penalty_recipient_account(),
            Some(Account::from_label("treasury"))
        );
    }

    #[test]
    fn test_penalty_recipient_hex() {
        let treasury = Account::from_label("treasury");
        let config = PoolConfig {
            penalty_recipient: Some(treasury.to_hex()),
            ..PoolConfig::default()
        };
        assert_eq!(config.penalty_recipient_account(), Some(treasury));
    }

    #[test]
    fn test_rejects_bad_window() {
        let err = PoolConfig::from_toml_str("emission_start = 50\nemission_end = 50").unwrap_err();
        assert!(matches!(err, XtesError::InvalidWindow(_)));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let err =
            PoolConfig::from_toml_str("min_lock_duration = 91\nmax_lock_duration = 90").unwrap_err();
        assert_eq!(err, XtesError::InvalidBounds { min: 91, max: 90 });
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = PoolConfig::from_toml_str("emission_start = \"soon\"").unwrap_err();
        assert!(matches!(err, XtesError::Config(_)));
    }

    #[test]
    fn test_instances_have_distinct_accounts() {
        let a = PoolConfig::default();
        let b = PoolConfig {
            instance: "other".to_string(),
            ..PoolConfig::default()
        };
        assert_ne!(a.custody_account(), b.custody_account());
        assert_ne!(a.custody_account(), a.escrow_account());
    }

    #[test]
    fn test_load_missing_file() {
        let err = PoolConfig::load("/nonexistent/xtes/pool.toml").unwrap_err();
        assert!(matches!(err, XtesError::Config(_)));
    }
}
