// crates/xtes-core/src/identity.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::hash_labeled;
use crate::error::XtesError;

const ACCOUNT_DOMAIN: &str = "xtes:account";

/// A principal on the base-token and share ledgers.
///
/// Accounts are opaque 32-byte identifiers. Holders, the pool's custody
/// account, and the share escrow account all live in the same key space.
/// Serialized as a 64-character hex string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Account([u8; 32]);

impl Account {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive an account deterministically from a human-readable label.
    ///
    /// Used by tests, the simulator, and the pool to name its own
    /// custody/escrow accounts.
    pub fn from_label(label: &str) -> Self {
        Self(hash_labeled(ACCOUNT_DOMAIN, label))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a 64-character hex string (optionally `0x`-prefixed).
    pub fn from_hex(s: &str) -> Result<Self, XtesError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed)
            .map_err(|e| XtesError::Serialization(format!("invalid account hex: {}", e)))?;
        let array: [u8; 32] = bytes.try_into().map_err(|_| {
            XtesError::Serialization("account must be exactly 32 bytes".to_string())
        })?;
        Ok(Self(array))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form, enough to tell accounts apart in logs.
        write!(f, "0x{}", hex::encode(&self.0[..6]))
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account({})", self)
    }
}

impl TryFrom<String> for Account {
    type Error = XtesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Account::from_hex(&value)
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        account.to_hex()
    }
}
