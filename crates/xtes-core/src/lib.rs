// crates/xtes-core/src/lib.rs
//
// xtes-core: Core types, error taxonomy, and collaborator traits for the
// xTES share-based staking vault.
//
// This is the leaf crate that every other crate in the workspace depends on.
// It defines account identities, block context, the protocol-wide error type,
// and the base-token ledger interface the vault engine is written against.

pub mod block;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use xtes_core::Account;`
pub use block::BlockContext;
pub use error::XtesError;
pub use identity::Account;
pub use traits::{TokenLedger, Transfer};
