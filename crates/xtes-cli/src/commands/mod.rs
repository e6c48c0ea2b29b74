// crates/xtes-cli/src/commands/mod.rs
//
// Command module declarations for the xTES CLI.

pub mod multiplier;
pub mod quote;
pub mod scenario;
pub mod simulate;
