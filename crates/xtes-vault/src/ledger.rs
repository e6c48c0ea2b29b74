// crates/xtes-vault/src/ledger.rs
//
// In-memory base-token ledger with ERC20-style allowances.
//
// Stands in for the external fungible token in tests, the simulator, and
// embedders that keep balances in process. Every call, batches included,
// either applies fully or fails with `XtesError::CollaboratorFailure` and
// changes nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xtes_core::{Account, TokenLedger, Transfer, XtesError};

/// Balances and allowances for a single fungible base token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryLedger {
    balances: BTreeMap<Account, u128>,
    /// (owner, spender) -> remaining allowance. `u128::MAX` never decreases.
    allowances: BTreeMap<(Account, Account), u128>,
    total_supply: u128,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new tokens for `to`.
    pub fn mint(&mut self, to: &Account, amount: u128) -> Result<(), XtesError> {
        let supply = self.total_supply.checked_add(amount).ok_or_else(|| {
            XtesError::CollaboratorFailure("base token supply overflow".to_string())
        })?;
        *self.balances.entry(*to).or_insert(0) += amount;
        self.total_supply = supply;
        Ok(())
    }

    /// Let `spender` move up to `amount` of `owner`'s tokens. Overwrites any
    /// previous allowance.
    pub fn approve(&mut self, owner: &Account, spender: &Account, amount: u128) {
        self.allowances.insert((*owner, *spender), amount);
    }

    pub fn allowance(&self, owner: &Account, spender: &Account) -> u128 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }
}

impl TokenLedger for InMemoryLedger {
    fn transfer(&mut self, from: &Account, to: &Account, amount: u128) -> Result<(), XtesError> {
        self.execute(&[Transfer::Direct {
            from: *from,
            to: *to,
            amount,
        }])
    }

    fn transfer_from(
        &mut self,
        spender: &Account,
        from: &Account,
        to: &Account,
        amount: u128,
    ) -> Result<(), XtesError> {
        self.execute(&[Transfer::Delegated {
            spender: *spender,
            from: *from,
            to: *to,
            amount,
        }])
    }

    fn balance_of(&self, account: &Account) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), XtesError> {
        // Touched entries are staged here and written back only once every
        // transfer in the batch has cleared.
        let mut balances: BTreeMap<Account, u128> = BTreeMap::new();
        let mut allowances: BTreeMap<(Account, Account), u128> = BTreeMap::new();

        for transfer in transfers {
            let (from, to, amount) = match *transfer {
                Transfer::Direct { from, to, amount } => (from, to, amount),
                Transfer::Delegated {
                    spender,
                    from,
                    to,
                    amount,
                } => {
                    let allowed = *allowances
                        .entry((from, spender))
                        .or_insert_with(|| self.allowance(&from, &spender));
                    if amount > allowed {
                        return Err(XtesError::CollaboratorFailure(format!(
                            "transfer amount {} exceeds allowance {} granted by {}",
                            amount, allowed, from
                        )));
                    }
                    if allowed != u128::MAX {
                        allowances.insert((from, spender), allowed - amount);
                    }
                    (from, to, amount)
                }
            };

            let available = *balances
                .entry(from)
                .or_insert_with(|| self.balance_of(&from));
            if amount > available {
                return Err(XtesError::CollaboratorFailure(format!(
                    "transfer amount {} exceeds balance {} of {}",
                    amount, available, from
                )));
            }
            if amount == 0 || from == to {
                continue;
            }
            balances.insert(from, available - amount);
            // Balances sum to total_supply, so the credit cannot overflow.
            *balances
                .entry(to)
                .or_insert_with(|| self.balance_of(&to)) += amount;
        }

        for (account, balance) in balances {
            if balance == 0 {
                self.balances.remove(&account);
            } else {
                self.balances.insert(account, balance);
            }
        }
        self.allowances.extend(allowances);
        Ok(())
    }
}
