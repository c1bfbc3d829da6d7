//! BalanceLedger - the authoritative (account, asset) balance store
//!
//! The SINGLE source of truth for balances. ALL balance mutations MUST go
//! through `credit`/`debit`.
//!
//! # Invariants (enforced here):
//! - A balance is never negative: every debit checks sufficiency first.
//! - No overflow: credits use checked arithmetic.
//! - A failed debit leaves the ledger untouched.

use rustc_hash::FxHashMap;

use crate::core_types::{AccountId, Amount};
use crate::errors::ExchangeError;

/// Mapping of (account, ticker) -> available quantity.
///
/// Accounts and asset slots are created implicitly on first credit; a
/// missing entry reads as zero.
#[derive(Debug, Default)]
pub struct BalanceLedger {
    balances: FxHashMap<AccountId, FxHashMap<String, Amount>>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance for (account, ticker). Missing entries read as 0.
    #[inline]
    pub fn balance(&self, account: AccountId, ticker: &str) -> Amount {
        self.balances
            .get(&account)
            .and_then(|assets| assets.get(ticker))
            .copied()
            .unwrap_or(0)
    }

    /// Unconditionally increase a balance, creating the entry if needed.
    ///
    /// # Errors
    /// `BalanceOverflow` if the balance would exceed u64::MAX.
    pub fn credit(
        &mut self,
        account: AccountId,
        ticker: &str,
        qty: Amount,
    ) -> Result<(), ExchangeError> {
        let slot = self
            .balances
            .entry(account)
            .or_default()
            .entry(ticker.to_string())
            .or_insert(0);
        *slot = slot
            .checked_add(qty)
            .ok_or(ExchangeError::BalanceOverflow)?;
        Ok(())
    }

    /// Decrease a balance, returning the new balance.
    ///
    /// # Errors
    /// `InsufficientBalance` if the current balance is below `qty`; the
    /// ledger is unchanged in that case.
    pub fn debit(
        &mut self,
        account: AccountId,
        ticker: &str,
        qty: Amount,
    ) -> Result<Amount, ExchangeError> {
        // A zero debit must succeed even before the slot exists
        if qty == 0 {
            return Ok(self.balance(account, ticker));
        }
        let slot = self
            .balances
            .get_mut(&account)
            .and_then(|assets| assets.get_mut(ticker))
            .filter(|bal| **bal >= qty)
            .ok_or(ExchangeError::InsufficientBalance)?;
        *slot -= qty;
        Ok(*slot)
    }
}
