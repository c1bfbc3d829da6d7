//! Custody boundary - moving assets between external custody and the ledger
//!
//! Deposits and withdrawals are thin wrappers around the ledger's
//! credit/debit primitives, gated on a custody confirmation: no credit
//! without a confirmed inbound transfer, no successful debit without a
//! confirmed outbound transfer.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::core_types::{AccountId, Amount};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("Custody transfer rejected: {0}")]
    Rejected(String),
}

/// Adapter to the external custody system holding the real assets.
///
/// Implementations confirm that an asset actually moved before the ledger
/// is touched. The exchange calls `confirm_inbound` before crediting a
/// deposit and `release_outbound` before debiting a withdrawal.
pub trait CustodyAdapter {
    fn confirm_inbound(
        &mut self,
        account: AccountId,
        ticker: &str,
        qty: Amount,
    ) -> Result<(), CustodyError>;

    fn release_outbound(
        &mut self,
        account: AccountId,
        ticker: &str,
        qty: Amount,
    ) -> Result<(), CustodyError>;
}

/// In-memory custody simulation for tests and the demo binary.
///
/// Tracks per-account external holdings; inbound confirmation fails when
/// the external side doesn't hold enough, mirroring a failed token
/// transfer.
#[derive(Debug, Default)]
pub struct MockCustody {
    external: FxHashMap<(AccountId, String), Amount>,
}

impl MockCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account's external holdings
    pub fn mint(&mut self, account: AccountId, ticker: &str, qty: Amount) {
        *self
            .external
            .entry((account, ticker.to_string()))
            .or_insert(0) += qty;
    }

    pub fn external_balance(&self, account: AccountId, ticker: &str) -> Amount {
        self.external
            .get(&(account, ticker.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

impl CustodyAdapter for MockCustody {
    fn confirm_inbound(
        &mut self,
        account: AccountId,
        ticker: &str,
        qty: Amount,
    ) -> Result<(), CustodyError> {
        let held = self
            .external
            .entry((account, ticker.to_string()))
            .or_insert(0);
        if *held < qty {
            return Err(CustodyError::Rejected(format!(
                "inbound {qty} {ticker} exceeds external holdings"
            )));
        }
        *held -= qty;
        Ok(())
    }

    fn release_outbound(
        &mut self,
        account: AccountId,
        ticker: &str,
        qty: Amount,
    ) -> Result<(), CustodyError> {
        *self
            .external
            .entry((account, ticker.to_string()))
            .or_insert(0) += qty;
        Ok(())
    }
}
