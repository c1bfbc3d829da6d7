//! Errors surfaced by the exchange facade
//!
//! Every facade operation is all-or-nothing: validation runs first and a
//! returned error means no state was mutated. None of these are retried
//! internally.

use thiserror::Error;

use crate::core_types::{Amount, Price};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Caller is not the exchange administrator")]
    Unauthorized,

    #[error("Asset not registered: {0}")]
    AssetNotRegistered(String),

    #[error("Asset already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Insufficient spendable balance")]
    InsufficientSpendableBalance,

    #[error("Account already has an active order for this asset")]
    OrderAlreadyExists,

    #[error("No active order for this account and asset")]
    NoActiveOrder,

    #[error("Custody transfer failed: {0}")]
    TransferFailed(String),

    #[error("Cost overflow: amount={amount} * price={price} exceeds u64::MAX")]
    CostOverflow { amount: Amount, price: Price },

    #[error("Balance overflow: credit would exceed u64::MAX")]
    BalanceOverflow,
}
