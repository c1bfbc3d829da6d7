// models.rs - Core order and trade types

use serde::{Deserialize, Serialize};

use crate::core_types::{AccountId, Amount, OrderId, Price};
use crate::errors::ExchangeError;

/// Order side: Buy or Sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side of the book an incoming order crosses against
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Limit,  // Must specify price; remainder rests in the book
    Market, // Executes at best available prices; remainder is discarded
}

/// An order as tracked by the exchange.
///
/// Limit orders rest in a book until filled or cancelled. Market orders
/// reuse this record transiently for the matching pass but are never
/// stored: `price` for a market order is a sentinel (u64::MAX for Buy,
/// 0 for Sell) so the crossing loop's price bound is always satisfied.
///
/// Invariant: 0 <= filled <= amount. An order is present in its book
/// exactly while filled < amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: AccountId,
    pub ticker: String,
    pub side: Side,
    pub kind: OrderKind,
    pub amount: Amount,
    pub price: Price,
    pub filled: Amount,
}

impl Order {
    /// Create a new limit order
    pub fn limit(
        id: OrderId,
        owner: AccountId,
        ticker: impl Into<String>,
        side: Side,
        amount: Amount,
        price: Price,
    ) -> Self {
        Self {
            id,
            owner,
            ticker: ticker.into(),
            side,
            kind: OrderKind::Limit,
            amount,
            price,
            filled: 0,
        }
    }

    /// Create a transient market order
    pub fn market(
        id: OrderId,
        owner: AccountId,
        ticker: impl Into<String>,
        side: Side,
        amount: Amount,
    ) -> Self {
        Self {
            id,
            owner,
            ticker: ticker.into(),
            side,
            kind: OrderKind::Market,
            amount,
            price: if side == Side::Buy { u64::MAX } else { 0 },
            filled: 0,
        }
    }

    /// Remaining quantity to fill
    #[inline]
    pub fn remaining(&self) -> Amount {
        self.amount - self.filled
    }

    /// Check if the order is fully filled
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.filled >= self.amount
    }

    /// Native currency required to cover this order's unfilled portion.
    ///
    /// Buy: `remaining × price` (u128 intermediate, explicit error when the
    /// result exceeds u64 range - silent wrapping would under-reserve).
    /// Sell: `remaining` of the asset itself, no price involved.
    pub fn required_reserve(&self) -> Result<Amount, ExchangeError> {
        match self.side {
            Side::Buy => {
                let cost = (self.remaining() as u128) * (self.price as u128);
                u64::try_from(cost).map_err(|_| ExchangeError::CostOverflow {
                    amount: self.remaining(),
                    price: self.price,
                })
            }
            Side::Sell => Ok(self.remaining()),
        }
    }
}

/// A trade that occurred when orders crossed.
///
/// Settlement always uses the maker's (resting order's) price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub taker_order_id: OrderId,
    pub maker_order_id: OrderId,
    pub buyer: AccountId,
    pub seller: AccountId,
    pub price: Price,
    pub qty: Amount,
}
