//! OrderRegistry - at most one resting limit order per (account, asset)
//!
//! A simplifying business rule, not a technical constraint: each account
//! may hold one active limit order per asset. The facade rejects a second
//! placement with `OrderAlreadyExists` and offers change/cancel instead.
//!
//! The registry also feeds spendable-balance accounting: an account's
//! reservations are exactly the orders recorded here.

use rustc_hash::FxHashMap;

use crate::core_types::{AccountId, OrderId};

#[derive(Debug, Default)]
pub struct OrderRegistry {
    active: FxHashMap<(AccountId, String), OrderId>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an active order. Returns false (and records nothing) if the
    /// slot is already taken.
    pub fn insert(&mut self, account: AccountId, ticker: &str, order_id: OrderId) -> bool {
        let key = (account, ticker.to_string());
        if self.active.contains_key(&key) {
            return false;
        }
        self.active.insert(key, order_id);
        true
    }

    /// The account's active order id for this asset, if any
    #[inline]
    pub fn get(&self, account: AccountId, ticker: &str) -> Option<OrderId> {
        self.active.get(&(account, ticker.to_string())).copied()
    }

    /// Clear the slot, returning the order id that occupied it
    pub fn remove(&mut self, account: AccountId, ticker: &str) -> Option<OrderId> {
        self.active.remove(&(account, ticker.to_string()))
    }

    /// All of one account's active orders as (ticker, order_id)
    pub fn orders_of(&self, account: AccountId) -> Vec<(&str, OrderId)> {
        self.active
            .iter()
            .filter(|((acct, _), _)| *acct == account)
            .map(|((_, ticker), id)| (ticker.as_str(), *id))
            .collect()
    }
}
