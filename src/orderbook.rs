//! OrderBook - BTreeMap-based price-time priority book for one asset
//!
//! Two ordered collections of resting limit orders, one per side. Matching
//! logic lives in the engine module; the book only maintains ordering.
//!
//! # Key Design:
//! - Asks are stored with normal keys (ascending, lowest price = best ask)
//! - Bids use negated keys `u64::MAX - price` (highest price comes first)
//! - FIFO queues per price level keep ties stable by arrival time

use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashMap;

use crate::core_types::{OrderId, Price};
use crate::models::{Order, Side};

#[derive(Debug, Default)]
pub struct OrderBook {
    /// Sell orders: price -> orders (ascending, lowest = best)
    asks: BTreeMap<Price, VecDeque<Order>>,
    /// Buy orders: (MAX - price) -> orders (so highest price first)
    bids: BTreeMap<Price, VecDeque<Order>>,
    /// OrderId -> (price, side) for O(1) lookup on cancel/query
    order_index: FxHashMap<OrderId, (Price, Side)>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Best bid price (highest resting buy)
    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first_key_value().map(|(k, _)| u64::MAX - k)
    }

    /// Best ask price (lowest resting sell)
    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first_key_value().map(|(k, _)| *k)
    }

    /// Best price on one side
    #[inline]
    pub fn best_price(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.best_bid(),
            Side::Sell => self.best_ask(),
        }
    }

    /// Rest an unfilled or partially filled limit order.
    ///
    /// Appends at its price level, preserving arrival order among
    /// equal-priced orders.
    pub fn rest_order(&mut self, order: Order) {
        self.order_index.insert(order.id, (order.price, order.side));

        match order.side {
            Side::Buy => {
                let key = u64::MAX - order.price;
                self.bids.entry(key).or_default().push_back(order);
            }
            Side::Sell => {
                self.asks.entry(order.price).or_default().push_back(order);
            }
        }
    }

    /// Look up a resting order by id
    pub fn get_order(&self, order_id: OrderId) -> Option<&Order> {
        let (price, side) = self.order_index.get(&order_id)?;
        let level = match side {
            Side::Buy => self.bids.get(&(u64::MAX - price)),
            Side::Sell => self.asks.get(price),
        }?;
        level.iter().find(|o| o.id == order_id)
    }

    /// Remove a resting order by id, returning it if present.
    ///
    /// O(1) index lookup + O(log n) tree access + O(k) queue scan at the
    /// price level. Empty price levels are pruned.
    pub fn remove_order(&mut self, order_id: OrderId) -> Option<Order> {
        let (price, side) = self.order_index.remove(&order_id)?;

        let (book, key) = match side {
            Side::Buy => (&mut self.bids, u64::MAX - price),
            Side::Sell => (&mut self.asks, price),
        };

        let level = book.get_mut(&key)?;
        let pos = level.iter().position(|o| o.id == order_id)?;
        let order = level.remove(pos)?;

        if level.is_empty() {
            book.remove(&key);
        }
        Some(order)
    }

    /// Full ordered sequence for one side, most-priority-first.
    ///
    /// Buy side: price descending; sell side: price ascending; FIFO within
    /// a price level.
    pub fn side_orders(&self, side: Side) -> Vec<&Order> {
        let book = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        book.values().flat_map(|level| level.iter()).collect()
    }

    /// Number of resting orders on one side
    pub fn side_len(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.bids.values().map(|l| l.len()).sum(),
            Side::Sell => self.asks.values().map(|l| l.len()).sum(),
        }
    }

    /// Mutable access to ask levels (for the matching engine)
    #[inline]
    pub(crate) fn asks_mut(&mut self) -> &mut BTreeMap<Price, VecDeque<Order>> {
        &mut self.asks
    }

    /// Mutable access to bid levels (for the matching engine)
    #[inline]
    pub(crate) fn bids_mut(&mut self) -> &mut BTreeMap<Price, VecDeque<Order>> {
        &mut self.bids
    }

    /// Drop an order id from the index (after a pop_front fill)
    #[inline]
    pub(crate) fn remove_from_index(&mut self, order_id: OrderId) {
        self.order_index.remove(&order_id);
    }
}
