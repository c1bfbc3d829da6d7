//! Exchange facade - the public operation set
//!
//! Composes the balance ledger, per-asset order books, the order registry
//! and the matching engine. Every mutating operation takes `&mut self`,
//! which makes each public call a single critical section: state is only
//! ever observed in well-defined before/after snapshots per call, and the
//! match loop runs to completion without suspension. Callers exposing
//! concurrent entry points must serialize access (mutex or single-writer
//! actor) around this type.
//!
//! All operations are all-or-nothing: validation runs in full before any
//! mutation, so a returned error means nothing changed.

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::asset_registry::AssetRegistry;
use crate::core_types::{AccountId, Amount, NATIVE_TICKER, OrderId, Price};
use crate::custody::CustodyAdapter;
use crate::engine::MatchingEngine;
use crate::errors::ExchangeError;
use crate::ledger::BalanceLedger;
use crate::models::{Order, Side, Trade};
use crate::order_registry::OrderRegistry;
use crate::orderbook::OrderBook;

pub struct Exchange {
    admin: AccountId,
    assets: AssetRegistry,
    ledger: BalanceLedger,
    books: FxHashMap<String, OrderBook>,
    registry: OrderRegistry,
    /// Exchange-wide order id counter, never reused
    next_order_id: OrderId,
}

impl Exchange {
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            assets: AssetRegistry::new(),
            ledger: BalanceLedger::new(),
            books: FxHashMap::default(),
            registry: OrderRegistry::new(),
            next_order_id: 1,
        }
    }

    // ============================================================
    // ADMINISTRATION
    // ============================================================

    /// Register a token ticker with its custody handle. Admin only.
    pub fn register_asset(
        &mut self,
        caller: AccountId,
        ticker: &str,
        handle: &str,
    ) -> Result<(), ExchangeError> {
        if caller != self.admin {
            return Err(ExchangeError::Unauthorized);
        }
        self.assets.register(ticker, handle)?;
        info!(ticker, handle, "asset registered");
        Ok(())
    }

    // ============================================================
    // CUSTODY BOUNDARY
    // ============================================================

    /// Deposit from external custody into the ledger.
    ///
    /// The credit happens only after custody confirms the inbound
    /// transfer; a rejected transfer leaves the ledger untouched.
    pub fn deposit(
        &mut self,
        custody: &mut dyn CustodyAdapter,
        account: AccountId,
        ticker: &str,
        qty: Amount,
    ) -> Result<(), ExchangeError> {
        self.assets.ensure_known(ticker)?;
        // Validate the credit can land before touching custody, so a
        // confirmed inbound transfer is never stranded.
        if self.ledger.balance(account, ticker).checked_add(qty).is_none() {
            return Err(ExchangeError::BalanceOverflow);
        }
        custody
            .confirm_inbound(account, ticker, qty)
            .map_err(|e| ExchangeError::TransferFailed(e.to_string()))?;
        self.ledger.credit(account, ticker, qty)?;
        debug!(account, ticker, qty, "deposit credited");
        Ok(())
    }

    /// Withdraw from the ledger to external custody.
    ///
    /// Checks the RAW balance (not spendable): this is the custody
    /// boundary's `InsufficientBalance`, matching the original behavior.
    /// Withdrawing assets reserved by a resting order leaves that order
    /// under-backed; the engine evicts it when a taker next touches it.
    pub fn withdraw(
        &mut self,
        custody: &mut dyn CustodyAdapter,
        account: AccountId,
        ticker: &str,
        qty: Amount,
    ) -> Result<(), ExchangeError> {
        self.assets.ensure_known(ticker)?;
        if self.ledger.balance(account, ticker) < qty {
            return Err(ExchangeError::InsufficientBalance);
        }
        custody
            .release_outbound(account, ticker, qty)
            .map_err(|e| ExchangeError::TransferFailed(e.to_string()))?;
        self.ledger.debit(account, ticker, qty)?;
        debug!(account, ticker, qty, "withdrawal debited");
        Ok(())
    }

    // ============================================================
    // ORDER PLACEMENT
    // ============================================================

    /// Place a limit order, matching immediately and resting any
    /// remainder. Returns the order's final state (possibly already fully
    /// filled and removed).
    pub fn place_limit_order(
        &mut self,
        caller: AccountId,
        side: Side,
        ticker: &str,
        amount: Amount,
        price: Price,
    ) -> Result<Order, ExchangeError> {
        self.assets.ensure_known(ticker)?;
        if self.registry.get(caller, ticker).is_some() {
            return Err(ExchangeError::OrderAlreadyExists);
        }
        let order = Order::limit(self.next_order_id, caller, ticker, side, amount, price);
        self.check_limit_cover(&order, None)?;

        self.next_order_id += 1;
        self.run_and_rest(order)
    }

    /// Place a market order. The unmatched remainder is discarded, never
    /// rested. Returns the filled quantity.
    pub fn place_market_order(
        &mut self,
        caller: AccountId,
        side: Side,
        ticker: &str,
        amount: Amount,
    ) -> Result<Amount, ExchangeError> {
        self.assets.ensure_known(ticker)?;

        match side {
            // A sell spends the tokens themselves: require cover up front.
            Side::Sell => {
                if self.spendable(caller, ticker, None) < amount {
                    return Err(ExchangeError::InsufficientSpendableBalance);
                }
            }
            // A buy has no price bound, so no worst case to reserve.
            // Fills are bounded per step by the live native balance; all
            // we require is something to spend when there is a book to
            // cross (an empty book is a valid zero-fill).
            Side::Buy => {
                let book_nonempty = self
                    .books
                    .get(ticker)
                    .is_some_and(|b| b.best_price(side.opposite()).is_some());
                if book_nonempty && self.spendable(caller, NATIVE_TICKER, None) == 0 {
                    return Err(ExchangeError::InsufficientSpendableBalance);
                }
            }
        }

        let mut order = Order::market(self.take_order_id(), caller, ticker, side, amount);
        let book = self.books.entry(ticker.to_string()).or_default();
        let trades =
            MatchingEngine::execute(book, &mut self.ledger, &mut self.registry, &mut order)?;
        Self::log_trades(ticker, &trades);
        info!(
            caller,
            ticker,
            ?side,
            amount,
            filled = order.filled,
            "market order executed"
        );
        Ok(order.filled)
    }

    /// Replace the caller's active limit order on this asset: atomically
    /// cancel it (settled fills stand) and place a fresh order at the new
    /// terms, with `filled` reset and matching re-run.
    pub fn change_limit_order(
        &mut self,
        caller: AccountId,
        side: Side,
        ticker: &str,
        new_amount: Amount,
        new_price: Price,
    ) -> Result<Order, ExchangeError> {
        self.assets.ensure_known(ticker)?;
        let old_id = self
            .registry
            .get(caller, ticker)
            .ok_or(ExchangeError::NoActiveOrder)?;

        // Validate against spendable balance with the old order's
        // reservation excluded - the old order is about to be cancelled,
        // so its reservation must not count against the replacement.
        let order = Order::limit(self.next_order_id, caller, ticker, side, new_amount, new_price);
        self.check_limit_cover(&order, Some(old_id))?;
        self.next_order_id += 1;

        if let Some(book) = self.books.get_mut(ticker) {
            let _ = book.remove_order(old_id);
        }
        self.registry.remove(caller, ticker);

        debug!(caller, ticker, old_id, new_id = order.id, "order changed");
        self.run_and_rest(order)
    }

    /// Cancel the caller's active limit order on this asset. No ledger
    /// mutation: nothing was debited for the unfilled portion, so only
    /// the implicit reservation is released.
    pub fn cancel_limit_order(
        &mut self,
        caller: AccountId,
        side: Side,
        ticker: &str,
    ) -> Result<Order, ExchangeError> {
        let order_id = self
            .registry
            .get(caller, ticker)
            .ok_or(ExchangeError::NoActiveOrder)?;

        let book = self
            .books
            .get_mut(ticker)
            .ok_or(ExchangeError::NoActiveOrder)?;
        // Nothing to cancel on the other side
        if book.get_order(order_id).is_none_or(|o| o.side != side) {
            return Err(ExchangeError::NoActiveOrder);
        }

        let order = book.remove_order(order_id).ok_or(ExchangeError::NoActiveOrder)?;
        self.registry.remove(caller, ticker);
        info!(caller, ticker, order_id, "order cancelled");
        Ok(order)
    }

    // ============================================================
    // QUERIES (read-only)
    // ============================================================

    /// Full ordered book side for an asset, most-priority-first
    pub fn order_book(&self, ticker: &str, side: Side) -> Vec<Order> {
        self.books
            .get(ticker)
            .map(|book| book.side_orders(side).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The caller's active limit order on this asset
    pub fn my_order(&self, caller: AccountId, ticker: &str) -> Result<Order, ExchangeError> {
        let order_id = self
            .registry
            .get(caller, ticker)
            .ok_or(ExchangeError::NoActiveOrder)?;
        self.books
            .get(ticker)
            .and_then(|book| book.get_order(order_id))
            .cloned()
            .ok_or(ExchangeError::NoActiveOrder)
    }

    /// Spendable balance: raw balance minus the caller's own open-order
    /// reservations. Recomputed from the live books on every call.
    pub fn spending_balance(&self, caller: AccountId, ticker: &str) -> Amount {
        self.spendable(caller, ticker, None)
    }

    /// Raw ledger balance
    pub fn balance(&self, account: AccountId, ticker: &str) -> Amount {
        self.ledger.balance(account, ticker)
    }

    // ============================================================
    // INTERNALS
    // ============================================================

    fn take_order_id(&mut self) -> OrderId {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }

    /// Spendable balance with an optional order excluded from the
    /// reservation sum (used when changing that order).
    ///
    /// Native currency is reserved against every open BUY order across
    /// all assets (`remaining × price`); a token is reserved against the
    /// open SELL order in that asset (`remaining`).
    fn spendable(&self, account: AccountId, ticker: &str, exclude: Option<OrderId>) -> Amount {
        let raw = self.ledger.balance(account, ticker);

        let mut reserved: u128 = 0;
        for (order_ticker, order_id) in self.registry.orders_of(account) {
            if Some(order_id) == exclude {
                continue;
            }
            let Some(order) = self
                .books
                .get(order_ticker)
                .and_then(|book| book.get_order(order_id))
            else {
                continue;
            };
            let reserves_this_pool = match order.side {
                Side::Buy => ticker == NATIVE_TICKER,
                Side::Sell => order_ticker == ticker,
            };
            if reserves_this_pool {
                // Rested orders passed the cover check at placement, so
                // the reserve fits u64; treat overflow as fully reserved.
                reserved += order.required_reserve().unwrap_or(Amount::MAX) as u128;
            }
        }

        (raw as u128).saturating_sub(reserved) as Amount
    }

    /// Validate that the owner's spendable balance covers a limit order
    fn check_limit_cover(
        &self,
        order: &Order,
        exclude: Option<OrderId>,
    ) -> Result<(), ExchangeError> {
        let required = order.required_reserve()?;
        let pool = match order.side {
            Side::Buy => NATIVE_TICKER,
            Side::Sell => order.ticker.as_str(),
        };
        if self.spendable(order.owner, pool, exclude) < required {
            return Err(ExchangeError::InsufficientSpendableBalance);
        }
        Ok(())
    }

    /// Match a validated limit order and rest any remainder
    fn run_and_rest(&mut self, mut order: Order) -> Result<Order, ExchangeError> {
        let ticker = order.ticker.clone();
        let book = self.books.entry(ticker.clone()).or_default();
        let trades =
            MatchingEngine::execute(book, &mut self.ledger, &mut self.registry, &mut order)?;
        Self::log_trades(&ticker, &trades);

        if !order.is_filled() {
            self.registry.insert(order.owner, &ticker, order.id);
            book.rest_order(order.clone());
        }
        info!(
            owner = order.owner,
            ticker = %ticker,
            side = ?order.side,
            amount = order.amount,
            price = order.price,
            filled = order.filled,
            "limit order placed"
        );
        Ok(order)
    }

    fn log_trades(ticker: &str, trades: &[Trade]) {
        for trade in trades {
            info!(
                ticker,
                buyer = trade.buyer,
                seller = trade.seller,
                price = trade.price,
                qty = trade.qty,
                taker = trade.taker_order_id,
                maker = trade.maker_order_id,
                "trade"
            );
        }
    }
}
