//! MatchingEngine - order crossing and trade settlement
//!
//! The engine handles:
//! 1. Matching an incoming (taker) order against the opposite book side
//! 2. Settling every fill through the balance ledger
//! 3. Pruning fully filled resting orders from book and order registry
//!
//! # Flow:
//! The taker crosses the opposite side in price-time priority. Each step
//! trades `min(taker remaining, maker remaining)` at the MAKER's price
//! (price-maker convention: the resting order sets the trade price).
//! A limit taker stops as soon as the best resting price violates its
//! bound; a market taker crosses at any price and its unmatched remainder
//! is discarded by the facade, never rested.
//!
//! Balance sufficiency for the taker is validated by the facade before
//! matching begins. The one exception is a market BUY, which carries no
//! upfront reservation: each step is additionally bounded by what the
//! buyer's live native balance affords at the maker's price, so the loop
//! stops early instead of overspending.
//!
//! Makers are re-checked at settlement time. Reservations are advisory
//! (a raw-balance withdrawal or a market buy elsewhere can consume a
//! maker's backing after it rested), so each step settles only what the
//! maker's live balance still backs and evicts a maker that cannot cover
//! the step in full. Settlement therefore never fails mid-loop and a
//! completed call always reflects every trade it reports.

use tracing::debug;

use crate::core_types::{Amount, NATIVE_TICKER, Price};
use crate::errors::ExchangeError;
use crate::ledger::BalanceLedger;
use crate::models::{Order, OrderKind, Side, Trade};
use crate::order_registry::OrderRegistry;
use crate::orderbook::OrderBook;

pub struct MatchingEngine;

impl MatchingEngine {
    /// Cross `taker` against the opposite side of `book`, settling every
    /// fill in `ledger` and clearing filled makers from `registry`.
    ///
    /// Mutates `taker.filled`; returns the trades in execution order.
    /// Resting any remainder is the caller's decision.
    pub fn execute(
        book: &mut OrderBook,
        ledger: &mut BalanceLedger,
        registry: &mut OrderRegistry,
        taker: &mut Order,
    ) -> Result<Vec<Trade>, ExchangeError> {
        match taker.side {
            Side::Buy => Self::match_buy(book, ledger, registry, taker),
            Side::Sell => Self::match_sell(book, ledger, registry, taker),
        }
    }

    /// Match a buy taker against asks, lowest price first
    fn match_buy(
        book: &mut OrderBook,
        ledger: &mut BalanceLedger,
        registry: &mut OrderRegistry,
        taker: &mut Order,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let mut trades = Vec::new();
        let mut removed_maker_ids = Vec::new();
        let mut prices_to_remove = Vec::new();

        // Snapshot the sorted prices first to avoid borrow issues
        let prices: Vec<Price> = book.asks_mut().keys().copied().collect();

        'levels: for price in prices {
            // Buy taker can match asks at or below its price bound
            if price > taker.price {
                break;
            }
            if taker.is_filled() {
                break;
            }

            if let Some(level) = book.asks_mut().get_mut(&price) {
                while let Some(maker) = level.front_mut() {
                    if taker.is_filled() {
                        break;
                    }

                    let mut qty = taker.remaining().min(maker.remaining());

                    // Market buys have no reservation: bound each step by
                    // what the live native balance affords at this price.
                    // A zero-priced ask costs nothing, so no bound applies.
                    if taker.kind == OrderKind::Market && price > 0 {
                        let affordable = ledger.balance(taker.owner, NATIVE_TICKER) / price;
                        qty = qty.min(affordable);
                        if qty == 0 {
                            // Deeper levels only cost more
                            break 'levels;
                        }
                    }

                    // A maker whose tokens left the ledger after resting
                    // cannot deliver the full step: settle what its live
                    // balance still backs, then evict it.
                    let backing = ledger.balance(maker.owner, &taker.ticker);
                    let under_backed = backing < qty;
                    qty = qty.min(backing);

                    if qty > 0 {
                        Self::settle(ledger, taker.owner, maker.owner, &taker.ticker, qty, price)?;

                        taker.filled += qty;
                        maker.filled += qty;

                        trades.push(Trade {
                            taker_order_id: taker.id,
                            maker_order_id: maker.id,
                            buyer: taker.owner,
                            seller: maker.owner,
                            price,
                            qty,
                        });
                    }

                    if under_backed || maker.is_filled() {
                        registry.remove(maker.owner, &maker.ticker);
                        removed_maker_ids.push(maker.id);
                        level.pop_front();
                    }
                }

                if level.is_empty() {
                    prices_to_remove.push(price);
                }
            }
        }

        for id in removed_maker_ids {
            book.remove_from_index(id);
        }
        for price in prices_to_remove {
            book.asks_mut().remove(&price);
        }

        Ok(trades)
    }

    /// Match a sell taker against bids, highest price first
    fn match_sell(
        book: &mut OrderBook,
        ledger: &mut BalanceLedger,
        registry: &mut OrderRegistry,
        taker: &mut Order,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let mut trades = Vec::new();
        let mut removed_maker_ids = Vec::new();
        let mut keys_to_remove = Vec::new();

        // Bid levels are keyed as (u64::MAX - price), best first
        let keys: Vec<Price> = book.bids_mut().keys().copied().collect();

        for key in keys {
            let bid_price = u64::MAX - key;

            // Sell taker can match bids at or above its price bound
            if bid_price < taker.price {
                break;
            }
            if taker.is_filled() {
                break;
            }

            if let Some(level) = book.bids_mut().get_mut(&key) {
                while let Some(maker) = level.front_mut() {
                    if taker.is_filled() {
                        break;
                    }

                    let mut qty = taker.remaining().min(maker.remaining());

                    // A bid maker whose native left the ledger after
                    // resting cannot pay the full step: settle what its
                    // live balance still affords, then evict it.
                    let backed = if bid_price == 0 {
                        qty
                    } else {
                        ledger.balance(maker.owner, NATIVE_TICKER) / bid_price
                    };
                    let under_backed = backed < qty;
                    qty = qty.min(backed);

                    if qty > 0 {
                        Self::settle(
                            ledger,
                            maker.owner,
                            taker.owner,
                            &taker.ticker,
                            qty,
                            bid_price,
                        )?;

                        taker.filled += qty;
                        maker.filled += qty;

                        trades.push(Trade {
                            taker_order_id: taker.id,
                            maker_order_id: maker.id,
                            buyer: maker.owner,
                            seller: taker.owner,
                            price: bid_price,
                            qty,
                        });
                    }

                    if under_backed || maker.is_filled() {
                        registry.remove(maker.owner, &maker.ticker);
                        removed_maker_ids.push(maker.id);
                        level.pop_front();
                    }
                }

                if level.is_empty() {
                    keys_to_remove.push(key);
                }
            }
        }

        for id in removed_maker_ids {
            book.remove_from_index(id);
        }
        for key in keys_to_remove {
            book.bids_mut().remove(&key);
        }

        Ok(trades)
    }

    /// Settle one fill: move `qty × price` native from buyer to seller and
    /// `qty` of the asset from seller to buyer.
    ///
    /// The four ledger moves conserve value: native debited equals native
    /// credited, asset debited equals asset credited.
    fn settle(
        ledger: &mut BalanceLedger,
        buyer: u64,
        seller: u64,
        ticker: &str,
        qty: Amount,
        price: Price,
    ) -> Result<(), ExchangeError> {
        let native = qty * price;

        ledger.debit(buyer, NATIVE_TICKER, native)?;
        ledger.credit(seller, NATIVE_TICKER, native)?;
        ledger.debit(seller, ticker, qty)?;
        ledger.credit(buyer, ticker, qty)?;

        debug!(buyer, seller, ticker, qty, price, native, "settled fill");
        Ok(())
    }
}
