//! spotdex - spot exchange core
//!
//! An exchange core where accounts deposit a native currency and
//! registered tokens, place limit and market orders against per-token
//! order books, and matching orders settle by moving ledger balances
//! between accounts.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (AccountId, OrderId, etc.)
//! - [`errors`] - The exchange error surface
//! - [`models`] - Order and Trade types
//! - [`ledger`] - Balance ledger: (account, asset) -> quantity
//! - [`asset_registry`] - Ticker registration (append-only)
//! - [`orderbook`] - BTreeMap-based price-time priority book
//! - [`order_registry`] - One active limit order per (account, asset)
//! - [`engine`] - Matching and settlement logic
//! - [`exchange`] - The public facade composing everything above
//! - [`custody`] - External custody boundary for deposits/withdrawals
//! - [`config`] / [`logging`] - App configuration and tracing setup

pub mod asset_registry;
pub mod config;
pub mod core_types;
pub mod custody;
pub mod engine;
pub mod errors;
pub mod exchange;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod order_registry;
pub mod orderbook;

// Convenient re-exports at crate root
pub use asset_registry::{AssetInfo, AssetRegistry};
pub use core_types::{AccountId, Amount, NATIVE_TICKER, OrderId, Price};
pub use custody::{CustodyAdapter, CustodyError, MockCustody};
pub use engine::MatchingEngine;
pub use errors::ExchangeError;
pub use exchange::Exchange;
pub use ledger::BalanceLedger;
pub use models::{Order, OrderKind, Side, Trade};
pub use order_registry::OrderRegistry;
pub use orderbook::OrderBook;
