//! Core types used throughout the system
//!
//! Fundamental type aliases shared by all modules. They provide semantic
//! meaning and enable future type evolution.

/// Account ID - opaque identity for an exchange account.
///
/// No explicit account table exists; an account springs into existence on
/// its first balance mutation.
pub type AccountId = u64;

/// Order ID - unique within the whole exchange (not per asset).
///
/// Assigned from a single monotonically increasing counter at order
/// creation and never reused.
pub type OrderId = u64;

/// Quantity of an asset, in the asset's smallest unit.
pub type Amount = u64;

/// Price - native-currency units per unit of asset.
pub type Price = u64;

/// Ticker of the native currency. Always known to the exchange; every
/// other ticker must be registered before use.
pub const NATIVE_TICKER: &str = "ETH";
