//! AssetRegistry - ticker to custody-handle mapping
//!
//! Registration is append-only: a ticker maps to exactly one custody
//! handle forever, and re-registering an existing ticker fails. The
//! native currency is known without registration.

use rustc_hash::FxHashMap;

use crate::core_types::NATIVE_TICKER;
use crate::errors::ExchangeError;

#[derive(Debug, Clone)]
pub struct AssetInfo {
    pub ticker: String,
    /// Opaque custody handle (original: the token's contract address)
    pub handle: String,
}

/// Registered tokens, keyed by ticker
#[derive(Debug, Default)]
pub struct AssetRegistry {
    assets: FxHashMap<String, AssetInfo>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token ticker with its custody handle.
    ///
    /// # Errors
    /// `AlreadyRegistered` for a duplicate ticker (the native ticker
    /// counts as taken).
    pub fn register(&mut self, ticker: &str, handle: &str) -> Result<(), ExchangeError> {
        if ticker == NATIVE_TICKER || self.assets.contains_key(ticker) {
            return Err(ExchangeError::AlreadyRegistered(ticker.to_string()));
        }
        self.assets.insert(
            ticker.to_string(),
            AssetInfo {
                ticker: ticker.to_string(),
                handle: handle.to_string(),
            },
        );
        Ok(())
    }

    /// Whether operations may reference this ticker
    #[inline]
    pub fn is_known(&self, ticker: &str) -> bool {
        ticker == NATIVE_TICKER || self.assets.contains_key(ticker)
    }

    /// Lookup a registered token (None for the native currency)
    pub fn get(&self, ticker: &str) -> Option<&AssetInfo> {
        self.assets.get(ticker)
    }

    /// Fail unless the ticker is known
    pub fn ensure_known(&self, ticker: &str) -> Result<(), ExchangeError> {
        if self.is_known(ticker) {
            Ok(())
        } else {
            Err(ExchangeError::AssetNotRegistered(ticker.to_string()))
        }
    }
}
