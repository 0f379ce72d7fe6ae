//! Market Data Integration
//!
//! Abstractions and implementations for market data backends.

mod coingecko;
mod mock;

pub use coingecko::{CoinGeckoClient, CoinGeckoConfig};
pub use mock::MockMarketData;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{AssetSnapshot, PriceObservation};

/// Market data provider trait (Strategy pattern)
///
/// Implement this for each backend: CoinGecko, an exchange feed, a
/// replay file, etc.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily closing-price history for a symbol, oldest first.
    async fn price_history(&self, symbol: &str, days: u32) -> Result<Vec<PriceObservation>>;

    /// Current market snapshot for a symbol.
    async fn snapshot(&self, symbol: &str) -> Result<AssetSnapshot>;

    /// The tradable universe, ranked by market cap.
    async fn universe(&self) -> Result<Vec<AssetSnapshot>>;

    /// Check if the backend is reachable.
    async fn health_check(&self) -> bool;

    /// Provider name
    fn name(&self) -> &str;
}
