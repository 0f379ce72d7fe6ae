//! Mock Market Data
//!
//! For testing and demo purposes. Serves a static coin table and
//! deterministic synthetic price histories, so metric and allocation
//! results are reproducible run to run.

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::MarketDataProvider;
use crate::error::{AdvisorError, Result};
use crate::model::{AssetSnapshot, PriceObservation};

/// Base facts for one mock coin.
struct CoinRow {
    symbol: &'static str,
    name: &'static str,
    price: f64,
    market_cap: f64,
    volume_24h: f64,
    rank: u32,
    /// Daily drift in percent, shaping the synthetic trend
    drift: f64,
    /// Daily oscillation amplitude in percent
    swing: f64,
}

// Rows stay sorted by market cap, largest first; rank mirrors position.
const COINS: &[CoinRow] = &[
    CoinRow { symbol: "BTC", name: "Bitcoin", price: 97_500.0, market_cap: 1.9e12, volume_24h: 2.5e10, rank: 1, drift: 0.15, swing: 2.0 },
    CoinRow { symbol: "ETH", name: "Ethereum", price: 3_450.0, market_cap: 4.2e11, volume_24h: 1.5e10, rank: 2, drift: 0.10, swing: 2.5 },
    CoinRow { symbol: "USDT", name: "Tether", price: 1.0, market_cap: 1.4e11, volume_24h: 6.0e10, rank: 3, drift: 0.0, swing: 0.02 },
    CoinRow { symbol: "XRP", name: "Ripple", price: 2.35, market_cap: 1.3e11, volume_24h: 4.0e9, rank: 4, drift: 0.05, swing: 3.5 },
    CoinRow { symbol: "SOL", name: "Solana", price: 195.0, market_cap: 9.5e10, volume_24h: 3.0e9, rank: 5, drift: 0.25, swing: 4.0 },
    CoinRow { symbol: "DOGE", name: "Dogecoin", price: 0.38, market_cap: 5.6e10, volume_24h: 2.5e9, rank: 6, drift: 0.30, swing: 8.0 },
    CoinRow { symbol: "USDC", name: "USD Coin", price: 1.0, market_cap: 5.5e10, volume_24h: 8.0e9, rank: 7, drift: 0.0, swing: 0.02 },
    CoinRow { symbol: "ADA", name: "Cardano", price: 0.95, market_cap: 3.4e10, volume_24h: 1.0e9, rank: 8, drift: -0.05, swing: 3.0 },
    CoinRow { symbol: "AVAX", name: "Avalanche", price: 42.0, market_cap: 1.7e10, volume_24h: 6.0e8, rank: 9, drift: 0.12, swing: 4.5 },
    CoinRow { symbol: "LINK", name: "Chainlink", price: 24.50, market_cap: 1.5e10, volume_24h: 8.0e8, rank: 10, drift: 0.18, swing: 3.5 },
    CoinRow { symbol: "DOT", name: "Polkadot", price: 7.20, market_cap: 1.1e10, volume_24h: 3.0e8, rank: 11, drift: 0.02, swing: 3.0 },
    CoinRow { symbol: "MATIC", name: "Polygon", price: 0.52, market_cap: 5.0e9, volume_24h: 4.0e8, rank: 12, drift: -0.10, swing: 4.0 },
    CoinRow { symbol: "ATOM", name: "Cosmos", price: 9.80, market_cap: 3.8e9, volume_24h: 2.0e8, rank: 13, drift: 0.04, swing: 3.0 },
];

/// Deterministic mock market data provider.
#[derive(Clone, Debug, Default)]
pub struct MockMarketData;

impl MockMarketData {
    pub fn new() -> Self {
        Self
    }

    fn coin(symbol: &str) -> Result<&'static CoinRow> {
        let upper = symbol.to_uppercase();
        COINS
            .iter()
            .find(|c| c.symbol == upper)
            .ok_or_else(|| AdvisorError::UnsupportedAsset(symbol.to_string()))
    }

    fn to_snapshot(coin: &CoinRow) -> AssetSnapshot {
        let mut snapshot = AssetSnapshot::new(coin.symbol, coin.name, coin.price);
        snapshot.market_cap = coin.market_cap;
        snapshot.volume_24h = coin.volume_24h;
        snapshot.market_cap_rank = coin.rank;
        snapshot
    }
}

/// Linear congruential step, numerical-recipes constants. Deterministic
/// per seed, good enough to shape a synthetic price path.
fn lcg_next(state: &mut u64) -> f64 {
    *state = state
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1_442_695_040_888_963_407);
    (*state >> 33) as f64 / f64::from(u32::MAX) * 2.0
}

fn symbol_seed(symbol: &str) -> u64 {
    symbol
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
            (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        })
}

/// Synthetic daily closes ending at the coin's current price: a drifted
/// oscillation walked backwards from today so the series is stable for a
/// given symbol and length.
fn synthetic_history(coin: &CoinRow, days: u32) -> Vec<PriceObservation> {
    let days = days.max(1) as i64;
    let mut state = symbol_seed(coin.symbol);
    let now = Utc::now();

    let mut price = coin.price;
    let mut reversed = Vec::with_capacity(days as usize);
    for offset in 0..days {
        let noise = (lcg_next(&mut state) - 1.0) * coin.swing / 100.0;
        reversed.push(PriceObservation {
            timestamp: now - Duration::days(offset),
            close: price,
            volume: Some(coin.volume_24h * (1.0 + noise)),
            market_cap: Some(coin.market_cap),
        });
        // Step back one day: undo drift, apply noise
        price /= 1.0 + coin.drift / 100.0 + noise;
    }

    reversed.reverse();
    reversed
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    async fn price_history(&self, symbol: &str, days: u32) -> Result<Vec<PriceObservation>> {
        let coin = Self::coin(symbol)?;
        Ok(synthetic_history(coin, days))
    }

    async fn snapshot(&self, symbol: &str) -> Result<AssetSnapshot> {
        Ok(Self::to_snapshot(Self::coin(symbol)?))
    }

    async fn universe(&self) -> Result<Vec<AssetSnapshot>> {
        Ok(COINS.iter().map(Self::to_snapshot).collect())
    }

    async fn health_check(&self) -> bool {
        true // Mock always healthy
    }

    fn name(&self) -> &str {
        "MockMarketData"
    }
}
