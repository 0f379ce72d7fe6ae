//! CoinGecko Market Data Client
//!
//! Live implementation of [`MarketDataProvider`] over the CoinGecko
//! public REST API. Symbol-to-id resolution is cached behind an async
//! read/write lock and seeded lazily from the `/coins/markets` listing.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::MarketDataProvider;
use crate::error::{AdvisorError, Result};
use crate::model::{AssetSnapshot, PriceObservation};

/// CoinGecko client configuration
#[derive(Clone, Debug)]
pub struct CoinGeckoConfig {
    /// API base URL
    pub base_url: String,

    /// Optional demo/pro API key
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Universe size requested from `/coins/markets`
    pub universe_size: u32,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".into(),
            api_key: None,
            timeout_secs: 15,
            universe_size: 25,
        }
    }
}

impl CoinGeckoConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("COINGECKO_BASE_URL")
            .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".into());
        let api_key = std::env::var("COINGECKO_API_KEY").ok();

        Self {
            base_url,
            api_key,
            ..Default::default()
        }
    }
}

/// Row shape of `/coins/markets`.
#[derive(Debug, Deserialize)]
struct MarketRow {
    id: String,
    symbol: String,
    name: String,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    market_cap_rank: Option<u32>,
}

/// Body shape of `/coins/{id}/market_chart`: `[timestamp_ms, value]`
/// pairs per series.
#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<[f64; 2]>,
    #[serde(default)]
    total_volumes: Vec<[f64; 2]>,
    #[serde(default)]
    market_caps: Vec<[f64; 2]>,
}

/// CoinGecko-backed market data provider
pub struct CoinGeckoClient {
    client: reqwest::Client,
    config: CoinGeckoConfig,
    /// SYMBOL (uppercase) -> CoinGecko id
    id_cache: RwLock<HashMap<String, String>>,
}

impl CoinGeckoClient {
    pub fn new(config: CoinGeckoConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("portfolio-advisor/0.1")
            .build()?;

        Ok(Self {
            client,
            config,
            id_cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(CoinGeckoConfig::from_env())
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.get(format!("{}{path}", self.config.base_url));
        if let Some(key) = &self.config.api_key {
            builder = builder.header("x-cg-demo-api-key", key);
        }
        builder
    }

    async fn fetch_markets(&self) -> Result<Vec<MarketRow>> {
        let response = self
            .request("/coins/markets")
            .query(&[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", &self.config.universe_size.to_string()),
                ("page", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdvisorError::Provider(format!(
                "coingecko /coins/markets returned {}",
                response.status()
            )));
        }

        let rows: Vec<MarketRow> = response.json().await?;

        // Refresh the id cache as a side effect of listing the market.
        let mut cache = self.id_cache.write().await;
        for row in &rows {
            cache.insert(row.symbol.to_uppercase(), row.id.clone());
        }

        Ok(rows)
    }

    /// Resolve a ticker symbol to a CoinGecko id, filling the cache from
    /// the markets listing on a miss.
    async fn resolve_id(&self, symbol: &str) -> Result<String> {
        let upper = symbol.to_uppercase();
        if let Some(id) = self.id_cache.read().await.get(&upper) {
            return Ok(id.clone());
        }

        self.fetch_markets().await?;
        self.id_cache
            .read()
            .await
            .get(&upper)
            .cloned()
            .ok_or_else(|| AdvisorError::UnsupportedAsset(symbol.to_string()))
    }

    fn to_snapshot(row: &MarketRow) -> AssetSnapshot {
        let mut snapshot =
            AssetSnapshot::new(&row.symbol, &row.name, row.current_price.unwrap_or(0.0));
        snapshot.market_cap = row.market_cap.unwrap_or(0.0);
        snapshot.volume_24h = row.total_volume.unwrap_or(0.0);
        snapshot.market_cap_rank = row.market_cap_rank.unwrap_or(999);
        snapshot
    }
}

fn observation_timestamp(millis: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis as i64).unwrap_or_else(Utc::now)
}

#[async_trait]
impl MarketDataProvider for CoinGeckoClient {
    async fn price_history(&self, symbol: &str, days: u32) -> Result<Vec<PriceObservation>> {
        let id = self.resolve_id(symbol).await?;
        let response = self
            .request(&format!("/coins/{id}/market_chart"))
            .query(&[
                ("vs_currency", "usd"),
                ("days", &days.to_string()),
                ("interval", "daily"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdvisorError::Provider(format!(
                "coingecko market_chart for {symbol} returned {}",
                response.status()
            )));
        }

        let chart: MarketChart = response.json().await?;
        let history = chart
            .prices
            .iter()
            .enumerate()
            .map(|(i, [millis, close])| PriceObservation {
                timestamp: observation_timestamp(*millis),
                close: *close,
                volume: chart.total_volumes.get(i).map(|[_, v]| *v),
                market_cap: chart.market_caps.get(i).map(|[_, c]| *c),
            })
            .collect();

        Ok(history)
    }

    async fn snapshot(&self, symbol: &str) -> Result<AssetSnapshot> {
        let upper = symbol.to_uppercase();
        let rows = self.fetch_markets().await?;
        rows.iter()
            .find(|row| row.symbol.eq_ignore_ascii_case(&upper))
            .map(Self::to_snapshot)
            .ok_or_else(|| AdvisorError::UnsupportedAsset(symbol.to_string()))
    }

    async fn universe(&self) -> Result<Vec<AssetSnapshot>> {
        let rows = self.fetch_markets().await?;
        Ok(rows.iter().map(Self::to_snapshot).collect())
    }

    async fn health_check(&self) -> bool {
        match self.request("/ping").send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                tracing::warn!(%error, "coingecko ping failed");
                false
            }
        }
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}
