//! Domain Models
//!
//! Core value types for asset metrics and portfolio recommendations.
//! Statistical quantities (prices, indicator values, scores) are `f64`;
//! amounts of money that leave the system use `rust_decimal::Decimal`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Symbols treated as stable-value assets.
///
/// These collapse to a reduced risk formula in the metrics engine and are
/// capped to at most one slot per recommendation by the diversification pass.
pub const STABLECOINS: [&str; 8] = [
    "USDT", "USDC", "BUSD", "DAI", "TUSD", "USDD", "FRAX", "LUSD",
];

/// Returns true if `symbol` names a stable-value asset.
pub fn is_stablecoin(symbol: &str) -> bool {
    let upper = symbol.to_uppercase();
    STABLECOINS.contains(&upper.as_str())
}

/// A single point of an asset's price history.
///
/// Sequences are chronological with no duplicate timestamps. Only `close`
/// is required; the rest depends on what the upstream provider exposes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Observation timestamp
    pub timestamp: DateTime<Utc>,

    /// Closing price in USD
    pub close: f64,

    /// Trading volume over the observation interval
    #[serde(default)]
    pub volume: Option<f64>,

    /// Market capitalization at observation time
    #[serde(default)]
    pub market_cap: Option<f64>,
}

impl PriceObservation {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            timestamp,
            close,
            volume: None,
            market_cap: None,
        }
    }
}

/// Latest market snapshot for an asset, as reported by the data provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssetSnapshot {
    /// Ticker symbol (e.g., "BTC", "ETH")
    pub symbol: String,

    /// Full name (e.g., "Bitcoin", "Ethereum")
    pub name: String,

    /// Current price in USD
    pub current_price: f64,

    /// Market capitalization in USD
    pub market_cap: f64,

    /// 24-hour trading volume in USD
    pub volume_24h: f64,

    /// Market-cap rank (1 = largest)
    pub market_cap_rank: u32,
}

impl AssetSnapshot {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, current_price: f64) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            name: name.into(),
            current_price,
            market_cap: 0.0,
            volume_24h: 0.0,
            market_cap_rank: 999,
        }
    }
}

/// Overall market mood for an asset, derived from price, RSI and volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl MarketSentiment {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for MarketSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative risk classification of a single asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much portfolio risk the investor is willing to carry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    /// Ceiling on the weighted-average portfolio risk score (0-100 scale).
    pub const fn max_portfolio_risk(self) -> f64 {
        match self {
            Self::Conservative => 30.0,
            Self::Moderate => 60.0,
            Self::Aggressive => 90.0,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intended holding period for the investment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentHorizon {
    Short,
    #[default]
    Medium,
    Long,
}

impl InvestmentHorizon {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

impl fmt::Display for InvestmentHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An investor's profile. Missing fields default to a moderate profile
/// with a nominal budget and a medium horizon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub risk_tolerance: RiskTolerance,

    /// Total budget to allocate, in USD. Must be positive.
    #[serde(default = "default_investment_amount")]
    pub investment_amount: Decimal,

    #[serde(default)]
    pub investment_horizon: InvestmentHorizon,
}

fn default_investment_amount() -> Decimal {
    dec!(1000)
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            risk_tolerance: RiskTolerance::default(),
            investment_amount: default_investment_amount(),
            investment_horizon: InvestmentHorizon::default(),
        }
    }
}

/// Full set of quantitative indicators and derived scores for one asset.
///
/// Immutable once computed; a fresh history produces a fresh record.
/// All bounded scores are clamped to their documented ranges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetMetrics {
    /// Ticker symbol
    pub symbol: String,

    /// Full name
    pub name: String,

    /// Current price in USD
    pub current_price: f64,

    /// Market capitalization in USD
    pub market_cap: f64,

    /// Percent change over the last observation
    pub price_change_24h: f64,

    /// Percent change over the last 7 observations
    pub price_change_7d: f64,

    /// Percent change over the last 30 observations
    pub price_change_30d: f64,

    /// Latest 24h trading volume in USD
    pub volume_24h: f64,

    /// EMA-smoothed log-return, as a percent
    pub expected_return: f64,

    /// Std-dev of log-returns, as a percent
    pub volatility: f64,

    /// Relative Strength Index (0-100)
    pub rsi: f64,

    /// 7-point simple moving average
    pub ma_short: f64,

    /// 30-point simple moving average
    pub ma_long: f64,

    /// Composite attractiveness score (0-100)
    pub investment_score: f64,

    /// Composite risk score (0-100; stablecoins capped at 8)
    pub risk_score: f64,

    /// Qualitative risk classification
    pub risk_level: RiskLevel,

    /// Volume as a percent of market cap
    pub liquidity_ratio: f64,

    /// Derived market mood
    pub market_sentiment: MarketSentiment,

    /// Price-stability score (0-100, higher is steadier)
    pub stability_score: f64,

    /// Upside heuristic (0-100)
    pub growth_potential: f64,
}

impl AssetMetrics {
    /// Whether this asset is on the stable-value list.
    pub fn is_stablecoin(&self) -> bool {
        is_stablecoin(&self.symbol)
    }
}

/// One selected asset inside a recommendation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecommendedAsset {
    /// Ticker symbol
    pub symbol: String,

    /// Full name
    pub name: String,

    /// Fraction of the budget, in (0, 1]
    pub weight: f64,

    /// Weight expressed as a percentage
    pub allocation_percent: f64,

    /// Dollar amount: weight x investment amount
    pub allocation_amount: Decimal,

    /// Current price in USD
    pub current_price: f64,

    /// Risk classification of the asset
    pub risk_level: RiskLevel,
}

/// A complete portfolio recommendation.
///
/// Weights sum to 1 within floating-point tolerance. Immutable once
/// produced; persistence belongs to downstream collaborators.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortfolioRecommendation {
    /// Recommendation identifier
    pub id: Uuid,

    /// When the recommendation was produced
    pub created_at: DateTime<Utc>,

    /// Selected assets, ranked by weight
    pub assets: Vec<RecommendedAsset>,

    /// Weighted expected return, as a percent
    pub expected_return: f64,

    /// Weighted risk score (0-100)
    pub risk_score: f64,

    /// Weighted confidence level (0-100)
    pub confidence_level: f64,

    /// Human-readable explanation of the selection
    pub rationale: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults() {
        let profile = UserProfile::default();
        assert_eq!(profile.risk_tolerance, RiskTolerance::Moderate);
        assert_eq!(profile.investment_amount, dec!(1000));
        assert_eq!(profile.investment_horizon, InvestmentHorizon::Medium);
    }

    #[test]
    fn test_profile_deserializes_missing_fields() {
        let profile: UserProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile, UserProfile::default());

        let profile: UserProfile =
            serde_json::from_str(r#"{"risk_tolerance": "aggressive"}"#).unwrap();
        assert_eq!(profile.risk_tolerance, RiskTolerance::Aggressive);
        assert_eq!(profile.investment_amount, dec!(1000));
    }

    #[test]
    fn test_risk_ceiling_by_tolerance() {
        assert_eq!(RiskTolerance::Conservative.max_portfolio_risk(), 30.0);
        assert_eq!(RiskTolerance::Moderate.max_portfolio_risk(), 60.0);
        assert_eq!(RiskTolerance::Aggressive.max_portfolio_risk(), 90.0);
    }

    #[test]
    fn test_stablecoin_list() {
        assert!(is_stablecoin("USDT"));
        assert!(is_stablecoin("usdc"));
        assert!(!is_stablecoin("BTC"));
    }
}
