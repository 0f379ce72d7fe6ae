//! Advisor Orchestration
//!
//! Ties the pipeline together: pull the universe from the market data
//! provider, compute metrics concurrently, filter and rank candidates
//! for the investor profile, score them and hand the result to the
//! allocator. Per-asset failures are logged and skipped; the run only
//! fails when nothing at all survives.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AdvisorError, Result};
use crate::market::MarketDataProvider;
use crate::metrics::MetricsEngine;
use crate::model::{
    AssetMetrics, InvestmentHorizon, MarketSentiment, PortfolioRecommendation, RiskLevel,
    RiskTolerance, UserProfile,
};
use crate::allocator::PortfolioAllocator;
use crate::scoring;

/// Days of daily history requested per asset. Covers the long
/// moving-average window with headroom for smoothing warm-up.
pub const HISTORY_DAYS: u32 = 60;

/// At most this many candidates enter the optimizer.
pub const MAX_CANDIDATES: usize = 20;

/// Aggregate view of the analyzed market.
#[derive(Clone, Debug, Serialize)]
pub struct MarketOverview {
    pub generated_at: DateTime<Utc>,

    /// Name of the data provider backing this overview
    pub provider: String,

    /// Per-asset metrics, provider universe order
    pub assets: Vec<AssetMetrics>,

    pub bullish: usize,
    pub bearish: usize,
    pub neutral: usize,
}

/// Portfolio advisor over a pluggable market data provider.
pub struct Advisor {
    provider: Arc<dyn MarketDataProvider>,
    engine: MetricsEngine,
    allocator: PortfolioAllocator,
}

impl Advisor {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            engine: MetricsEngine::new(),
            allocator: PortfolioAllocator::new(),
        }
    }

    /// Full recommendation run for one investor profile.
    pub async fn recommend(&self, profile: &UserProfile) -> Result<PortfolioRecommendation> {
        let metrics = self.analyze_universe().await?;
        let relevant = relevant_candidates(metrics, profile);
        if relevant.is_empty() {
            return Err(AdvisorError::EmptyCandidateSet);
        }

        tracing::info!(
            candidates = relevant.len(),
            tolerance = %profile.risk_tolerance,
            horizon = %profile.investment_horizon,
            "scoring candidates"
        );

        let candidates: Vec<_> = relevant
            .iter()
            .map(|m| scoring::score(m, profile))
            .collect();
        self.allocator.allocate(&candidates, profile)
    }

    /// Metrics for a single asset.
    pub async fn asset_metrics(&self, symbol: &str) -> Result<AssetMetrics> {
        let snapshot = self.provider.snapshot(symbol).await?;
        let history = self
            .provider
            .price_history(&snapshot.symbol, HISTORY_DAYS)
            .await?;
        self.engine.compute(&snapshot, &history)
    }

    /// Metrics for the whole universe plus sentiment tallies.
    pub async fn market_overview(&self) -> Result<MarketOverview> {
        let assets = self.analyze_universe().await?;
        let tally = |s: MarketSentiment| assets.iter().filter(|m| m.market_sentiment == s).count();

        Ok(MarketOverview {
            generated_at: Utc::now(),
            provider: self.provider.name().to_string(),
            bullish: tally(MarketSentiment::Bullish),
            bearish: tally(MarketSentiment::Bearish),
            neutral: tally(MarketSentiment::Neutral),
            assets,
        })
    }

    pub async fn health_check(&self) -> bool {
        self.provider.health_check().await
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Compute metrics for every asset in the universe, concurrently.
    /// Assets that fail (thin history, provider hiccup) are skipped.
    async fn analyze_universe(&self) -> Result<Vec<AssetMetrics>> {
        let universe = self.provider.universe().await?;
        if universe.is_empty() {
            return Err(AdvisorError::Provider("provider returned an empty universe".into()));
        }

        let tasks = universe.iter().map(|snapshot| async move {
            let history = self
                .provider
                .price_history(&snapshot.symbol, HISTORY_DAYS)
                .await?;
            self.engine.compute(snapshot, &history)
        });

        let mut metrics = Vec::with_capacity(universe.len());
        for (snapshot, result) in universe.iter().zip(futures::future::join_all(tasks).await) {
            match result {
                Ok(m) => metrics.push(m),
                Err(error) => {
                    tracing::warn!(symbol = %snapshot.symbol, %error, "skipping asset");
                }
            }
        }
        Ok(metrics)
    }
}

/// Filter the analyzed assets down to what fits the profile and rank
/// them for the horizon, keeping at most [`MAX_CANDIDATES`].
///
/// Conservative investors only see low/medium risk assets with solid
/// stability; moderate and aggressive investors see the whole field.
fn relevant_candidates(mut metrics: Vec<AssetMetrics>, profile: &UserProfile) -> Vec<AssetMetrics> {
    if profile.risk_tolerance == RiskTolerance::Conservative {
        metrics.retain(|m| {
            matches!(m.risk_level, RiskLevel::Low | RiskLevel::Medium) && m.stability_score >= 60.0
        });
    }

    let key = |m: &AssetMetrics| match profile.investment_horizon {
        InvestmentHorizon::Short => m.growth_potential,
        InvestmentHorizon::Long => m.stability_score,
        InvestmentHorizon::Medium => (m.growth_potential + m.stability_score) / 2.0,
    };
    metrics.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(std::cmp::Ordering::Equal));
    metrics.truncate(MAX_CANDIDATES);
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MockMarketData;

    fn advisor() -> Advisor {
        Advisor::new(Arc::new(MockMarketData::new()))
    }

    #[tokio::test]
    async fn test_recommend_default_profile() {
        let recommendation = advisor().recommend(&UserProfile::default()).await.unwrap();

        assert!(!recommendation.assets.is_empty());
        assert!(recommendation.assets.len() <= 4);
        let total: f64 = recommendation.assets.iter().map(|a| a.weight).sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(!recommendation.rationale.is_empty());
    }

    #[tokio::test]
    async fn test_conservative_recommendation_respects_ceiling() {
        let profile = UserProfile {
            risk_tolerance: RiskTolerance::Conservative,
            ..UserProfile::default()
        };
        let recommendation = advisor().recommend(&profile).await.unwrap();
        assert!(recommendation.risk_score <= 30.0 + 1e-6);
    }

    #[tokio::test]
    async fn test_asset_metrics_for_known_symbol() {
        let metrics = advisor().asset_metrics("BTC").await.unwrap();
        assert_eq!(metrics.symbol, "BTC");
        assert!((0.0..=100.0).contains(&metrics.rsi));
        assert!(metrics.current_price > 0.0);
    }

    #[tokio::test]
    async fn test_asset_metrics_unknown_symbol() {
        let result = advisor().asset_metrics("NOTREAL").await;
        assert!(matches!(result, Err(AdvisorError::UnsupportedAsset(_))));
    }

    #[tokio::test]
    async fn test_market_overview_tallies_sentiment() {
        let overview = advisor().market_overview().await.unwrap();
        assert!(!overview.assets.is_empty());
        assert_eq!(
            overview.bullish + overview.bearish + overview.neutral,
            overview.assets.len()
        );
        assert_eq!(overview.provider, "MockMarketData");
    }

    #[test]
    fn test_conservative_filter_drops_high_risk() {
        let mut risky = sample_metrics("XXX");
        risky.risk_level = RiskLevel::High;
        let mut unstable = sample_metrics("YYY");
        unstable.stability_score = 40.0;
        let safe = sample_metrics("ZZZ");

        let profile = UserProfile {
            risk_tolerance: RiskTolerance::Conservative,
            ..UserProfile::default()
        };
        let relevant = relevant_candidates(vec![risky, unstable, safe], &profile);
        assert_eq!(relevant.len(), 1);
        assert_eq!(relevant[0].symbol, "ZZZ");
    }

    #[test]
    fn test_horizon_ordering() {
        let mut growth = sample_metrics("GGG");
        growth.growth_potential = 90.0;
        growth.stability_score = 40.0;
        let mut stable = sample_metrics("SSS");
        stable.growth_potential = 40.0;
        stable.stability_score = 90.0;

        let short = UserProfile {
            investment_horizon: InvestmentHorizon::Short,
            risk_tolerance: RiskTolerance::Aggressive,
            ..UserProfile::default()
        };
        let long = UserProfile {
            investment_horizon: InvestmentHorizon::Long,
            risk_tolerance: RiskTolerance::Aggressive,
            ..UserProfile::default()
        };

        let by_growth = relevant_candidates(vec![stable.clone(), growth.clone()], &short);
        assert_eq!(by_growth[0].symbol, "GGG");

        let by_stability = relevant_candidates(vec![growth, stable], &long);
        assert_eq!(by_stability[0].symbol, "SSS");
    }

    fn sample_metrics(symbol: &str) -> AssetMetrics {
        AssetMetrics {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            current_price: 10.0,
            market_cap: 1e9,
            price_change_24h: 0.5,
            price_change_7d: 1.0,
            price_change_30d: 2.0,
            volume_24h: 1e7,
            expected_return: 0.3,
            volatility: 3.0,
            rsi: 50.0,
            ma_short: 10.0,
            ma_long: 10.0,
            investment_score: 60.0,
            risk_score: 15.0,
            risk_level: RiskLevel::Low,
            liquidity_ratio: 1.0,
            market_sentiment: MarketSentiment::Neutral,
            stability_score: 80.0,
            growth_potential: 60.0,
        }
    }
}
