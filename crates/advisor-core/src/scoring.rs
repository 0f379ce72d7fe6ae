//! Scoring Model
//!
//! Maps one [`AssetMetrics`] record plus a [`UserProfile`] into the
//! coefficients the allocator consumes: a desirability `v`, a unit cost
//! `c` and a unit risk `r`. The risk-tolerance and horizon branches are
//! small pure functions dispatched over the enum profile so each can be
//! tested in isolation.

use serde::{Deserialize, Serialize};

use crate::model::{
    AssetMetrics, InvestmentHorizon, MarketSentiment, RiskTolerance, UserProfile,
};

/// Desirability never drops below this, so the optimizer cannot exclude
/// an asset purely through a non-positive coefficient artifact.
pub const MIN_DESIRABILITY: f64 = 0.01;

/// Floor on unit cost, guarding against zero-cost degeneracy.
pub const COST_EPSILON: f64 = 1e-6;

/// Per-asset input to one optimization run. Ephemeral: recomputed every
/// run, never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AllocationCandidate {
    /// The underlying metrics record
    pub metrics: AssetMetrics,

    /// Objective coefficient `v`, strictly positive
    pub desirability: f64,

    /// Unit cost `c`: current price floored at [`COST_EPSILON`]
    pub unit_cost: f64,

    /// Unit risk `r`: the asset's risk score
    pub unit_risk: f64,
}

/// Tolerance-specific tweak: an additive term plus a sentiment multiplier.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ToleranceAdjustment {
    additive: f64,
    sentiment_multiplier: f64,
}

/// Score one asset for one investor.
///
/// `v` blends investment score, stability and expected return, then the
/// tolerance adjustment is added, the sentiment multiplier applied, and
/// the horizon bonus added on top.
pub fn score(metrics: &AssetMetrics, profile: &UserProfile) -> AllocationCandidate {
    let base = 0.4 * metrics.investment_score
        + 0.3 * metrics.stability_score
        + 0.3 * (metrics.expected_return * 10.0);

    let adjustment = tolerance_adjustment(metrics, profile.risk_tolerance);
    let mut v = (base + adjustment.additive) * adjustment.sentiment_multiplier;
    v += horizon_adjustment(metrics, profile.investment_horizon);

    AllocationCandidate {
        desirability: v.max(MIN_DESIRABILITY),
        unit_cost: metrics.current_price.max(COST_EPSILON),
        unit_risk: metrics.risk_score,
        metrics: metrics.clone(),
    }
}

fn tolerance_adjustment(metrics: &AssetMetrics, tolerance: RiskTolerance) -> ToleranceAdjustment {
    match tolerance {
        RiskTolerance::Conservative => ToleranceAdjustment {
            additive: 0.5 * metrics.stability_score - 0.8 * metrics.risk_score,
            sentiment_multiplier: match metrics.market_sentiment {
                MarketSentiment::Bearish => 0.5,
                MarketSentiment::Neutral => 1.2,
                MarketSentiment::Bullish => 1.0,
            },
        },
        RiskTolerance::Moderate => ToleranceAdjustment {
            additive: 0.8 * metrics.expected_return + 0.3 * metrics.investment_score,
            sentiment_multiplier: match metrics.market_sentiment {
                MarketSentiment::Bullish => 1.3,
                MarketSentiment::Bearish => 0.7,
                MarketSentiment::Neutral => 1.0,
            },
        },
        RiskTolerance::Aggressive => ToleranceAdjustment {
            additive: 1.5 * metrics.expected_return + 0.2 * (100.0 - metrics.risk_score),
            sentiment_multiplier: match metrics.market_sentiment {
                MarketSentiment::Bullish => 1.5,
                MarketSentiment::Bearish => 1.1,
                MarketSentiment::Neutral => 1.0,
            },
        },
    }
}

fn horizon_adjustment(metrics: &AssetMetrics, horizon: InvestmentHorizon) -> f64 {
    match horizon {
        // Short horizons want liquid positions they can exit
        InvestmentHorizon::Short => 20.0 * metrics.liquidity_ratio,
        InvestmentHorizon::Medium => 0.0,
        // Long horizons reward sheer size
        InvestmentHorizon::Long => 0.05 * (metrics.market_cap / 1e9),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiskLevel;

    fn metrics(symbol: &str) -> AssetMetrics {
        AssetMetrics {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            current_price: 100.0,
            market_cap: 2e9,
            price_change_24h: 1.0,
            price_change_7d: 3.0,
            price_change_30d: 5.0,
            volume_24h: 1e8,
            expected_return: 0.5,
            volatility: 4.0,
            rsi: 55.0,
            ma_short: 100.0,
            ma_long: 98.0,
            investment_score: 60.0,
            risk_score: 25.0,
            risk_level: RiskLevel::Low,
            liquidity_ratio: 5.0,
            market_sentiment: MarketSentiment::Neutral,
            stability_score: 80.0,
            growth_potential: 60.0,
        }
    }

    #[test]
    fn test_score_is_deterministic() {
        let m = metrics("BTC");
        let profile = UserProfile::default();
        let a = score(&m, &profile);
        let b = score(&m, &profile);
        assert_eq!(a.desirability, b.desirability);
        assert_eq!(a.unit_cost, b.unit_cost);
        assert_eq!(a.unit_risk, b.unit_risk);
    }

    #[test]
    fn test_conservative_penalizes_risk() {
        let profile = UserProfile {
            risk_tolerance: RiskTolerance::Conservative,
            ..UserProfile::default()
        };
        let safe = metrics("AAA");
        let mut risky = metrics("BBB");
        risky.risk_score = 90.0;

        let v_safe = score(&safe, &profile).desirability;
        let v_risky = score(&risky, &profile).desirability;
        assert!(v_safe > v_risky);
    }

    #[test]
    fn test_aggressive_rewards_bullish_sentiment() {
        let profile = UserProfile {
            risk_tolerance: RiskTolerance::Aggressive,
            ..UserProfile::default()
        };
        let neutral = metrics("AAA");
        let mut bullish = metrics("BBB");
        bullish.market_sentiment = MarketSentiment::Bullish;

        assert!(score(&bullish, &profile).desirability > score(&neutral, &profile).desirability);
    }

    #[test]
    fn test_horizon_adjustments() {
        let m = metrics("AAA");
        let medium = score(&m, &UserProfile::default()).desirability;

        let short_profile = UserProfile {
            investment_horizon: InvestmentHorizon::Short,
            ..UserProfile::default()
        };
        let long_profile = UserProfile {
            investment_horizon: InvestmentHorizon::Long,
            ..UserProfile::default()
        };

        // liquidity_ratio 5.0 -> +100 for short; 2e9 cap -> +0.1 for long
        assert!((score(&m, &short_profile).desirability - medium - 100.0).abs() < 1e-9);
        assert!((score(&m, &long_profile).desirability - medium - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_desirability_floor() {
        let profile = UserProfile {
            risk_tolerance: RiskTolerance::Conservative,
            ..UserProfile::default()
        };
        let mut terrible = metrics("XXX");
        terrible.investment_score = 0.0;
        terrible.stability_score = 0.0;
        terrible.expected_return = -10.0;
        terrible.risk_score = 100.0;
        terrible.market_sentiment = MarketSentiment::Bearish;

        let candidate = score(&terrible, &profile);
        assert_eq!(candidate.desirability, MIN_DESIRABILITY);
    }

    #[test]
    fn test_zero_price_cost_floor() {
        let mut m = metrics("AAA");
        m.current_price = 0.0;
        let candidate = score(&m, &UserProfile::default());
        assert_eq!(candidate.unit_cost, COST_EPSILON);
    }
}
