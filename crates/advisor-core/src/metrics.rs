//! Metrics Engine
//!
//! Turns one asset's price history plus its latest market snapshot into a
//! full [`AssetMetrics`] record. Pure and deterministic: the same inputs
//! always produce the same record, and nothing is mutated in place.
//!
//! Histories below [`MetricsEngine::MIN_HISTORY`] points yield
//! [`AdvisorError::InsufficientHistory`], never a partially-filled record.

use crate::error::{AdvisorError, Result};
use crate::indicators::{self, DEFAULT_PERIOD};
use crate::model::{is_stablecoin, AssetMetrics, AssetSnapshot, MarketSentiment, PriceObservation, RiskLevel};

/// Computes quantitative metrics for single assets.
#[derive(Clone, Debug)]
pub struct MetricsEngine {
    min_history: usize,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsEngine {
    /// Minimum number of history points required to produce metrics.
    pub const MIN_HISTORY: usize = 14;

    pub fn new() -> Self {
        Self {
            min_history: Self::MIN_HISTORY,
        }
    }

    /// Compute the full metrics record for one asset.
    ///
    /// `history` must be chronological. Volume and market-cap fields of
    /// the observations are optional; missing values simply drop out of
    /// the volume-trend and normalization calculations.
    pub fn compute(
        &self,
        snapshot: &AssetSnapshot,
        history: &[PriceObservation],
    ) -> Result<AssetMetrics> {
        if history.len() < self.min_history {
            return Err(AdvisorError::InsufficientHistory {
                symbol: snapshot.symbol.clone(),
                points: history.len(),
                required: self.min_history,
            });
        }

        let closes: Vec<f64> = history.iter().map(|o| o.close).collect();
        let volumes: Vec<f64> = history.iter().filter_map(|o| o.volume).collect();

        // Lagged percent changes; the 24h change compares the last two points.
        let price_change_24h = percent_change(&closes, 2);
        let price_change_7d = percent_change(&closes, 7);
        let price_change_30d = percent_change(&closes, 30);

        let rsi = indicators::rsi(&closes, DEFAULT_PERIOD);
        let volatility = indicators::volatility(&closes);
        let mas = indicators::moving_averages(&closes);

        let volume_trend = volume_trend(&volumes);
        let market_sentiment = market_sentiment(price_change_24h, rsi, volume_trend);
        let stability_score = stability_score(volatility, price_change_7d);
        let growth_potential =
            growth_potential(price_change_7d, price_change_30d, snapshot.market_cap_rank, rsi);
        let risk_level = risk_level(volatility, stability_score);
        let expected_return = indicators::expected_return(&closes, DEFAULT_PERIOD);

        let max_volume = volumes.iter().copied().fold(0.0_f64, f64::max);
        let max_market_cap = history
            .iter()
            .filter_map(|o| o.market_cap)
            .fold(0.0_f64, f64::max);

        let investment_score = investment_score(
            price_change_24h,
            snapshot.volume_24h,
            max_volume,
            stability_score,
            growth_potential,
        );
        let risk_score = risk_score(
            &snapshot.symbol,
            volatility,
            price_change_24h,
            snapshot.market_cap,
            max_market_cap,
            snapshot.volume_24h,
        );
        let liquidity_ratio = (snapshot.volume_24h / snapshot.market_cap.max(1.0)) * 100.0;

        tracing::debug!(
            symbol = %snapshot.symbol,
            volatility,
            rsi,
            investment_score,
            risk_score,
            "computed asset metrics"
        );

        Ok(AssetMetrics {
            symbol: snapshot.symbol.clone(),
            name: snapshot.name.clone(),
            current_price: snapshot.current_price,
            market_cap: snapshot.market_cap,
            price_change_24h,
            price_change_7d,
            price_change_30d,
            volume_24h: snapshot.volume_24h,
            expected_return,
            volatility,
            rsi,
            ma_short: mas.short,
            ma_long: mas.long,
            investment_score,
            risk_score,
            risk_level,
            liquidity_ratio,
            market_sentiment,
            stability_score,
            growth_potential,
        })
    }
}

/// Percent change of the last price against the price `lag` points from
/// the end (lag 2 = previous observation). Returns 0.0 when the series is
/// shorter than the lag or the reference price is zero.
fn percent_change(prices: &[f64], lag: usize) -> f64 {
    if prices.len() < lag || lag == 0 {
        return 0.0;
    }
    let reference = prices[prices.len() - lag];
    if reference == 0.0 {
        return 0.0;
    }
    let last = prices[prices.len() - 1];
    (last - reference) / reference * 100.0
}

/// Percent change between the last two volume observations. Returns 0.0
/// with fewer than two volumes or a zero denominator.
fn volume_trend(volumes: &[f64]) -> f64 {
    if volumes.len() < 2 {
        return 0.0;
    }
    let previous = volumes[volumes.len() - 2];
    if previous == 0.0 {
        return 0.0;
    }
    let last = volumes[volumes.len() - 1];
    (last - previous) / previous * 100.0
}

/// Signed-score sentiment: price moves weigh up to +-2, overbought and
/// oversold RSI pull against the move, strong volume shifts add +-1.
fn market_sentiment(price_change_24h: f64, rsi: f64, volume_trend: f64) -> MarketSentiment {
    let mut score = 0i32;

    if price_change_24h > 5.0 {
        score += 2;
    } else if price_change_24h > 0.0 {
        score += 1;
    } else if price_change_24h < -5.0 {
        score -= 2;
    } else if price_change_24h < 0.0 {
        score -= 1;
    }

    if rsi > 70.0 {
        score -= 1; // overbought
    } else if rsi < 30.0 {
        score += 1; // oversold
    }

    if volume_trend > 20.0 {
        score += 1;
    } else if volume_trend < -20.0 {
        score -= 1;
    }

    if score >= 2 {
        MarketSentiment::Bullish
    } else if score <= -2 {
        MarketSentiment::Bearish
    } else {
        MarketSentiment::Neutral
    }
}

/// Average of an inverted-volatility score and a 7d-swing penalty, both
/// floored at zero. Range 0-100, higher is steadier.
fn stability_score(volatility: f64, price_change_7d: f64) -> f64 {
    let volatility_score = (100.0 - volatility * 2.0).max(0.0);
    let price_stability = (100.0 - price_change_7d.abs()).max(0.0);
    (volatility_score + price_stability) / 2.0
}

/// Upside heuristic starting at 50: trend agreement, small-cap rank tiers
/// and entry-range RSI add bonuses. Clamped to 0-100.
fn growth_potential(
    price_change_7d: f64,
    price_change_30d: f64,
    market_cap_rank: u32,
    rsi: f64,
) -> f64 {
    let mut score = 50.0_f64;

    if price_change_7d > 0.0 && price_change_30d > 0.0 {
        score += 20.0;
    } else if price_change_7d > 0.0 || price_change_30d > 0.0 {
        score += 10.0;
    }

    // Smaller caps get the larger bonus
    if market_cap_rank > 100 {
        score += 15.0;
    } else if market_cap_rank > 50 {
        score += 10.0;
    } else if market_cap_rank > 20 {
        score += 5.0;
    }

    if (30.0..=50.0).contains(&rsi) {
        score += 15.0;
    } else if rsi < 30.0 {
        score += 10.0;
    }

    score.clamp(0.0, 100.0)
}

/// Qualitative risk classification from volatility and stability.
fn risk_level(volatility: f64, stability_score: f64) -> RiskLevel {
    if volatility > 15.0 || stability_score < 30.0 {
        RiskLevel::High
    } else if volatility > 8.0 || stability_score < 60.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Composite attractiveness: capped momentum, liquidity relative to the
/// series maximum, stability and growth contributions. Clamped to 0-100.
fn investment_score(
    price_change_24h: f64,
    volume_24h: f64,
    max_volume: f64,
    stability_score: f64,
    growth_potential: f64,
) -> f64 {
    let momentum = (price_change_24h * 2.0).clamp(-15.0, 15.0);
    let liquidity = if max_volume > 1.0 {
        ((volume_24h / max_volume) * 25.0).min(25.0)
    } else {
        0.0
    };
    let score = momentum + liquidity + stability_score / 3.33 + growth_potential * 0.2;
    score.clamp(0.0, 100.0)
}

/// Composite risk score, capped at 100.
///
/// Stable-value assets collapse to a reduced volatility/momentum formula
/// capped at 8; the full formula adds market-cap and liquidity penalties.
fn risk_score(
    symbol: &str,
    volatility: f64,
    price_change_24h: f64,
    market_cap: f64,
    max_market_cap: f64,
    volume_24h: f64,
) -> f64 {
    let volatility_risk = volatility * 1.5;
    let momentum_risk = (price_change_24h.abs() - 3.0).max(0.0) * 2.0;

    if is_stablecoin(symbol) {
        return (volatility_risk * 0.5 + momentum_risk * 0.3).min(8.0);
    }

    let market_cap_risk = if max_market_cap > 1.0 {
        (1.0 - market_cap / max_market_cap) * 25.0
    } else {
        25.0
    };
    let volume_ratio = volume_24h / market_cap.max(1.0);
    let liquidity_risk = (10.0 - volume_ratio * 1_000_000.0).max(0.0);

    (volatility_risk + momentum_risk + market_cap_risk + liquidity_risk).min(100.0)
}
