//! Portfolio Allocator
//!
//! Solves the allocation problem over scored candidates:
//! maximize total desirability subject to a full-budget equality and a
//! risk ceiling, then applies the deterministic post-processing passes
//! (top-N selection, diversification, renormalization) and assembles the
//! final [`PortfolioRecommendation`].
//!
//! Failure outcomes are explicit and typed: an empty candidate list, an
//! all-zero objective and solver infeasibility are never converted into
//! an empty-but-successful recommendation.

mod simplex;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AdvisorError, Result};
use crate::model::{PortfolioRecommendation, RecommendedAsset, UserProfile};
use crate::scoring::AllocationCandidate;
use simplex::{Constraint, ConstraintOp, LinearProgram, SolveOutcome};

/// Maximum number of assets in a recommendation.
pub const MAX_ASSETS: usize = 4;

/// LP weights at or below this are treated as zero.
pub const WEIGHT_THRESHOLD: f64 = 1e-4;

/// At most this many stable-value assets per recommendation.
const MAX_STABLECOINS: usize = 1;

/// Position-based weight multipliers, rank 1 first.
const POSITION_MULTIPLIERS: [f64; MAX_ASSETS] = [1.5, 1.2, 0.9, 0.7];

/// Slack allowed on the risk ceiling after renormalization.
const RISK_TOLERANCE_EPS: f64 = 1e-6;

/// Risk tier of a candidate, by unit risk score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RiskTier {
    Low,
    Medium,
    High,
}

fn risk_tier(unit_risk: f64) -> RiskTier {
    if unit_risk < 20.0 {
        RiskTier::Low
    } else if unit_risk < 60.0 {
        RiskTier::Medium
    } else {
        RiskTier::High
    }
}

/// Tier adjustment on top of the position multiplier: low-risk positions
/// are boosted 20%, high-risk positions trimmed 20%.
const fn tier_multiplier(tier: RiskTier) -> f64 {
    match tier {
        RiskTier::Low => 1.2,
        RiskTier::Medium => 1.0,
        RiskTier::High => 0.8,
    }
}

/// Risk-constrained portfolio allocator.
#[derive(Clone, Debug, Default)]
pub struct PortfolioAllocator;

impl PortfolioAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Allocate the profile's budget across the candidates.
    ///
    /// The pipeline is build coefficients -> solve LP -> select top-N ->
    /// diversify -> renormalize -> report. The returned weights sum to 1
    /// and the weighted risk stays at or under the profile's ceiling.
    pub fn allocate(
        &self,
        candidates: &[AllocationCandidate],
        profile: &UserProfile,
    ) -> Result<PortfolioRecommendation> {
        if candidates.is_empty() {
            return Err(AdvisorError::EmptyCandidateSet);
        }
        if profile.investment_amount <= Decimal::ZERO {
            return Err(AdvisorError::InvalidProfile(
                "investment amount must be positive".into(),
            ));
        }
        if !candidates.iter().any(|c| c.desirability > 0.0) {
            return Err(AdvisorError::NoPositiveDesirability);
        }

        let ceiling = profile.risk_tolerance.max_portfolio_risk();
        let lp_weights = solve(candidates, ceiling)?;

        let lp_selected = select_top(candidates, &lp_weights);
        if lp_selected.is_empty() {
            return Err(AdvisorError::Solver(
                "solver returned a degenerate all-zero solution".into(),
            ));
        }

        let chosen = diversify(candidates, &lp_selected);
        let (final_indices, weights) =
            enforce_ceiling(candidates, chosen, &lp_selected, &lp_weights, ceiling);

        tracing::debug!(
            assets = final_indices.len(),
            ceiling,
            "allocation complete"
        );

        Ok(build_recommendation(
            candidates,
            &final_indices,
            &weights,
            profile,
        ))
    }
}

/// Solve the LP: maximize `sum v_i x_i` with `sum x_i = 1` and
/// `sum r_i x_i <= ceiling`, `x_i >= 0`.
fn solve(candidates: &[AllocationCandidate], ceiling: f64) -> Result<Vec<f64>> {
    let n = candidates.len();
    let program = LinearProgram {
        objective: candidates.iter().map(|c| c.desirability).collect(),
        constraints: vec![
            Constraint {
                coefficients: vec![1.0; n],
                op: ConstraintOp::Eq,
                rhs: 1.0,
            },
            Constraint {
                coefficients: candidates.iter().map(|c| c.unit_risk).collect(),
                op: ConstraintOp::Le,
                rhs: ceiling,
            },
        ],
    };

    match simplex::maximize(&program) {
        SolveOutcome::Optimal(solution) => Ok(solution.variables),
        SolveOutcome::Infeasible => Err(AdvisorError::Infeasible {
            constraint: format!(
                "risk ceiling {ceiling}: every full-budget allocation exceeds it"
            ),
        }),
        SolveOutcome::Unbounded => Err(AdvisorError::Solver(
            "allocation program is unbounded".into(),
        )),
        SolveOutcome::IterationLimit => Err(AdvisorError::Solver(
            "simplex iteration limit reached".into(),
        )),
    }
}

/// Candidate indices with LP weight above the threshold, heaviest first,
/// capped at [`MAX_ASSETS`].
fn select_top(candidates: &[AllocationCandidate], weights: &[f64]) -> Vec<usize> {
    let mut selected: Vec<usize> = (0..candidates.len())
        .filter(|&i| weights[i] > WEIGHT_THRESHOLD)
        .collect();
    selected.sort_by(|&a, &b| {
        weights[b]
            .partial_cmp(&weights[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    selected.truncate(MAX_ASSETS);
    selected
}

/// Fill up to [`MAX_ASSETS`] slots: LP-selected assets first, the rest of
/// the field ranked by desirability, preferring lower risk tiers and
/// capping stable-value assets at one.
fn diversify(candidates: &[AllocationCandidate], lp_selected: &[usize]) -> Vec<usize> {
    let mut pool: Vec<usize> = lp_selected.to_vec();
    let mut remainder: Vec<usize> = (0..candidates.len())
        .filter(|i| !lp_selected.contains(i))
        .collect();
    remainder.sort_by(|&a, &b| {
        candidates[b]
            .desirability
            .partial_cmp(&candidates[a].desirability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    pool.extend(remainder);

    let mut chosen: Vec<usize> = Vec::with_capacity(MAX_ASSETS);
    let mut stablecoins = 0usize;
    for tier in [RiskTier::Low, RiskTier::Medium, RiskTier::High] {
        for &i in &pool {
            if chosen.len() == MAX_ASSETS {
                return chosen;
            }
            if chosen.contains(&i) || risk_tier(candidates[i].unit_risk) != tier {
                continue;
            }
            if candidates[i].metrics.is_stablecoin() {
                if stablecoins >= MAX_STABLECOINS {
                    continue;
                }
                stablecoins += 1;
            }
            chosen.push(i);
        }
    }
    chosen
}

/// Position multipliers adjusted by risk tier, rescaled to sum to 1.
fn renormalize(candidates: &[AllocationCandidate], chosen: &[usize]) -> Vec<f64> {
    let raw: Vec<f64> = chosen
        .iter()
        .enumerate()
        .map(|(rank, &i)| {
            let position = POSITION_MULTIPLIERS.get(rank).copied().unwrap_or(0.7);
            position * tier_multiplier(risk_tier(candidates[i].unit_risk))
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.iter().map(|w| w / total).collect()
}

/// Renormalize, then keep the weighted risk under the ceiling: drop the
/// riskiest backfilled asset while the ceiling is violated, and as a last
/// resort fall back to the raw LP weights, which satisfy it by
/// construction.
fn enforce_ceiling(
    candidates: &[AllocationCandidate],
    mut chosen: Vec<usize>,
    lp_selected: &[usize],
    lp_weights: &[f64],
    ceiling: f64,
) -> (Vec<usize>, Vec<f64>) {
    loop {
        let weights = renormalize(candidates, &chosen);
        let portfolio_risk: f64 = chosen
            .iter()
            .zip(&weights)
            .map(|(&i, w)| candidates[i].unit_risk * w)
            .sum();
        if portfolio_risk <= ceiling + RISK_TOLERANCE_EPS {
            return (chosen, weights);
        }

        let backfilled = chosen
            .iter()
            .enumerate()
            .filter(|(_, i)| !lp_selected.contains(*i))
            .max_by(|(_, a), (_, b)| {
                candidates[**a]
                    .unit_risk
                    .partial_cmp(&candidates[**b].unit_risk)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(pos, _)| pos);

        match backfilled {
            Some(pos) => {
                tracing::debug!(
                    symbol = %candidates[chosen[pos]].metrics.symbol,
                    "dropping backfilled asset to honor risk ceiling"
                );
                chosen.remove(pos);
            }
            None => {
                // Only LP-selected assets remain. Fall back to the raw
                // solver weights over their full support, sub-threshold
                // entries included: they sum to 1 and satisfy the
                // ceiling by construction, while any renormalization of
                // a subset could tip the weighted risk past it.
                let support: Vec<usize> =
                    (0..lp_weights.len()).filter(|&i| lp_weights[i] > 0.0).collect();
                let weights = support.iter().map(|&i| lp_weights[i]).collect();
                return (support, weights);
            }
        }
    }
}

fn build_recommendation(
    candidates: &[AllocationCandidate],
    indices: &[usize],
    weights: &[f64],
    profile: &UserProfile,
) -> PortfolioRecommendation {
    // Present heaviest positions first.
    let mut order: Vec<usize> = (0..indices.len()).collect();
    order.sort_by(|&a, &b| {
        weights[b]
            .partial_cmp(&weights[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut assets = Vec::with_capacity(order.len());
    let mut expected_return = 0.0;
    let mut risk_score = 0.0;
    let mut confidence_level = 0.0;

    for &slot in &order {
        let candidate = &candidates[indices[slot]];
        let weight = weights[slot];
        let m = &candidate.metrics;

        expected_return += weight * (m.expected_return / 100.0);
        risk_score += weight * candidate.unit_risk;
        confidence_level += weight * (m.investment_score.abs() + m.stability_score) / 2.0;

        let fraction = Decimal::from_f64_retain(weight).unwrap_or_default();
        assets.push(RecommendedAsset {
            symbol: m.symbol.clone(),
            name: m.name.clone(),
            weight,
            allocation_percent: weight * 100.0,
            allocation_amount: (profile.investment_amount * fraction).round_dp(2),
            current_price: m.current_price,
            risk_level: m.risk_level,
        });
    }
    expected_return *= 100.0;

    let rationale = rationale(candidates, indices, weights, &order, profile, expected_return, risk_score, confidence_level);

    PortfolioRecommendation {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        assets,
        expected_return,
        risk_score,
        confidence_level,
        rationale,
    }
}

#[allow(clippy::too_many_arguments)]
fn rationale(
    candidates: &[AllocationCandidate],
    indices: &[usize],
    weights: &[f64],
    order: &[usize],
    profile: &UserProfile,
    expected_return: f64,
    risk_score: f64,
    confidence_level: f64,
) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "Portfolio recommendation for a {} profile with a {} horizon:\n\n",
        profile.risk_tolerance, profile.investment_horizon
    ));

    for (position, &slot) in order.iter().enumerate() {
        let m = &candidates[indices[slot]].metrics;
        s.push_str(&format!(
            "{}. {} ({}) - {:.1}%\n",
            position + 1,
            m.name,
            m.symbol,
            weights[slot] * 100.0
        ));
        s.push_str(&format!(
            "   growth {:.0}/100, stability {:.0}/100, risk {}, sentiment {}\n",
            m.growth_potential, m.stability_score, m.risk_level, m.market_sentiment
        ));
    }

    s.push_str("\nPortfolio metrics:\n");
    s.push_str(&format!("   expected return: {expected_return:.2}%\n"));
    s.push_str(&format!("   risk score: {risk_score:.1}/100\n"));
    s.push_str(&format!("   confidence: {confidence_level:.1}%\n"));
    s
}
