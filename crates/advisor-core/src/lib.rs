//! # advisor-core
//!
//! Asset scoring and risk-constrained portfolio allocation.
//!
//! ## Pipeline
//!
//! 1. **Market data** - a pluggable [`market::MarketDataProvider`] serves
//!    the asset universe, current snapshots and daily price history
//! 2. **Metrics** - the [`metrics::MetricsEngine`] turns raw history into
//!    one [`AssetMetrics`] record per asset: technical indicators (EMA,
//!    RSI, volatility, moving averages) plus derived investment, risk,
//!    stability and growth scores
//! 3. **Scoring** - [`scoring::score`] maps metrics and an investor
//!    [`UserProfile`] to optimizer coefficients
//! 4. **Allocation** - the [`allocator::PortfolioAllocator`] solves a
//!    risk-ceiling linear program and post-processes the weights into a
//!    final [`PortfolioRecommendation`]
//!
//! All statistics run on `f64`; money (budgets and allocation amounts)
//! stays in `rust_decimal::Decimal` end to end.

pub mod advisor;
pub mod allocator;
pub mod error;
pub mod indicators;
pub mod market;
pub mod metrics;
pub mod model;
pub mod scoring;

pub use advisor::{Advisor, MarketOverview};
pub use allocator::PortfolioAllocator;
pub use error::{AdvisorError, Result};
pub use metrics::MetricsEngine;
pub use model::{
    AssetMetrics, AssetSnapshot, InvestmentHorizon, MarketSentiment, PortfolioRecommendation,
    PriceObservation, RecommendedAsset, RiskLevel, RiskTolerance, UserProfile,
};
pub use scoring::AllocationCandidate;
