//! HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use advisor_core::{
    AdvisorError, AssetMetrics, InvestmentHorizon, MarketOverview, PortfolioRecommendation,
    RiskTolerance, UserProfile,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_available: bool,
}

/// Recommendation request body. Every field is optional; missing fields
/// take the moderate/1000/medium defaults.
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub risk_tolerance: Option<RiskTolerance>,

    #[serde(default)]
    pub investment_amount: Option<Decimal>,

    #[serde(default)]
    pub investment_horizon: Option<InvestmentHorizon>,
}

impl RecommendationRequest {
    fn into_profile(self) -> UserProfile {
        let defaults = UserProfile::default();
        UserProfile {
            risk_tolerance: self.risk_tolerance.unwrap_or(defaults.risk_tolerance),
            investment_amount: self
                .investment_amount
                .unwrap_or(defaults.investment_amount),
            investment_horizon: self
                .investment_horizon
                .unwrap_or(defaults.investment_horizon),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Map core errors onto HTTP status codes: unknown assets are 404, thin
/// data and infeasible profiles are 422, upstream trouble is 502.
fn map_error(error: &AdvisorError) -> HandlerError {
    let (status, code) = match error {
        AdvisorError::UnsupportedAsset(_) => (StatusCode::NOT_FOUND, "UNKNOWN_ASSET"),
        AdvisorError::InsufficientHistory { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_HISTORY")
        }
        AdvisorError::EmptyCandidateSet | AdvisorError::NoPositiveDesirability => {
            (StatusCode::UNPROCESSABLE_ENTITY, "NO_CANDIDATES")
        }
        AdvisorError::Infeasible { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "INFEASIBLE"),
        AdvisorError::InvalidProfile(_) => (StatusCode::BAD_REQUEST, "INVALID_PROFILE"),
        AdvisorError::Provider(_) | AdvisorError::Network(_) => {
            (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR")
        }
        AdvisorError::Solver(_) | AdvisorError::Serialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code,
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_available = state.advisor.health_check().await;

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.advisor.provider_name().to_string(),
        provider_available,
    })
}

/// Metrics for one asset
pub async fn asset_metrics(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<AssetMetrics>, HandlerError> {
    state
        .advisor
        .asset_metrics(&symbol)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!(%symbol, error = %e, "asset metrics failed");
            map_error(&e)
        })
}

/// Portfolio recommendation for an investor profile
pub async fn recommend(
    State(state): State<AppState>,
    Json(payload): Json<RecommendationRequest>,
) -> Result<Json<PortfolioRecommendation>, HandlerError> {
    let profile = payload.into_profile();
    state
        .advisor
        .recommend(&profile)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %e, "recommendation failed");
            map_error(&e)
        })
}

/// Market-wide metrics overview
pub async fn market_overview(
    State(state): State<AppState>,
) -> Result<Json<MarketOverview>, HandlerError> {
    state.advisor.market_overview().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "market overview failed");
        map_error(&e)
    })
}
