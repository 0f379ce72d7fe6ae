//! Error Types for the Advisor Core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    /// History shorter than the minimum window. Recoverable: callers skip
    /// the asset, they never receive a partially-filled metrics record.
    #[error("insufficient history for {symbol}: {points} points, need {required}")]
    InsufficientHistory {
        symbol: String,
        points: usize,
        required: usize,
    },

    /// No asset passed data-sufficiency filtering, so there is nothing
    /// to allocate. Distinct from solver infeasibility.
    #[error("no candidate assets available for allocation")]
    EmptyCandidateSet,

    /// Every candidate ended up with a non-positive desirability.
    #[error("no candidate has positive desirability")]
    NoPositiveDesirability,

    /// No allocation satisfies the constraints.
    #[error("no feasible allocation: {constraint}")]
    Infeasible { constraint: String },

    /// Numerical failure inside the solver.
    #[error("solver error: {0}")]
    Solver(String),

    /// Profile fields that cannot be defaulted (e.g. non-positive budget).
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// The data provider does not know this symbol.
    #[error("asset not supported: {0}")]
    UnsupportedAsset(String),

    /// Upstream provider returned an unusable payload.
    #[error("provider error: {0}")]
    Provider(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
