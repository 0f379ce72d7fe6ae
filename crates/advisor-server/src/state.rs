//! Application State

use std::sync::Arc;

use advisor_core::Advisor;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The advisor pipeline over the configured market data provider
    pub advisor: Arc<Advisor>,
}
