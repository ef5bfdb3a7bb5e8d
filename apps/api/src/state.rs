use std::sync::Arc;

use crate::analysis::analyzer::SignalAnalyzer;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds no per-run data: every analysis is independent.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub analyzer: Arc<SignalAnalyzer>,
}
