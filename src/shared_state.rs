use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRef;

use crate::config::{AnalysisConfig, Config};

/// Read-only state shared by every handler. Analyses never write here: each
/// request owns its dataset for the duration of the call.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl FromRef<AppState> for AnalysisConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.analysis.clone()
    }
}
