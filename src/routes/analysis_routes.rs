use axum::{routing::{get, post}, Router};
use crate::controllers::analysis_controller::{
    // Analysis
    analyze, analyze_csv,
    // Reference & status
    list_arrangements, health,
};
use crate::shared_state::AppState;

/// Build the `/api/*` sub-router.
/// Analysis handlers extract `State<AnalysisConfig>` through
/// `FromRef<AppState>`; a single `.with_state(state)` covers both.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/analysis",        post(analyze))
        .route("/analysis/csv",    post(analyze_csv))
        .route("/arrangements",    get(list_arrangements))
        .route("/health",          get(health))
        .with_state(state)
}
