use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::models::analysis::{
    AnalysisReport, AnalysisRequest, ArrangementInfo, CsvAnalysisQuery, ErrorResponse, HealthStatus,
};
use crate::services::analysis_service;
use crate::services::arrangements::Arrangement;
use crate::shared_state::AppState;

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status = match &self {
            AnalysisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AnalysisError::MissingColumn(_) | AnalysisError::EmptyDataset { .. } | AnalysisError::Csv(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AnalysisError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AnalysisError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(status = status.as_u16(), "analysis request failed: {self}");
        (status, Json(ErrorResponse { message: self.to_string() })).into_response()
    }
}

/// POST /api/analysis
/// Compare the six tilt arrangements for a site
///
/// Takes the hourly records of one year at one site and returns the total
/// tilt-corrected irradiance of every arrangement under measured and
/// clear-sky conditions.
#[utoipa::path(
    post,
    path = "/api/analysis",
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Arrangement comparison", body = AnalysisReport),
        (status = 400, description = "Invalid site parameters", body = ErrorResponse),
        (status = 422, description = "No usable hourly records", body = ErrorResponse),
        (status = 504, description = "Analysis timed out", body = ErrorResponse)
    )
)]
pub async fn analyze(
    State(config): State<AnalysisConfig>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisReport>, AnalysisError> {
    let timeout = config.timeout_secs;
    let report = analysis_service::run_with_timeout(timeout, move || {
        analysis_service::run_analysis(request, &config)
    })
    .await?;
    Ok(Json(report))
}

/// POST /api/analysis/csv
/// Compare the six tilt arrangements from an hourly CSV export
///
/// The body is the raw export: metadata lines, a header row, then one row per
/// hour. Declination is derived from each row's date.
#[utoipa::path(
    post,
    path = "/api/analysis/csv",
    params(CsvAnalysisQuery),
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Arrangement comparison", body = AnalysisReport),
        (status = 400, description = "Invalid site parameters", body = ErrorResponse),
        (status = 422, description = "Unreadable CSV or no usable hourly records", body = ErrorResponse),
        (status = 504, description = "Analysis timed out", body = ErrorResponse)
    )
)]
pub async fn analyze_csv(
    State(config): State<AnalysisConfig>,
    Query(query): Query<CsvAnalysisQuery>,
    body: Bytes,
) -> Result<Json<AnalysisReport>, AnalysisError> {
    let timeout = config.timeout_secs;
    let report = analysis_service::run_with_timeout(timeout, move || {
        analysis_service::run_csv_analysis(&body, query, &config)
    })
    .await?;
    Ok(Json(report))
}

/// GET /api/arrangements
/// List the tilt arrangements compared by an analysis
#[utoipa::path(
    get,
    path = "/api/arrangements",
    responses(
        (status = 200, description = "Arrangements in table order", body = Vec<ArrangementInfo>)
    )
)]
pub async fn list_arrangements() -> impl IntoResponse {
    let info: Vec<ArrangementInfo> = Arrangement::ALL
        .iter()
        .map(|&a| ArrangementInfo {
            number: a.number(),
            arrangement: a,
            description: a.description().to_string(),
        })
        .collect();
    Json(info)
}

/// GET /api/health
/// Service status
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = HealthStatus)
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        zero_irradiance_policy: state.config.analysis.zero_irradiance_policy,
        parallel: state.config.analysis.parallel,
    })
}
