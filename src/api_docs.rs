use utoipa::OpenApi;
use crate::controllers::analysis_controller;
use crate::models::{analysis, irradiance};
use crate::services::arrangements;

#[derive(OpenApi)]
#[openapi(
    paths(
        analysis_controller::analyze,
        analysis_controller::analyze_csv,
        analysis_controller::list_arrangements,
        analysis_controller::health
    ),
    components(
        schemas(
            analysis::AnalysisRequest,
            analysis::AnalysisReport,
            analysis::ArrangementRow,
            analysis::PeriodTilt,
            analysis::ChartSeries,
            analysis::MonthlyGhi,
            analysis::MonthlyOptimum,
            analysis::Improvement,
            analysis::ArrangementInfo,
            analysis::HealthStatus,
            analysis::ErrorResponse,
            irradiance::RawRecord,
            irradiance::RawValue,
            irradiance::SkyCondition,
            irradiance::ZeroIrradiancePolicy,
            arrangements::Arrangement
        )
    ),
    tags(
        (name = "helio-tilt", description = "Fixed-site PV tilt arrangement analysis API")
    )
)]
pub struct ApiDoc;
