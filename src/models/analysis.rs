use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::irradiance::{RawRecord, SkyCondition, ZeroIrradiancePolicy};
use crate::services::arrangements::{Arrangement, PeriodYield};

// ─── Requests ────────────────────────────────────────────────────────────────

/// Hourly records for one site and year plus the site latitude.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnalysisRequest {
    /// Site latitude (degrees, −90 … +90)
    pub latitude: f64,
    /// Site longitude; informational only
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Data year; taken from the records when omitted
    #[serde(default)]
    pub year: Option<i32>,
    /// Sky condition used for the chart series (defaults to the configured one)
    #[serde(default)]
    pub sky_condition: Option<SkyCondition>,
    #[serde(default)]
    pub generate_charts: bool,
    pub records: Vec<RawRecord>,
}

/// Query string for `POST /api/analysis/csv`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CsvAnalysisQuery {
    pub latitude: f64,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub sky_condition: Option<SkyCondition>,
    #[serde(default)]
    pub generate_charts: bool,
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Tilt used over a group of months by one arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PeriodTilt {
    pub months: Vec<u32>,
    pub tilt_deg: f64,
    pub ghi: f64,
}

impl From<&PeriodYield> for PeriodTilt {
    fn from(p: &PeriodYield) -> Self {
        Self {
            months: p.months.iter().collect(),
            tilt_deg: p.tilt_deg,
            ghi: p.ghi,
        }
    }
}

/// One line of the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ArrangementRow {
    pub number: u8,
    pub arrangement: Arrangement,
    pub name: String,
    /// Total over all qualifying hours, measured sky
    pub cloudy_ghi: f64,
    /// Total over all qualifying hours, clear-sky model
    pub clear_ghi: f64,
    pub cloudy_tilts: Vec<PeriodTilt>,
    pub clear_tilts: Vec<PeriodTilt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyGhi {
    pub month: u32,
    /// Arrangement 1 over this month
    pub fixed_horizontal: f64,
    /// Arrangement 2 over this month
    pub fixed_latitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyOptimum {
    pub month: u32,
    pub optimal_tilt: i32,
    pub max_ghi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Improvement {
    pub arrangement: Arrangement,
    pub name: String,
    /// Gain over arrangement 1, percent
    pub percent: f64,
}

/// Numeric series for charting, all for a single sky condition.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartSeries {
    pub sky_condition: SkyCondition,
    pub monthly_ghi: Vec<MonthlyGhi>,
    pub monthly_optimal: Vec<MonthlyOptimum>,
    /// Strictly positive gains only
    pub improvements: Vec<Improvement>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: Option<f64>,
    pub year: Option<i32>,
    pub sky_condition: SkyCondition,
    pub records_used: usize,
    pub records_dropped: usize,
    pub results: Vec<ArrangementRow>,
    pub charts: Option<ChartSeries>,
}

// ─── Misc responses ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ArrangementInfo {
    pub number: u8,
    pub arrangement: Arrangement,
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub zero_irradiance_policy: ZeroIrradiancePolicy,
    pub parallel: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
