use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::irradiance::{MonthSet, PreparedDataset, SkyCondition, ZeroIrradiancePolicy};
use crate::services::solar_calculations::{estimate_ghi_with_policy, find_optimal_tilt_with_policy};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Obliquity of the ecliptic used throughout the model (degrees).
pub const EARTH_AXIAL_TILT: f64 = 23.45;

/// Offset from latitude for the two-fixed-tilt arrangement (degrees).
pub const SEASONAL_TILT_ADJUSTMENT: f64 = EARTH_AXIAL_TILT / 2.0;

// ─── Site context ────────────────────────────────────────────────────────────

/// Everything a strategy reads: the prepared data and the site latitude in
/// both units. Borrowed, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct SiteContext<'a> {
    pub dataset: &'a PreparedDataset,
    pub latitude_deg: f64,
    pub latitude_rad: f64,
    pub policy: ZeroIrradiancePolicy,
}

impl<'a> SiteContext<'a> {
    pub fn new(dataset: &'a PreparedDataset, latitude_deg: f64) -> Self {
        Self {
            dataset,
            latitude_deg,
            latitude_rad: latitude_deg.to_radians(),
            policy: ZeroIrradiancePolicy::default(),
        }
    }

    pub fn with_policy(self, policy: ZeroIrradiancePolicy) -> Self {
        Self { policy, ..self }
    }
}

// ─── Arrangements ────────────────────────────────────────────────────────────

/// The six tilt arrangements compared by an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Arrangement {
    /// 0° all year
    FixedHorizontal,
    /// Tilt equal to latitude all year
    FixedLatitude,
    /// Latitude − 11.725° in summer, latitude + 11.725° in winter
    TwoFixedSeasonal,
    /// Best whole-degree tilt for every month
    MonthlyOptimal,
    /// Best whole-degree tilt for summer and for winter
    SeasonalOptimal,
    /// Best whole-degree tilt for the whole year
    AnnualOptimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TiltChoice {
    Fixed(f64),
    Optimal,
}

/// One leg of an arrangement's schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Period {
    months: MonthSet,
    tilt: TiltChoice,
}

impl Period {
    const fn fixed(months: MonthSet, tilt_deg: f64) -> Self {
        Period { months, tilt: TiltChoice::Fixed(tilt_deg) }
    }

    const fn optimal(months: MonthSet) -> Self {
        Period { months, tilt: TiltChoice::Optimal }
    }
}

/// Yield of one schedule period and the tilt it was collected at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodYield {
    pub months: MonthSet,
    pub tilt_deg: f64,
    pub ghi: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrangementYield {
    pub arrangement: Arrangement,
    pub sky: SkyCondition,
    /// Sum of `periods[..].ghi`, in schedule order
    pub total: f64,
    pub periods: Vec<PeriodYield>,
}

impl Arrangement {
    pub const ALL: [Arrangement; 6] = [
        Arrangement::FixedHorizontal,
        Arrangement::FixedLatitude,
        Arrangement::TwoFixedSeasonal,
        Arrangement::MonthlyOptimal,
        Arrangement::SeasonalOptimal,
        Arrangement::AnnualOptimal,
    ];

    pub fn number(self) -> u8 {
        match self {
            Arrangement::FixedHorizontal => 1,
            Arrangement::FixedLatitude => 2,
            Arrangement::TwoFixedSeasonal => 3,
            Arrangement::MonthlyOptimal => 4,
            Arrangement::SeasonalOptimal => 5,
            Arrangement::AnnualOptimal => 6,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Arrangement::FixedHorizontal => "fixed_horizontal",
            Arrangement::FixedLatitude => "fixed_latitude",
            Arrangement::TwoFixedSeasonal => "two_fixed_seasonal",
            Arrangement::MonthlyOptimal => "monthly_optimal",
            Arrangement::SeasonalOptimal => "seasonal_optimal",
            Arrangement::AnnualOptimal => "annual_optimal",
        }
    }

    /// Table label; only the latitude arrangement depends on the site.
    pub fn label(self, latitude_deg: f64) -> String {
        match self {
            Arrangement::FixedHorizontal => "Arr. 1: 0° Fixed".to_string(),
            Arrangement::FixedLatitude => format!("Arr. 2: {latitude_deg:.1}° Fixed (Lat)"),
            Arrangement::TwoFixedSeasonal => {
                format!("Arr. 3: Two Fixed (Lat±{SEASONAL_TILT_ADJUSTMENT:.1}°)")
            }
            Arrangement::MonthlyOptimal => "Arr. 4: Monthly Optimal".to_string(),
            Arrangement::SeasonalOptimal => "Arr. 5: Summer/Winter Optimal".to_string(),
            Arrangement::AnnualOptimal => "Arr. 6: Annual Optimal".to_string(),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Arrangement::FixedHorizontal => "Panel flat (0°) all year",
            Arrangement::FixedLatitude => "Panel tilted at the site latitude all year",
            Arrangement::TwoFixedSeasonal => {
                "Latitude minus half the axial tilt from April to September, plus half the axial tilt from October to March"
            }
            Arrangement::MonthlyOptimal => "Best whole-degree tilt chosen separately for each month",
            Arrangement::SeasonalOptimal => "Best whole-degree tilt chosen for summer and for winter",
            Arrangement::AnnualOptimal => "Single best whole-degree tilt for the whole year",
        }
    }

    fn schedule(self, latitude_deg: f64) -> Vec<Period> {
        match self {
            Arrangement::FixedHorizontal => vec![Period::fixed(MonthSet::ALL, 0.0)],
            Arrangement::FixedLatitude => vec![Period::fixed(MonthSet::ALL, latitude_deg)],
            Arrangement::TwoFixedSeasonal => vec![
                Period::fixed(MonthSet::SUMMER, latitude_deg - SEASONAL_TILT_ADJUSTMENT),
                Period::fixed(MonthSet::WINTER, latitude_deg + SEASONAL_TILT_ADJUSTMENT),
            ],
            Arrangement::MonthlyOptimal => MonthSet::ALL
                .iter()
                .map(|m| Period::optimal(MonthSet::single(m)))
                .collect(),
            Arrangement::SeasonalOptimal => vec![
                Period::optimal(MonthSet::SUMMER),
                Period::optimal(MonthSet::WINTER),
            ],
            Arrangement::AnnualOptimal => vec![Period::optimal(MonthSet::ALL)],
        }
    }

    /// Runs the arrangement's schedule against the site.
    pub fn evaluate(self, site: &SiteContext<'_>, sky: SkyCondition) -> ArrangementYield {
        let periods: Vec<PeriodYield> = self
            .schedule(site.latitude_deg)
            .into_iter()
            .map(|period| evaluate_period(site, sky, period))
            .collect();
        let total = periods.iter().fold(0.0, |acc, p| acc + p.ghi);

        tracing::debug!(arrangement = self.key(), %sky, total, "arrangement evaluated");

        ArrangementYield { arrangement: self, sky, total, periods }
    }
}

fn evaluate_period(site: &SiteContext<'_>, sky: SkyCondition, period: Period) -> PeriodYield {
    match period.tilt {
        TiltChoice::Fixed(tilt_deg) => PeriodYield {
            months: period.months,
            tilt_deg,
            ghi: estimate_ghi_with_policy(site.dataset, tilt_deg, period.months, sky, site.latitude_rad, site.policy),
        },
        TiltChoice::Optimal => {
            let best = find_optimal_tilt_with_policy(site.dataset, period.months, sky, site.latitude_rad, site.policy);
            PeriodYield {
                months: period.months,
                tilt_deg: best.tilt_deg as f64,
                ghi: best.ghi,
            }
        }
    }
}

/// Scalar yield of one arrangement.
pub fn evaluate_arrangement(arrangement: Arrangement, site: &SiteContext<'_>, sky: SkyCondition) -> f64 {
    arrangement.evaluate(site, sky).total
}
