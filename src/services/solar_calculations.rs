//! Tilted-plane irradiance model and the integer tilt search.
//!
//! Per qualifying hour the panel collects
//!
//! ```text
//! dhi + max(0, cos(lat - tilt - decl)) * dni
//! ```
//!
//! Diffuse light is treated as isotropic and always counted in full; the
//! direct beam is projected onto the panel normal in the meridian plane and
//! clipped at zero once the sun falls behind the panel.

use std::ops::RangeInclusive;

use crate::models::irradiance::{MonthSet, PreparedDataset, SkyCondition, ZeroIrradiancePolicy};

/// Integer tilts (degrees) swept by the optimizer.
pub const TILT_SEARCH_RANGE: RangeInclusive<i32> = 0..=90;

/// Best tilt found by [`find_optimal_tilt`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltOptimum {
    pub tilt_deg: i32,
    pub ghi: f64,
}

/// Total tilt-corrected irradiance over the hours of `months`, using the
/// default [`ZeroIrradiancePolicy`].
pub fn estimate_ghi(
    dataset: &PreparedDataset,
    tilt_deg: f64,
    months: MonthSet,
    sky: SkyCondition,
    latitude_rad: f64,
) -> f64 {
    estimate_ghi_with_policy(dataset, tilt_deg, months, sky, latitude_rad, ZeroIrradiancePolicy::default())
}

/// As [`estimate_ghi`], with an explicit policy for all-zero hours.
///
/// The result is a sum, not a mean: it grows with the number of qualifying
/// hours. An empty dataset, an empty month set, or a period with no admitted
/// hours yields exactly `0.0`. Tilt is not range-checked here.
pub fn estimate_ghi_with_policy(
    dataset: &PreparedDataset,
    tilt_deg: f64,
    months: MonthSet,
    sky: SkyCondition,
    latitude_rad: f64,
    policy: ZeroIrradiancePolicy,
) -> f64 {
    let panel_rad = tilt_deg.to_radians();

    dataset
        .records()
        .iter()
        .filter(|r| months.contains(r.month))
        .map(|r| (r.irradiance(sky), r.declination_rad))
        .filter(|&((dhi, dni), _)| policy.admits(dhi, dni))
        .map(|((dhi, dni), decl_rad)| {
            let cos_theta = (latitude_rad - panel_rad - decl_rad).cos();
            let direct = if cos_theta > 0.0 { dni * cos_theta } else { 0.0 };
            dhi + direct
        })
        .fold(0.0, |acc, v| acc + v)
}

/// Exhaustive sweep over [`TILT_SEARCH_RANGE`] with the default policy.
pub fn find_optimal_tilt(
    dataset: &PreparedDataset,
    months: MonthSet,
    sky: SkyCondition,
    latitude_rad: f64,
) -> TiltOptimum {
    find_optimal_tilt_with_policy(dataset, months, sky, latitude_rad, ZeroIrradiancePolicy::default())
}

/// Exhaustive sweep over integer tilts 0..=90.
///
/// Only a strictly greater total replaces the running best, so on ties the
/// lowest tilt wins. The running best starts below any reachable total, which
/// makes an all-zero period resolve to tilt 0 with GHI 0.
pub fn find_optimal_tilt_with_policy(
    dataset: &PreparedDataset,
    months: MonthSet,
    sky: SkyCondition,
    latitude_rad: f64,
    policy: ZeroIrradiancePolicy,
) -> TiltOptimum {
    let mut best = TiltOptimum { tilt_deg: -1, ghi: -1.0 };

    for tilt in TILT_SEARCH_RANGE {
        let ghi = estimate_ghi_with_policy(dataset, tilt as f64, months, sky, latitude_rad, policy);
        #[cfg(feature = "verbose_log")]
        tracing::trace!(tilt, ghi, ?sky, "tilt evaluated");
        if ghi > best.ghi {
            best = TiltOptimum { tilt_deg: tilt, ghi };
        }
    }

    best
}

/// Optimal tilt for each calendar month, January first.
pub fn monthly_optimal_tilts(
    dataset: &PreparedDataset,
    sky: SkyCondition,
    latitude_rad: f64,
    policy: ZeroIrradiancePolicy,
) -> Vec<(u32, TiltOptimum)> {
    MonthSet::ALL
        .iter()
        .map(|m| (m, find_optimal_tilt_with_policy(dataset, MonthSet::single(m), sky, latitude_rad, policy)))
        .collect()
}

/// Per-month totals at a fixed tilt, January first.
pub fn monthly_ghi_at_tilt(
    dataset: &PreparedDataset,
    tilt_deg: f64,
    sky: SkyCondition,
    latitude_rad: f64,
    policy: ZeroIrradiancePolicy,
) -> Vec<(u32, f64)> {
    MonthSet::ALL
        .iter()
        .map(|m| (m, estimate_ghi_with_policy(dataset, tilt_deg, MonthSet::single(m), sky, latitude_rad, policy)))
        .collect()
}
