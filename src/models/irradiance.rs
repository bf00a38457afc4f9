use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ─── Sky condition ───────────────────────────────────────────────────────────

/// Selects which irradiance pair a computation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SkyCondition {
    /// Measured DHI / DNI
    #[default]
    Cloudy,
    /// Modelled Clearsky DHI / Clearsky DNI
    Clear,
}

impl SkyCondition {
    pub const ALL: [SkyCondition; 2] = [SkyCondition::Cloudy, SkyCondition::Clear];
}

impl fmt::Display for SkyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkyCondition::Cloudy => f.write_str("Cloudy"),
            SkyCondition::Clear => f.write_str("Clear"),
        }
    }
}

// ─── Month sets ──────────────────────────────────────────────────────────────

/// Immutable set of calendar months, bit `m` set for month `m` (1..=12).
///
/// Values outside 1..=12 are silently ignored on construction and are never
/// members, so records carrying such a month never qualify for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MonthSet(u16);

impl MonthSet {
    pub const EMPTY: MonthSet = MonthSet(0);
    pub const ALL: MonthSet = MonthSet::from_months(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    /// April through September
    pub const SUMMER: MonthSet = MonthSet::from_months(&[4, 5, 6, 7, 8, 9]);
    /// October through March
    pub const WINTER: MonthSet = MonthSet::from_months(&[10, 11, 12, 1, 2, 3]);

    pub const fn from_months(months: &[u32]) -> Self {
        let mut bits = 0u16;
        let mut i = 0;
        while i < months.len() {
            let m = months[i];
            if m >= 1 && m <= 12 {
                bits |= 1 << m;
            }
            i += 1;
        }
        MonthSet(bits)
    }

    pub const fn single(month: u32) -> Self {
        MonthSet::from_months(&[month])
    }

    pub const fn contains(self, month: u32) -> bool {
        month >= 1 && month <= 12 && self.0 & (1 << month) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn union(self, other: MonthSet) -> Self {
        MonthSet(self.0 | other.0)
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Months in calendar order.
    pub fn iter(self) -> impl Iterator<Item = u32> {
        (1..=12).filter(move |&m| self.contains(m))
    }
}

impl FromIterator<u32> for MonthSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        iter.into_iter()
            .fold(MonthSet::EMPTY, |set, m| set.union(MonthSet::single(m)))
    }
}

// ─── Zero-irradiance policy ──────────────────────────────────────────────────

/// Which hours count toward a period total.
///
/// `DropBothZero` discards hours where both selected components are exactly
/// zero, treating them as night-time non-observations. This also drops
/// daylight hours that genuinely measured nothing (e.g. heavy overcast), which
/// only matters when comparing hour counts, not totals: such hours would add
/// `0.0` either way. `KeepAll` counts every hour of the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ZeroIrradiancePolicy {
    #[default]
    DropBothZero,
    KeepAll,
}

impl ZeroIrradiancePolicy {
    pub fn admits(self, dhi: f64, dni: f64) -> bool {
        match self {
            ZeroIrradiancePolicy::DropBothZero => !(dhi == 0.0 && dni == 0.0),
            ZeroIrradiancePolicy::KeepAll => true,
        }
    }
}

// ─── Raw input rows ──────────────────────────────────────────────────────────

/// A single uncoerced cell: JSON number or text as read from a CSV column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Numeric coercion; blank, unparsable and non-finite cells yield `None`.
    pub fn coerce(&self) -> Option<f64> {
        let v = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// One hourly row as delivered by the data-acquisition side, before coercion.
/// Field names follow the column headers of the hourly irradiance export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RawRecord {
    #[serde(rename = "Year", alias = "year", default)]
    pub year: Option<RawValue>,
    #[serde(rename = "Month", alias = "month", default)]
    pub month: Option<RawValue>,
    #[serde(rename = "Day", alias = "day", default)]
    pub day: Option<RawValue>,
    #[serde(rename = "Hour", alias = "hour", default)]
    pub hour: Option<RawValue>,
    #[serde(rename = "Minute", alias = "minute", default)]
    pub minute: Option<RawValue>,
    #[serde(rename = "DHI", alias = "dhi", default)]
    pub dhi: Option<RawValue>,
    #[serde(rename = "DNI", alias = "dni", default)]
    pub dni: Option<RawValue>,
    #[serde(rename = "Clearsky DHI", alias = "clearsky_dhi", default)]
    pub clearsky_dhi: Option<RawValue>,
    #[serde(rename = "Clearsky DNI", alias = "clearsky_dni", default)]
    pub clearsky_dni: Option<RawValue>,
    #[serde(rename = "Declination Angle", alias = "declination_angle", default)]
    pub declination_angle: Option<RawValue>,
}

// ─── Prepared data ───────────────────────────────────────────────────────────

/// A coerced hourly observation. Declination is carried in both units; the
/// radian value is derived once during preparation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyRecord {
    pub year: Option<i32>,
    pub month: u32,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub dhi: f64,
    pub dni: f64,
    pub clearsky_dhi: f64,
    pub clearsky_dni: f64,
    pub declination_deg: f64,
    pub declination_rad: f64,
}

impl HourlyRecord {
    /// `(diffuse, direct normal)` for the given sky.
    pub fn irradiance(&self, sky: SkyCondition) -> (f64, f64) {
        match sky {
            SkyCondition::Cloudy => (self.dhi, self.dni),
            SkyCondition::Clear => (self.clearsky_dhi, self.clearsky_dni),
        }
    }
}

/// Ordered, immutable collection of hourly records for one site and year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedDataset {
    records: Vec<HourlyRecord>,
    dropped: usize,
}

impl PreparedDataset {
    pub fn from_records(records: Vec<HourlyRecord>) -> Self {
        Self { records, dropped: 0 }
    }

    pub(crate) fn with_dropped(records: Vec<HourlyRecord>, dropped: usize) -> Self {
        Self { records, dropped }
    }

    pub fn records(&self) -> &[HourlyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows discarded because a required field failed coercion.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Year of the first record that carries one.
    pub fn year(&self) -> Option<i32> {
        self.records.iter().find_map(|r| r.year)
    }
}
