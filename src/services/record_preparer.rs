use chrono::{Datelike, NaiveDate};

use crate::error::{AnalysisError, Result};
use crate::models::irradiance::{HourlyRecord, PreparedDataset, RawRecord, RawValue};

/// Amplitude of the Cooper declination approximation (degrees).
const DECLINATION_AMPLITUDE_DEG: f64 = 23.45;

/// Solar declination (degrees) for a day of the year, 1-based.
///
/// `-23.45 * cos(360/365 * (n + 10))`, minimum at the December solstice.
pub fn declination_deg(day_of_year: u32) -> f64 {
    -DECLINATION_AMPLITUDE_DEG * (360.0 / 365.0 * (day_of_year as f64 + 10.0)).to_radians().cos()
}

/// Fills in `Declination Angle` from the calendar date of each row.
///
/// Rows that already carry a declination are left alone. Rows whose
/// Year/Month/Day do not form a valid date keep it absent and will be dropped
/// by [`prepare`].
pub fn add_declination(records: Vec<RawRecord>) -> Vec<RawRecord> {
    records
        .into_iter()
        .map(|mut raw| {
            if raw.declination_angle.is_none() {
                raw.declination_angle = calendar_date(&raw)
                    .map(|date| RawValue::Number(declination_deg(date.ordinal())));
            }
            raw
        })
        .collect()
}

fn calendar_date(raw: &RawRecord) -> Option<NaiveDate> {
    let year = whole(raw.year.as_ref()?.coerce()?)?;
    let month = whole(raw.month.as_ref()?.coerce()?)?;
    let day = whole(raw.day.as_ref()?.coerce()?)?;
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

fn whole(v: f64) -> Option<u32> {
    (v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64).then_some(v as u32)
}

const REQUIRED_COLUMNS: [&str; 6] = [
    "DHI",
    "DNI",
    "Clearsky DHI",
    "Clearsky DNI",
    "Declination Angle",
    "Month",
];

fn required_field<'a>(raw: &'a RawRecord, column: &str) -> Option<&'a RawValue> {
    match column {
        "DHI" => raw.dhi.as_ref(),
        "DNI" => raw.dni.as_ref(),
        "Clearsky DHI" => raw.clearsky_dhi.as_ref(),
        "Clearsky DNI" => raw.clearsky_dni.as_ref(),
        "Declination Angle" => raw.declination_angle.as_ref(),
        "Month" => raw.month.as_ref(),
        _ => None,
    }
}

/// Coerces raw rows into a [`PreparedDataset`].
///
/// A row failing coercion on any required field is dropped whole. The input
/// is not touched. An empty result (no rows, a required column missing from
/// every row, or every row dropped) is an error: the analysis cannot proceed.
pub fn prepare(raw: &[RawRecord]) -> Result<PreparedDataset> {
    if raw.is_empty() {
        return Err(AnalysisError::EmptyDataset { dropped: 0 });
    }
    for column in REQUIRED_COLUMNS {
        if raw.iter().all(|r| required_field(r, column).is_none()) {
            return Err(AnalysisError::MissingColumn(column));
        }
    }

    let records: Vec<HourlyRecord> = raw.iter().filter_map(coerce_record).collect();
    let dropped = raw.len() - records.len();

    if records.is_empty() {
        tracing::warn!(rows = raw.len(), "every hourly record failed coercion");
        return Err(AnalysisError::EmptyDataset { dropped });
    }
    if dropped > 0 {
        tracing::warn!(dropped, kept = records.len(), "dropped hourly records with missing or non-numeric fields");
    }
    tracing::debug!(kept = records.len(), "prepared hourly dataset");

    Ok(PreparedDataset::with_dropped(records, dropped))
}

fn coerce_record(raw: &RawRecord) -> Option<HourlyRecord> {
    let num = |v: &Option<RawValue>| v.as_ref().and_then(RawValue::coerce);
    let opt_whole = |v: &Option<RawValue>| num(v).and_then(whole);

    let declination_deg = num(&raw.declination_angle)?;
    Some(HourlyRecord {
        year: opt_whole(&raw.year).and_then(|y| i32::try_from(y).ok()),
        month: whole(num(&raw.month)?)?,
        day: opt_whole(&raw.day),
        hour: opt_whole(&raw.hour),
        minute: opt_whole(&raw.minute),
        dhi: num(&raw.dhi)?,
        dni: num(&raw.dni)?,
        clearsky_dhi: num(&raw.clearsky_dhi)?,
        clearsky_dni: num(&raw.clearsky_dni)?,
        declination_deg,
        declination_rad: declination_deg.to_radians(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(month: u32, dhi: f64, dni: f64, decl: f64) -> RawRecord {
        RawRecord {
            year: Some(2020.0.into()),
            month: Some((month as f64).into()),
            day: Some(15.0.into()),
            hour: Some(12.0.into()),
            minute: Some(30.0.into()),
            dhi: Some(dhi.into()),
            dni: Some(dni.into()),
            clearsky_dhi: Some((dhi + 10.0).into()),
            clearsky_dni: Some((dni + 100.0).into()),
            declination_angle: Some(decl.into()),
        }
    }

    #[test]
    fn test_declination_extremes() {
        // Day 355 (Dec 21) and day 172 (Jun 21)
        assert!((declination_deg(355) + 23.45).abs() < 0.05);
        assert!((declination_deg(172) - 23.45).abs() < 0.1);
        for n in 1..=366 {
            assert!(declination_deg(n).abs() <= 23.45 + 1e-9);
        }
    }

    #[test]
    fn test_add_declination_from_date() {
        let mut r = raw(3, 1.0, 1.0, 0.0);
        r.declination_angle = None;
        r.month = Some("3".into());
        r.day = Some("1".into());
        let out = add_declination(vec![r]);
        // 2020-03-01 is day 61 of a leap year
        let decl = out[0].declination_angle.as_ref().and_then(RawValue::coerce).unwrap();
        assert!((decl - declination_deg(61)).abs() < 1e-12);
    }

    #[test]
    fn test_add_declination_keeps_explicit_and_skips_invalid_dates() {
        let explicit = raw(6, 1.0, 1.0, 7.5);
        let mut invalid = raw(2, 1.0, 1.0, 0.0);
        invalid.declination_angle = None;
        invalid.day = Some(30.0.into());
        let out = add_declination(vec![explicit, invalid]);
        assert_eq!(out[0].declination_angle, Some(RawValue::Number(7.5)));
        assert_eq!(out[1].declination_angle, None);
    }

    #[test]
    fn test_prepare_clean_input_is_row_preserving() {
        let rows: Vec<RawRecord> = (1..=12).map(|m| raw(m, 50.0, 400.0, m as f64 * 2.0 - 12.0)).collect();
        let ds = prepare(&rows).unwrap();
        assert_eq!(ds.len(), rows.len());
        assert_eq!(ds.dropped(), 0);
        for rec in ds.records() {
            assert_eq!(rec.declination_rad, rec.declination_deg.to_radians());
        }
        assert_eq!(ds.year(), Some(2020));
    }

    #[test]
    fn test_prepare_drops_rows_failing_any_required_field() {
        let mut bad_dni = raw(1, 10.0, 10.0, 0.0);
        bad_dni.dni = Some("missing".into());
        let mut no_clear = raw(2, 10.0, 10.0, 0.0);
        no_clear.clearsky_dhi = None;
        let mut fractional_month = raw(3, 10.0, 10.0, 0.0);
        fractional_month.month = Some(3.5.into());
        let good = raw(4, 10.0, 10.0, 0.0);

        let ds = prepare(&[bad_dni, no_clear, fractional_month, good]).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.dropped(), 3);
        assert_eq!(ds.records()[0].month, 4);
    }

    #[test]
    fn test_prepare_optional_fields_do_not_drop() {
        let mut r = raw(5, 10.0, 10.0, 0.0);
        r.hour = Some("noon".into());
        r.year = None;
        let ds = prepare(&[r]).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records()[0].hour, None);
    }

    #[test]
    fn test_prepare_unusable_inputs() {
        assert!(matches!(prepare(&[]), Err(AnalysisError::EmptyDataset { dropped: 0 })));

        let mut r = raw(1, 1.0, 1.0, 0.0);
        r.declination_angle = None;
        assert!(matches!(prepare(&[r]), Err(AnalysisError::MissingColumn("Declination Angle"))));

        let mut a = raw(1, 1.0, 1.0, 0.0);
        a.dhi = Some("".into());
        let mut b = raw(2, 1.0, 1.0, 0.0);
        b.month = Some("Feb".into());
        assert!(matches!(prepare(&[a, b]), Err(AnalysisError::EmptyDataset { dropped: 2 })));
    }

    #[test]
    fn test_prepare_does_not_mutate_input() {
        let rows = vec![raw(1, 1.0, 1.0, 0.0)];
        let before = rows.clone();
        let _ = prepare(&rows).unwrap();
        assert_eq!(rows, before);
    }
}
