use std::time::{Duration, Instant};

use rayon::prelude::*;
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::models::analysis::{
    AnalysisReport, AnalysisRequest, ArrangementRow, ChartSeries, CsvAnalysisQuery, Improvement, MonthlyGhi,
    MonthlyOptimum, PeriodTilt,
};
use crate::models::irradiance::{PreparedDataset, RawRecord, SkyCondition};
use crate::services::arrangements::{Arrangement, ArrangementYield, SiteContext};
use crate::services::nsrdb_csv::parse_hourly_csv;
use crate::services::record_preparer::{add_declination, prepare};
use crate::services::solar_calculations::{monthly_ghi_at_tilt, monthly_optimal_tilts};

/// Site and presentation parameters of one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportParams {
    pub latitude: f64,
    pub longitude: Option<f64>,
    pub year: Option<i32>,
    pub sky_condition: SkyCondition,
    pub generate_charts: bool,
}

/// JSON entry point: prepare the submitted rows and run every arrangement.
pub fn run_analysis(request: AnalysisRequest, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let params = ReportParams {
        latitude: request.latitude,
        longitude: request.longitude,
        year: request.year,
        sky_condition: request.sky_condition.unwrap_or(config.default_sky_condition),
        generate_charts: request.generate_charts,
    };
    analyze_records(request.records, params, config, 0)
}

/// CSV entry point: same pipeline, rows read from an hourly export body.
pub fn run_csv_analysis(body: &[u8], query: CsvAnalysisQuery, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let ingest = parse_hourly_csv(body, config.csv_metadata_rows)?;
    let params = ReportParams {
        latitude: query.latitude,
        longitude: query.longitude,
        year: None,
        sky_condition: query.sky_condition.unwrap_or(config.default_sky_condition),
        generate_charts: query.generate_charts,
    };
    analyze_records(ingest.records, params, config, ingest.rows_skipped)
}

fn analyze_records(
    records: Vec<RawRecord>,
    params: ReportParams,
    config: &AnalysisConfig,
    unreadable_rows: usize,
) -> Result<AnalysisReport> {
    validate_latitude(params.latitude)?;
    let dataset = prepare(&add_declination(records)).map_err(|e| match e {
        AnalysisError::EmptyDataset { dropped } => AnalysisError::EmptyDataset { dropped: dropped + unreadable_rows },
        other => other,
    })?;

    let mut report = analyze_dataset(&dataset, params, config);
    report.records_dropped += unreadable_rows;
    Ok(report)
}

pub fn validate_latitude(latitude: f64) -> Result<()> {
    if latitude.is_finite() && (-90.0..=90.0).contains(&latitude) {
        Ok(())
    } else {
        Err(AnalysisError::InvalidInput(format!("latitude must be within [-90, 90], got {latitude}")))
    }
}

/// Runs the six arrangements under both skies over an already prepared
/// dataset and assembles the report.
pub fn analyze_dataset(dataset: &PreparedDataset, params: ReportParams, config: &AnalysisConfig) -> AnalysisReport {
    let started = Instant::now();
    let id = Uuid::new_v4();
    let site = SiteContext::new(dataset, params.latitude).with_policy(config.zero_irradiance_policy);

    tracing::info!(%id, latitude = params.latitude, records = dataset.len(), "analysis started");

    let yields = evaluate_all(&site, config.parallel);
    let results: Vec<ArrangementRow> = yields
        .chunks_exact(SkyCondition::ALL.len())
        .map(|pair| arrangement_row(&pair[0], &pair[1], params.latitude))
        .collect();

    let charts = params
        .generate_charts
        .then(|| chart_series(&site, params.sky_condition, &results));

    tracing::info!(%id, elapsed_ms = started.elapsed().as_millis() as u64, "analysis finished");

    AnalysisReport {
        id,
        latitude: params.latitude,
        longitude: params.longitude,
        year: params.year.or_else(|| dataset.year()),
        sky_condition: params.sky_condition,
        records_used: dataset.len(),
        records_dropped: dataset.dropped(),
        results,
        charts,
    }
}

/// All arrangement × sky evaluations, ordered by arrangement then
/// [`SkyCondition::ALL`]. Every evaluation only reads the dataset, so the
/// parallel and sequential paths produce identical output.
pub fn evaluate_all(site: &SiteContext<'_>, parallel: bool) -> Vec<ArrangementYield> {
    let pairs: Vec<(Arrangement, SkyCondition)> = Arrangement::ALL
        .iter()
        .flat_map(|&a| SkyCondition::ALL.map(|sky| (a, sky)))
        .collect();

    if parallel {
        pairs.par_iter().map(|&(a, sky)| a.evaluate(site, sky)).collect()
    } else {
        pairs.iter().map(|&(a, sky)| a.evaluate(site, sky)).collect()
    }
}

fn arrangement_row(cloudy: &ArrangementYield, clear: &ArrangementYield, latitude: f64) -> ArrangementRow {
    let arrangement = cloudy.arrangement;
    ArrangementRow {
        number: arrangement.number(),
        arrangement,
        name: arrangement.label(latitude),
        cloudy_ghi: cloudy.total,
        clear_ghi: clear.total,
        cloudy_tilts: cloudy.periods.iter().map(PeriodTilt::from).collect(),
        clear_tilts: clear.periods.iter().map(PeriodTilt::from).collect(),
    }
}

fn chart_series(site: &SiteContext<'_>, sky: SkyCondition, rows: &[ArrangementRow]) -> ChartSeries {
    let flat = monthly_ghi_at_tilt(site.dataset, 0.0, sky, site.latitude_rad, site.policy);
    let at_latitude = monthly_ghi_at_tilt(site.dataset, site.latitude_deg, sky, site.latitude_rad, site.policy);

    let monthly_ghi = flat
        .into_iter()
        .zip(at_latitude)
        .map(|((month, fixed_horizontal), (_, fixed_latitude))| MonthlyGhi { month, fixed_horizontal, fixed_latitude })
        .collect();

    let monthly_optimal = monthly_optimal_tilts(site.dataset, sky, site.latitude_rad, site.policy)
        .into_iter()
        .map(|(month, best)| MonthlyOptimum { month, optimal_tilt: best.tilt_deg, max_ghi: best.ghi })
        .collect();

    ChartSeries {
        sky_condition: sky,
        monthly_ghi,
        monthly_optimal,
        improvements: improvements(rows, sky),
    }
}

/// Percentage gain of each arrangement over arrangement 1 for `sky`.
///
/// Only strictly positive gains are returned. Without a positive baseline
/// there is nothing to compare against and the list is empty.
pub fn improvements(rows: &[ArrangementRow], sky: SkyCondition) -> Vec<Improvement> {
    let ghi = |row: &ArrangementRow| match sky {
        SkyCondition::Cloudy => row.cloudy_ghi,
        SkyCondition::Clear => row.clear_ghi,
    };
    let Some(base) = rows
        .iter()
        .find(|r| r.arrangement == Arrangement::FixedHorizontal)
        .map(ghi)
        .filter(|&b| b > 0.0)
    else {
        return Vec::new();
    };

    rows.iter()
        .filter(|r| r.arrangement != Arrangement::FixedHorizontal)
        .map(|r| Improvement {
            arrangement: r.arrangement,
            name: r.name.clone(),
            percent: (ghi(r) - base) / base * 100.0,
        })
        .filter(|imp| imp.percent > 0.0)
        .collect()
}

/// Runs a blocking analysis off the async runtime, bounded by
/// `timeout_secs`. The worker is not interrupted on timeout; its result is
/// discarded.
pub async fn run_with_timeout<F>(timeout_secs: u64, job: F) -> Result<AnalysisReport>
where
    F: FnOnce() -> Result<AnalysisReport> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(job);
    match tokio::time::timeout(Duration::from_secs(timeout_secs), handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(AnalysisError::Internal(format!("analysis task failed: {join_err}"))),
        Err(_) => {
            tracing::error!(timeout_secs, "analysis timed out");
            Err(AnalysisError::Timeout(timeout_secs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::irradiance::{RawValue, ZeroIrradiancePolicy};
    use crate::services::solar_calculations::tests::{june_day, synthetic_year, GAINESVILLE_LAT};

    fn params(generate_charts: bool) -> ReportParams {
        ReportParams {
            latitude: GAINESVILLE_LAT,
            longitude: Some(-82.3),
            year: None,
            sky_condition: SkyCondition::Cloudy,
            generate_charts,
        }
    }

    fn raw_rows() -> Vec<RawRecord> {
        june_day()
            .into_iter()
            .map(|r| RawRecord {
                year: Some(2022.0.into()),
                month: Some((r.month as f64).into()),
                day: Some(21.0.into()),
                hour: r.hour.map(|h| RawValue::from(h as f64)),
                minute: Some(30.0.into()),
                dhi: Some(r.dhi.into()),
                dni: Some(r.dni.into()),
                clearsky_dhi: Some(r.clearsky_dhi.into()),
                clearsky_dni: Some(r.clearsky_dni.into()),
                declination_angle: None,
            })
            .collect()
    }

    #[test]
    fn test_report_has_twelve_scalars_in_order() {
        let ds = synthetic_year();
        let report = analyze_dataset(&ds, params(false), &AnalysisConfig::default());
        assert_eq!(report.results.len(), 6);
        assert_eq!(report.results.iter().map(|r| r.number).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(report.results[1].name, "Arr. 2: 29.6° Fixed (Lat)");
        assert_eq!(report.results[3].cloudy_tilts.len(), 12);
        assert_eq!(report.year, Some(2022));
        assert_eq!(report.records_used, ds.len());
        assert!(report.charts.is_none());
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let ds = synthetic_year();
        let site = SiteContext::new(&ds, GAINESVILLE_LAT);
        assert_eq!(evaluate_all(&site, true), evaluate_all(&site, false));
    }

    #[test]
    fn test_chart_series() {
        let ds = synthetic_year();
        let report = analyze_dataset(&ds, params(true), &AnalysisConfig::default());
        let charts = report.charts.unwrap();
        assert_eq!(charts.sky_condition, SkyCondition::Cloudy);
        assert_eq!(charts.monthly_ghi.len(), 12);
        assert_eq!(charts.monthly_optimal.len(), 12);

        let flat_sum: f64 = charts.monthly_ghi.iter().map(|m| m.fixed_horizontal).sum();
        assert!((flat_sum - report.results[0].cloudy_ghi).abs() < 1e-6);
        let monthly_sum: f64 = charts.monthly_optimal.iter().map(|m| m.max_ghi).sum();
        assert!((monthly_sum - report.results[3].cloudy_ghi).abs() < 1e-6);

        assert!(charts.improvements.iter().all(|i| i.percent > 0.0));
        assert!(charts.improvements.iter().all(|i| i.arrangement != Arrangement::FixedHorizontal));
        assert!(charts.improvements.iter().any(|i| i.arrangement == Arrangement::AnnualOptimal));
    }

    #[test]
    fn test_improvements_need_positive_baseline() {
        let row = |a: Arrangement, ghi: f64| ArrangementRow {
            number: a.number(),
            arrangement: a,
            name: a.label(30.0),
            cloudy_ghi: ghi,
            clear_ghi: ghi * 2.0,
            cloudy_tilts: Vec::new(),
            clear_tilts: Vec::new(),
        };
        let rows = vec![
            row(Arrangement::FixedHorizontal, 100.0),
            row(Arrangement::FixedLatitude, 90.0),
            row(Arrangement::AnnualOptimal, 125.0),
        ];
        let imp = improvements(&rows, SkyCondition::Cloudy);
        assert_eq!(imp.len(), 1);
        assert_eq!(imp[0].arrangement, Arrangement::AnnualOptimal);
        assert!((imp[0].percent - 25.0).abs() < 1e-12);

        let dark = vec![row(Arrangement::FixedHorizontal, 0.0), row(Arrangement::AnnualOptimal, 5.0)];
        assert!(improvements(&dark, SkyCondition::Clear).is_empty());
    }

    #[test]
    fn test_run_analysis_end_to_end() {
        let request = AnalysisRequest {
            latitude: GAINESVILLE_LAT,
            longitude: None,
            year: None,
            sky_condition: Some(SkyCondition::Clear),
            generate_charts: true,
            records: raw_rows(),
        };
        let config = AnalysisConfig {
            zero_irradiance_policy: ZeroIrradiancePolicy::KeepAll,
            parallel: false,
            ..AnalysisConfig::default()
        };
        let report = run_analysis(request, &config).unwrap();
        assert_eq!(report.records_used, 24);
        assert_eq!(report.sky_condition, SkyCondition::Clear);
        assert_eq!(report.charts.unwrap().sky_condition, SkyCondition::Clear);
        for row in &report.results {
            assert!(row.cloudy_ghi <= row.clear_ghi, "{}", row.name);
        }
    }

    #[test]
    fn test_run_analysis_rejects_bad_input() {
        let mut request = AnalysisRequest {
            latitude: 95.0,
            longitude: None,
            year: None,
            sky_condition: None,
            generate_charts: false,
            records: raw_rows(),
        };
        let config = AnalysisConfig::default();
        assert!(matches!(run_analysis(request.clone(), &config), Err(AnalysisError::InvalidInput(_))));

        request.latitude = 10.0;
        request.records.clear();
        assert!(matches!(run_analysis(request, &config), Err(AnalysisError::EmptyDataset { .. })));
    }

    #[test]
    fn test_run_csv_analysis() {
        let body = "\
Source,Latitude
NSRDB,29.65
Year,Month,Day,Hour,Minute,Clearsky DHI,Clearsky DNI,DHI,DNI
2022,3,20,11,30,95,880,120,600
2022,3,20,12,30,100,900,130,640
2022,3,20,13,30,bad,900,130,640
";
        let query = CsvAnalysisQuery {
            latitude: GAINESVILLE_LAT,
            longitude: Some(-82.3),
            sky_condition: None,
            generate_charts: false,
        };
        let report = run_csv_analysis(body.as_bytes(), query, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.records_used, 2);
        assert_eq!(report.records_dropped, 1);
        assert_eq!(report.year, Some(2022));
        let annual = &report.results[5];
        assert!(annual.cloudy_ghi >= report.results[0].cloudy_ghi);
    }

    #[tokio::test]
    async fn test_timeout_wrapper() {
        let ok = run_with_timeout(5, || analyze_records(raw_rows(), params(false), &AnalysisConfig::default(), 0)).await;
        assert!(ok.is_ok());

        let slow = run_with_timeout(0, || {
            std::thread::sleep(Duration::from_millis(200));
            Err(AnalysisError::Internal("unreachable".to_string()))
        })
        .await;
        assert!(matches!(slow, Err(AnalysisError::Timeout(0))));
    }
}
