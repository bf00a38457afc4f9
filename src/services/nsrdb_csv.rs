//! Reader for hourly irradiance CSV exports.
//!
//! The export starts with a fixed number of metadata lines (site id,
//! coordinates, units), followed by the real header row and one row per hour.
//! Columns are located by header name, so extra or reordered columns are fine.

use std::collections::HashMap;
use std::io::Read;

use csv::StringRecord;

use crate::error::{AnalysisError, Result};
use crate::models::irradiance::{RawRecord, RawValue};

const IRRADIANCE_COLUMNS: [&str; 4] = ["DHI", "DNI", "Clearsky DHI", "Clearsky DNI"];

/// Rows extracted from one CSV body.
#[derive(Debug, Clone, Default)]
pub struct CsvIngest {
    pub records: Vec<RawRecord>,
    pub rows_read: usize,
    /// Rows the CSV layer itself could not decode
    pub rows_skipped: usize,
}

pub fn parse_hourly_csv<R: Read>(input: R, metadata_rows: usize) -> Result<CsvIngest> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut rows = reader.records().skip(metadata_rows);
    let headers = match rows.next() {
        Some(header) => header?,
        None => return Err(AnalysisError::MissingColumn(IRRADIANCE_COLUMNS[0])),
    };
    let columns = header_map(&headers);
    if !IRRADIANCE_COLUMNS.iter().any(|c| columns.contains_key(*c)) {
        return Err(AnalysisError::MissingColumn(IRRADIANCE_COLUMNS[0]));
    }

    let mut ingest = CsvIngest::default();
    for (idx, row) in rows.enumerate() {
        ingest.rows_read += 1;
        match row {
            Ok(record) => ingest.records.push(raw_record(&record, &columns)),
            Err(e) => {
                // header is line metadata_rows + 1
                tracing::warn!(line = metadata_rows + idx + 2, "skipping unreadable CSV row: {e}");
                ingest.rows_skipped += 1;
            }
        }
    }

    tracing::debug!(rows = ingest.rows_read, skipped = ingest.rows_skipped, "parsed hourly CSV");
    Ok(ingest)
}

fn header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect()
}

fn raw_record(row: &StringRecord, columns: &HashMap<String, usize>) -> RawRecord {
    let cell = |name: &str| {
        columns
            .get(name)
            .and_then(|&i| row.get(i))
            .map(|v| RawValue::Text(v.to_string()))
    };

    RawRecord {
        year: cell("Year"),
        month: cell("Month"),
        day: cell("Day"),
        hour: cell("Hour"),
        minute: cell("Minute"),
        dhi: cell("DHI"),
        dni: cell("DNI"),
        clearsky_dhi: cell("Clearsky DHI"),
        clearsky_dni: cell("Clearsky DNI"),
        declination_angle: cell("Declination Angle"),
    }
}
