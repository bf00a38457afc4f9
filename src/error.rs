use thiserror::Error;

/// Request-level failures of an analysis.
///
/// Row-level coercion problems never show up here on their own: the Record
/// Preparer drops the row and only reports `EmptyDataset` when nothing
/// survives.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("No usable hourly records ({dropped} rows dropped during preparation)")]
    EmptyDataset { dropped: usize },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Analysis did not finish within {0} s")]
    Timeout(u64),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
