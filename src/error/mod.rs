//! Error handling for the policing-intensity pipeline.
//!
//! Every failure is fatal to the run: the pipeline never writes a partial
//! set of output artifacts after an error.

use thiserror::Error;

/// Specialized error type for the analysis pipeline
#[derive(Debug, Error)]
pub enum StudyError {
    /// Geographic identifier too short to carry a 12-character block-group code
    #[error("malformed geographic identifier '{0}': need at least 12 characters")]
    MalformedIdentifier(String),

    /// The arrest data and the population table share no block group
    #[error("no geographic overlap between arrest data and population table")]
    NoGeographicOverlap,

    /// Cumulative population never reaches a configured cut threshold
    #[error(
        "cumulative population reaches only {reached_pct:.1}%, below the {threshold_pct}% cut threshold"
    )]
    ThresholdUnreachable { threshold_pct: f64, reached_pct: f64 },

    /// A disparity ratio's denominator tier has zero computed risk
    #[error("cannot compute {measure} disparity: {tier} risk is zero")]
    DivisionByZeroRisk { measure: String, tier: String },

    /// Census API unreachable, non-200 response, or unusable payload
    #[error("census fetch failed: {0}")]
    ExternalFetchFailure(String),

    /// Required column missing from the arrest dataset
    #[error("column '{0}' missing from arrest data")]
    MissingColumn(String),

    /// Column present but with a type the loader cannot decode
    #[error("column '{column}' has unsupported type; expected {expected}")]
    ColumnType { column: String, expected: String },

    /// No arrest records to analyze
    #[error("arrest dataset is empty")]
    EmptyDataset,

    /// Arrest dates span zero days, so rates cannot be annualized
    #[error("arrest dates span zero days; cannot annualize risks")]
    ZeroDateSpan,

    /// Configuration rejected before the pipeline starts
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error decoding Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Error processing Arrow record batches
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error reading or writing a CSV artifact
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Transport-level error talking to the census API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error decoding the census JSON payload
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error rendering the chart panel
    #[error("chart error: {0}")]
    Chart(String),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, StudyError>;
