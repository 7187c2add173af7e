//! Error types shared by the accessor and the feature pipeline.

use thiserror::Error;

/// Errors raised by the library.
///
/// Only contract violations (unknown dataset, unknown column) and I/O
/// failures surface here. Malformed survey values are degraded to nulls by
/// the parsers and never produce an error.
#[derive(Debug, Error)]
pub enum SurveyError {
    /// The dataset name is not one of the six raw survey tables.
    #[error("Dataset {0} not recognized.")]
    UnknownDataset(String),

    /// A required column is absent from a relation.
    #[error("Column {column} not found in dataset {dataset}.")]
    UnknownColumn { dataset: String, column: String },

    /// A derived column does not have one value per row.
    #[error("column {column} has {found} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    /// A pipeline step asked for a table no earlier step produced.
    #[error("table {0} has not been produced")]
    MissingTable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SurveyError>;
