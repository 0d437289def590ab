//! Error types for the report pipeline

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while computing or writing a report
#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing configuration, raised before anything is written
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A dataset could not be fetched or has unexpected content
    #[error("Query for '{dataset}' failed: {message}")]
    UpstreamQuery { dataset: String, message: String },

    /// The live sheet does not have the layout a block expects
    #[error("Unexpected sheet layout: {0}")]
    SheetShape(String),

    /// A metric was computed without the dataset it needs
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Grid or table error
    #[error(transparent)]
    Core(#[from] kpi_sheets_core::Error),

    /// CSV or extract cache error
    #[error(transparent)]
    Csv(#[from] kpi_sheets_csv::CsvError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (configuration or workbook documents)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create an upstream query error for a dataset
    pub fn upstream<D: Into<String>, S: Into<String>>(dataset: D, message: S) -> Self {
        Error::UpstreamQuery {
            dataset: dataset.into(),
            message: message.into(),
        }
    }

    /// Create a sheet shape error
    pub fn shape<S: Into<String>>(msg: S) -> Self {
        Error::SheetShape(msg.into())
    }
}
