use std::time::Duration;

use thiserror::Error;

/// Application-wide error types for the PAR fetchers.
#[derive(Error, Debug)]
pub enum AppError {
    /// Transport failure (connect, reset, invalid URL).
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Remote answered with a throttling status (429).
    #[error("Rate limited by remote (HTTP {status}) for {url}")]
    RateLimited { status: u16, url: String },

    /// Remote answered with a non-2xx status.
    #[error("HTTP {status} for {url}")]
    BadStatus { status: u16, url: String },

    /// Response body exceeded the configured cap.
    #[error("Response body exceeds {limit} bytes")]
    BodyTooLarge { limit: u64 },

    /// The required table (or standings entry) was not found.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// Required columns were absent under every attempted column set.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Two rows on one side of a join share an identity key.
    #[error("Join ambiguity: duplicate identity key {0}")]
    JoinAmbiguity(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// CSV output failed.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Returns true if this error should stop the whole multi-season run
    /// instead of failing a single season.
    pub fn aborts_run(&self) -> bool {
        matches!(
            self,
            AppError::RateLimited { .. }
                | AppError::ConfigError(_)
                | AppError::CsvError(_)
                | AppError::IoError(_)
        )
    }

    /// Returns true if this error came from talking to the remote service.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_)
                | AppError::Timeout(_)
                | AppError::RateLimited { .. }
                | AppError::BadStatus { .. }
        )
    }
}
