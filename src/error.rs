//! Error kinds surfaced by the DailyMed adapter

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for every library operation
#[derive(Debug, Error)]
pub enum DailyMedError {
    /// Missing or unreadable mapping dataset; fatal at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid identifier or pagination parameters
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures talking to the DailyMed REST API
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("DailyMed API Error: {status} - {reason}")]
    Status { status: u16, reason: String },

    #[error("Network error - no response from DailyMed API: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected response from DailyMed API: {0}")]
    UnexpectedShape(String),
}

/// Failures turning an SPL XML document into an `SplDocument`
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid SPL document structure")]
    InvalidStructure,

    #[error("Failed to parse SPL XML: {0}")]
    Xml(String),
}

/// Failures loading the mapping datasets
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to read mapping file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read mapping data: {0}")]
    Csv(#[from] csv::Error),
}

impl From<MappingError> for DailyMedError {
    fn from(err: MappingError) -> Self {
        DailyMedError::Configuration(err.to_string())
    }
}

impl DailyMedError {
    pub fn validation(message: impl Into<String>) -> Self {
        DailyMedError::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, DailyMedError>;
