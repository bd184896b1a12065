//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Planning-time validation failures, the "no AOI overlap" condition and engine
//! failures are distinct variants so callers can branch on [`Error::kind`].
use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Malformed metadata in {source_name}: {reason}")]
    MalformedMetadata { source_name: String, reason: String },

    #[error("AOI `{aoi}` does not overlap any burst on {date}")]
    NoAoiOverlap { aoi: String, date: NaiveDate },

    #[error("Invalid partition: {0}")]
    InvalidPartition(String),

    #[error("At least 2 distinct acquisition dates are required for pairing, got {dates}")]
    InsufficientTemporalCoverage { dates: usize },

    #[error("Processing engine failed for {unit}: {message}")]
    EngineFailure { unit: String, message: String },

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Coarse classification used to decide what happens to a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The AOI does not touch the scene set; nothing to process.
    NoOverlap,
    /// Caller contract violation or unusable input. Never retried.
    InvalidInput,
    /// The external engine reported a failure.
    EngineFailure,
    /// Filesystem, archive or parser failure.
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoAoiOverlap { .. } => ErrorKind::NoOverlap,
            Error::EngineFailure { .. } => ErrorKind::EngineFailure,
            Error::MalformedMetadata { .. }
            | Error::InvalidPartition(_)
            | Error::InsufficientTemporalCoverage { .. }
            | Error::InvalidArgument { .. }
            | Error::MissingArgument { .. }
            | Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Io(_) | Error::Xml(_) | Error::Json(_) | Error::Zip(_) | Error::Metadata(_) => {
                ErrorKind::Io
            }
        }
    }

    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedMetadata {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}
