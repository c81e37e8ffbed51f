//! Error types for per-file extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while turning one source file into a field map.
///
/// Every variant is recoverable at the file boundary: the pipeline logs it,
/// counts it in the group report and moves on to the next file.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// File extension has no registered decoder
    #[error("Unsupported file type: {}", .0.display())]
    UnsupportedType(PathBuf),

    /// Decoded text was blank
    #[error("No text extracted from {}", .0.display())]
    EmptyExtraction(PathBuf),

    /// Oracle call failed or returned unparsable content
    #[error("Oracle failure: {0}")]
    OracleFailure(String),

    /// A recognized field could not be rendered as a string
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Decoder failed on a supported file
    #[error("Failed to decode {}: {}", .path.display(), .reason)]
    Decode { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    pub fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ExtractionError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means "nothing to contribute" rather than a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, ExtractionError::EmptyExtraction(_))
    }
}

impl From<serde_json::Error> for ExtractionError {
    fn from(e: serde_json::Error) -> Self {
        ExtractionError::SchemaViolation(e.to_string())
    }
}
