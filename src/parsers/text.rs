//! Plain text decoder.

use std::path::Path;

use crate::error::ExtractionError;

/// Read a text file, replacing invalid UTF-8 sequences.
pub fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
