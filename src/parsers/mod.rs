//! Document decoders.
//!
//! Each supported file type has its own decoder; [`parse_document`] picks one
//! by extension and returns cleaned, linear text.

pub mod docx;
pub mod html;
pub mod pdf;
pub mod text;

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::ExtractionError;

static PAGE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Page\s+\d+\s+of\s+\d+").expect("page marker pattern is valid"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace pattern is valid"));

/// Known document types, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    Html,
    Docx,
    Text,
}

impl DocumentKind {
    /// Match a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "html" | "htm" => Some(Self::Html),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Decode a file into normalized text.
pub fn parse_document(path: &Path) -> Result<String, ExtractionError> {
    let kind = DocumentKind::from_path(path)
        .ok_or_else(|| ExtractionError::UnsupportedType(path.to_path_buf()))?;

    let raw = match kind {
        DocumentKind::Pdf => pdf::extract_text(path)?,
        DocumentKind::Html => html::extract_text(path)?,
        DocumentKind::Docx => docx::extract_text(path)?,
        DocumentKind::Text => text::extract_text(path)?,
    };

    Ok(clean_text(&raw))
}

/// Drop "Page N of M" markers and collapse whitespace runs.
pub fn clean_text(text: &str) -> String {
    let without_pages = PAGE_MARKER.replace_all(text, "");
    let collapsed = WHITESPACE_RUN.replace_all(&without_pages, " ");
    collapsed.trim().to_string()
}
