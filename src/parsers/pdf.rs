//! PDF decoder using lopdf.

use lopdf::Document;
use std::path::Path;
use tracing::debug;

use crate::error::ExtractionError;

/// Extract text page by page. Pages that fail to decode are skipped.
pub fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    let doc = Document::load(path).map_err(|e| ExtractionError::decode(path, e))?;

    let mut text = String::new();
    let pages = doc.get_pages();

    for (page_num, _) in pages {
        match doc.extract_text(&[page_num]) {
            Ok(content) => {
                text.push_str(&content);
                text.push('\n');
            }
            Err(e) => debug!("Skipping page {} of {:?}: {}", page_num, path, e),
        }
    }

    Ok(text)
}
