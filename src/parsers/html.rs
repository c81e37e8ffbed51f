//! HTML decoder using scraper. Only visible text is kept.

use scraper::{Html, Node};
use std::path::Path;

use crate::error::ExtractionError;

/// Elements whose text is page chrome or code, not content.
const SKIPPED_ELEMENTS: [&str; 6] = ["script", "style", "nav", "footer", "header", "noscript"];

pub fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path)?;
    Ok(html_to_text(&String::from_utf8_lossy(&bytes)))
}

/// One line per non-blank text node, in document order.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| match a.value() {
            Node::Element(el) => SKIPPED_ELEMENTS.contains(&el.name()),
            _ => false,
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }

    lines.join("\n")
}
