//! DOCX decoder. Reads `word/document.xml` out of the zip container.

use regex::Regex;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

static PARAGRAPH_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</w:p>|<w:br\s*/>|<w:tab\s*/>").expect("paragraph pattern is valid"));
static XML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

pub fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ExtractionError::decode(path, e))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::decode(path, e))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(document_xml_to_text(&xml))
}

/// Paragraphs, breaks and tabs become line breaks; every other tag is dropped.
pub fn document_xml_to_text(xml: &str) -> String {
    let with_breaks = PARAGRAPH_END.replace_all(xml, "\n");
    let stripped = XML_TAG.replace_all(&with_breaks, "");
    unescape_xml(&stripped)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Addendum No. 2</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Company Name: Smith &amp; Sons </w:t></w:r><w:r><w:t>LLC</w:t></w:r></w:p>
</w:body></w:document>"#;

    #[test]
    fn test_document_xml_to_text() {
        let text = document_xml_to_text(BODY);
        assert_eq!(text, "Addendum No. 2\nCompany Name: Smith & Sons LLC");
    }

    #[test]
    fn test_extract_from_zip_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addendum.docx");

        let file = std::fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file(DOCUMENT_PART, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(BODY.as_bytes()).unwrap();
        writer.finish().unwrap();

        let text = extract_text(&path).unwrap();
        assert!(text.contains("Smith & Sons LLC"));
    }

    #[test]
    fn test_not_a_zip_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, "plain text pretending").unwrap();

        let result = extract_text(&path);
        assert!(matches!(result, Err(ExtractionError::Decode { .. })));
    }
}
