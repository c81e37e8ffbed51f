//! Maps a consolidated record onto the canonical bid schema.

use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ExtractionError;
use crate::merge::ConsolidatedRecord;
use crate::schema::{BidField, BidRecord};

/// Metadata key carrying the contributing file names.
pub const SOURCE_FILES_KEY: &str = "source_files";

const LIST_DELIMITER: &str = ", ";

/// Flatten list values, resolve field names, and collect unrecognized keys as metadata.
pub fn validate(record: ConsolidatedRecord) -> Result<BidRecord, ExtractionError> {
    let mut output = BidRecord::default();
    let mut metadata: BTreeMap<String, String> = BTreeMap::new();

    for (key, value) in record.fields {
        let Some(text) = value.flatten() else {
            continue;
        };

        match BidField::from_key(&key) {
            Some(field) => {
                let slot = output.slot_mut(field);
                match slot {
                    // Two spellings of the same field: keep both values
                    Some(current) => append_distinct(current, &text),
                    None => *slot = Some(text),
                }
            }
            None => {
                debug!("Keeping unrecognized field '{}' as metadata", key);
                metadata.insert(key, text);
            }
        }
    }

    if !record.sources.is_empty() {
        metadata.insert(SOURCE_FILES_KEY.to_string(), record.sources.join(LIST_DELIMITER));
    }

    for field in BidField::ALL {
        if let Some(value) = output.get(field) {
            if value.chars().any(|c| c == '\0') {
                return Err(ExtractionError::SchemaViolation(format!(
                    "{} contains a NUL character",
                    field.key()
                )));
            }
        }
    }

    output.additional_metadata = (!metadata.is_empty()).then_some(metadata);
    Ok(output)
}

fn append_distinct(current: &mut String, incoming: &str) {
    let present = current.split(LIST_DELIMITER).any(|v| v == incoming);
    if !present {
        current.push_str(LIST_DELIMITER);
        current.push_str(incoming);
    }
}

/// Serialize a validated record with two-space indentation.
pub fn to_json(record: &BidRecord) -> Result<String, ExtractionError> {
    Ok(serde_json::to_string_pretty(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge;
    use crate::schema::{FieldMap, FieldValue};

    fn consolidated(pairs: &[(&str, FieldValue)]) -> ConsolidatedRecord {
        ConsolidatedRecord {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            sources: Vec::new(),
        }
    }

    #[test]
    fn test_empty_record_has_all_fields_null() {
        let record = validate(ConsolidatedRecord::default()).unwrap();
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();

        for field in BidField::ALL {
            assert!(obj[field.key()].is_null(), "{} should be null", field.key());
        }
        assert_eq!(obj.len(), 21);
    }

    #[test]
    fn test_all_values_are_strings_or_null() {
        let record = validate(consolidated(&[
            ("Bid Number", FieldValue::text("JA-207652")),
            ("Model_no", FieldValue::List(vec!["5550".into(), "5560".into()])),
            ("Title", FieldValue::Null),
        ]))
        .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        for field in BidField::ALL {
            let v = &json[field.key()];
            assert!(v.is_string() || v.is_null());
        }
        assert_eq!(record.model_no.as_deref(), Some("5550, 5560"));
        assert_eq!(record.title, None);
    }

    #[test]
    fn test_labels_mapped_to_identifiers() {
        let record = validate(consolidated(&[
            ("Bid Number", FieldValue::text("JA-207652")),
            ("contact_info", FieldValue::text("ProcurementCS@dallasisd.org")),
            ("Any Additional Documentation Required", FieldValue::text("W-9")),
        ]))
        .unwrap();

        assert_eq!(record.get(BidField::BidNumber), Some("JA-207652"));
        assert_eq!(
            record.contact_info.as_deref(),
            Some("ProcurementCS@dallasisd.org")
        );
        assert_eq!(record.additional_documentation_required.as_deref(), Some("W-9"));

        let json = to_json(&record).unwrap();
        assert!(json.contains("\"Bid_Number\": \"JA-207652\""));
        assert!(json.contains("\n  \"Title\": null"));
    }

    #[test]
    fn test_unknown_keys_go_to_metadata() {
        let record = validate(consolidated(&[
            ("Vendor Rating", FieldValue::text("A")),
            ("Region", FieldValue::List(vec!["North".into(), "East".into()])),
        ]))
        .unwrap();
        let meta = record.additional_metadata.unwrap();
        assert_eq!(meta["Vendor Rating"], "A");
        assert_eq!(meta["Region"], "North, East");
    }

    #[test]
    fn test_alias_collision_keeps_both_values() {
        let record = validate(consolidated(&[
            ("Bid Number", FieldValue::text("JA-1")),
            ("Bid_Number", FieldValue::text("JA-2")),
        ]))
        .unwrap();
        assert_eq!(record.bid_number.as_deref(), Some("JA-1, JA-2"));
    }

    #[test]
    fn test_scenario_two_products_flattened() {
        let mut first = FieldMap::new();
        first.insert("Product".to_string(), FieldValue::text("Dell Latitude 5550"));
        let mut second = FieldMap::new();
        second.insert("Product".to_string(), FieldValue::text("Dell Latitude 5560"));

        let merged = merge(vec![first, second]);
        assert_eq!(
            merged.fields["Product"],
            FieldValue::List(vec![
                "Dell Latitude 5550".to_string(),
                "Dell Latitude 5560".to_string()
            ])
        );

        let record = validate(merged).unwrap();
        assert_eq!(
            record.product.as_deref(),
            Some("Dell Latitude 5550, Dell Latitude 5560")
        );
    }

    #[test]
    fn test_sources_emitted_as_metadata() {
        let record = validate(ConsolidatedRecord {
            fields: FieldMap::new(),
            sources: vec!["rfp.pdf".to_string(), "addendum.docx".to_string()],
        })
        .unwrap();
        assert_eq!(
            record.additional_metadata.unwrap()[SOURCE_FILES_KEY],
            "rfp.pdf, addendum.docx"
        );
    }

    #[test]
    fn test_nul_character_is_schema_violation() {
        let result = validate(consolidated(&[("Title", FieldValue::text("bad\0value"))]));
        assert!(matches!(result, Err(ExtractionError::SchemaViolation(_))));
    }
}
