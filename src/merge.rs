//! Cross-document merge for one bid group.
//!
//! Disagreeing values are never resolved by a tie-break: they are kept side
//! by side as a list, in the order they were first seen.

use serde::Serialize;
use std::collections::btree_map::Entry;

use crate::schema::{FieldMap, FieldValue};

/// Marker key attached to each per-file map before merging.
pub const SOURCE_FILE_KEY: &str = "source_file";

/// Merged field map for one bid group, plus the files that fed it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsolidatedRecord {
    pub fields: FieldMap,
    /// Contributing files, in merge order, without duplicates.
    pub sources: Vec<String>,
}

/// Merge per-file maps in input order.
pub fn merge(records: Vec<FieldMap>) -> ConsolidatedRecord {
    let mut consolidated = ConsolidatedRecord::default();

    for record in records {
        for (key, value) in record {
            if value.is_empty() {
                continue;
            }
            if key == SOURCE_FILE_KEY {
                for source in value.items() {
                    if !consolidated.sources.iter().any(|s| s == source) {
                        consolidated.sources.push(source.to_string());
                    }
                }
                continue;
            }
            merge_value(&mut consolidated.fields, key, value);
        }
    }

    consolidated
}

fn merge_value(fields: &mut FieldMap, key: String, value: FieldValue) {
    let existing = match fields.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(value);
            return;
        }
        Entry::Occupied(slot) => slot.into_mut(),
    };

    let current = existing.items();
    let mut fresh: Vec<String> = Vec::new();
    for item in value.items() {
        if item.trim().is_empty() || current.contains(&item) || fresh.iter().any(|f| f == item) {
            continue;
        }
        fresh.push(item.to_string());
    }

    // Every incoming value is already present
    if fresh.is_empty() {
        return;
    }

    if !matches!(existing, FieldValue::List(_)) {
        let promoted = existing.items().into_iter().map(str::to_string).collect();
        *existing = FieldValue::List(promoted);
    }

    if let FieldValue::List(list) = existing {
        list.extend(fresh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::text(*v)))
            .collect()
    }

    fn list(values: &[&str]) -> FieldValue {
        FieldValue::List(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_disjoint_keys_combined() {
        let merged = merge(vec![
            record(&[("Bid Number", "JA-1")]),
            record(&[("Title", "Laptops")]),
        ]);
        assert_eq!(merged.fields["Bid Number"], FieldValue::text("JA-1"));
        assert_eq!(merged.fields["Title"], FieldValue::text("Laptops"));
    }

    #[test]
    fn test_identical_values_deduplicated() {
        let merged = merge(vec![
            record(&[("Bid Number", "JA-1")]),
            record(&[("Bid Number", "JA-1")]),
        ]);
        assert_eq!(merged.fields["Bid Number"], FieldValue::text("JA-1"));
    }

    #[test]
    fn test_divergent_products_preserved_in_order() {
        let merged = merge(vec![
            record(&[("Product", "Dell Latitude 5550")]),
            record(&[("Product", "Dell Latitude 5560")]),
        ]);
        assert_eq!(
            merged.fields["Product"],
            list(&["Dell Latitude 5550", "Dell Latitude 5560"])
        );
    }

    #[test]
    fn test_repeated_value_does_not_grow_list() {
        let a = record(&[("Product", "A")]);
        let b = record(&[("Product", "B")]);
        let c = record(&[("Product", "B")]);

        let two = merge(vec![a.clone(), b.clone()]);
        let three = merge(vec![a, b, c]);
        assert_eq!(two.fields["Product"], list(&["A", "B"]));
        assert_eq!(three.fields, two.fields);
    }

    #[test]
    fn test_first_value_repeated_after_promotion() {
        let merged = merge(vec![
            record(&[("Product", "A")]),
            record(&[("Product", "B")]),
            record(&[("Product", "A")]),
            record(&[("Product", "C")]),
        ]);
        assert_eq!(merged.fields["Product"], list(&["A", "B", "C"]));
    }

    #[test]
    fn test_empty_values_skipped() {
        let mut second = record(&[("Title", "  ")]);
        second.insert("Product".to_string(), FieldValue::Null);
        let merged = merge(vec![record(&[("Title", "Laptops")]), second]);

        assert_eq!(merged.fields["Title"], FieldValue::text("Laptops"));
        assert!(!merged.fields.contains_key("Product"));
    }

    #[test]
    fn test_incoming_list_is_spread() {
        let mut second = FieldMap::new();
        second.insert("Model_no".to_string(), list(&["5550", "5560"]));
        let merged = merge(vec![record(&[("Model_no", "5550")]), second]);
        assert_eq!(merged.fields["Model_no"], list(&["5550", "5560"]));
    }

    #[test]
    fn test_equivalent_list_does_not_promote() {
        let mut second = FieldMap::new();
        second.insert("Product".to_string(), list(&["A"]));
        let merged = merge(vec![record(&[("Product", "A")]), second]);
        assert_eq!(merged.fields["Product"], FieldValue::text("A"));
    }

    #[test]
    fn test_incoming_list_duplicates_collapsed() {
        let mut second = FieldMap::new();
        second.insert("Product".to_string(), list(&["A", "B", "B"]));
        let merged = merge(vec![record(&[("Product", "A")]), second]);
        assert_eq!(merged.fields["Product"], list(&["A", "B"]));
    }

    #[test]
    fn test_source_files_kept_as_lineage() {
        let merged = merge(vec![
            record(&[("Product", "A"), (SOURCE_FILE_KEY, "rfp.pdf")]),
            record(&[("Product", "A"), (SOURCE_FILE_KEY, "addendum.docx")]),
        ]);
        assert_eq!(merged.sources, vec!["rfp.pdf", "addendum.docx"]);
        assert!(!merged.fields.contains_key(SOURCE_FILE_KEY));
    }

    #[test]
    fn test_empty_input() {
        let merged = merge(Vec::new());
        assert!(merged.fields.is_empty());
        assert!(merged.sources.is_empty());
    }
}
