//! Deterministic field extraction using regex rules.
//!
//! Pure functions, no async. Every rule runs independently against the full
//! document text and contributes at most its first match.

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::schema::{BidField, FieldMap, FieldValue};

/// A named rule: which field it fills and the pattern that finds it.
///
/// The value is the first capture group that took part in the match, or the
/// whole match when the pattern has none.
#[derive(Debug, Clone)]
pub struct RulePattern {
    pub field: BidField,
    pub pattern: &'static str,
}

/// The fixed rule set, in evaluation order.
pub fn default_rules() -> Vec<RulePattern> {
    vec![
        RulePattern {
            field: BidField::BidNumber,
            pattern: r"\b(?:RFP|BID|JA)[\s#:-]*\d{3,7}\b",
        },
        RulePattern {
            field: BidField::DueDate,
            // A bare "Due" only counts when a month name or digit follows
            pattern: concat!(
                r"\b(?:(?:Due|Closing|Submission)\s*(?:Date|Time)\b[:\s]*([A-Za-z0-9 ,:/-]+)",
                r"|Due[:\s]+((?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d[A-Za-z0-9 ,:/-]*",
                r"|\d[A-Za-z0-9 ,:/-]*))",
            ),
        },
        RulePattern {
            field: BidField::ContactInfo,
            pattern: r"[\w\.-]+@[\w\.-]+\.\w+|\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}",
        },
        RulePattern {
            field: BidField::CompanyName,
            pattern: r"(?:Company\s*Name)[:\s]*([A-Za-z0-9 &.,'-]+)",
        },
        RulePattern {
            field: BidField::Title,
            pattern: r"(?:Title|Solicitation)\s*[:\-]?\s*(.*)",
        },
    ]
}

/// Pre-compiled rules ready for matching.
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

struct CompiledRule {
    field: BidField,
    regex: Regex,
}

impl RuleSet {
    /// Compile rules case-insensitively. Skips invalid regexes with a warning.
    pub fn compile(patterns: &[RulePattern]) -> Self {
        let mut rules = Vec::new();
        for p in patterns {
            match RegexBuilder::new(p.pattern).case_insensitive(true).build() {
                Ok(regex) => rules.push(CompiledRule {
                    field: p.field,
                    regex,
                }),
                Err(e) => {
                    warn!(
                        "Skipping invalid rule for '{}' ({}): {}",
                        p.field.label(),
                        p.pattern,
                        e
                    );
                }
            }
        }
        debug!("Compiled {} extraction rules", rules.len());
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule against `text`, keeping the first non-empty match per field.
    pub fn apply(&self, text: &str) -> FieldMap {
        let mut results = FieldMap::new();

        for rule in &self.rules {
            let Some(cap) = rule.regex.captures(text) else {
                continue;
            };
            let value = cap
                .iter()
                .skip(1)
                .flatten()
                .next()
                .or_else(|| cap.get(0))
                .map(|m| m.as_str().trim())
                .unwrap_or_default();

            if value.is_empty() {
                continue;
            }

            results
                .entry(rule.field.label().to_string())
                .or_insert_with(|| FieldValue::text(value));
        }

        results
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::compile(&default_rules())
    }
}

/// Apply the default rule set.
#[cfg(test)]
pub fn apply_rules(text: &str) -> FieldMap {
    RuleSet::default().apply(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "RFP JA-207652 Student and Staff Computing Devices \
        Proposals Due July 9, 2024 at 2:00 PM CST \
        Dallas ISD ProcurementCS@dallasisd.org";

    fn get<'a>(map: &'a FieldMap, field: BidField) -> Option<&'a str> {
        match map.get(field.label()) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_compile_default_rules() {
        assert_eq!(RuleSet::default().len(), 5);
    }

    #[test]
    fn test_dallas_rfp_sample() {
        let results = apply_rules(SAMPLE);
        assert_eq!(get(&results, BidField::BidNumber), Some("JA-207652"));
        assert!(get(&results, BidField::DueDate).unwrap().contains("July 9, 2024"));
        assert_eq!(
            get(&results, BidField::ContactInfo),
            Some("ProcurementCS@dallasisd.org")
        );
        assert!(!results.contains_key(BidField::Title.label()));
        assert!(!results.contains_key(BidField::CompanyName.label()));
    }

    #[test]
    fn test_rules_are_idempotent() {
        let rules = RuleSet::default();
        assert_eq!(rules.apply(SAMPLE), rules.apply(SAMPLE));
    }

    #[test]
    fn test_first_match_only() {
        let text = "Contact: first@agency.gov or second@agency.gov";
        let results = apply_rules(text);
        assert_eq!(get(&results, BidField::ContactInfo), Some("first@agency.gov"));
    }

    #[test]
    fn test_case_insensitive_capture_group() {
        let text = "COMPANY NAME: Acme Supply Co.\nsolicitation: Network Switches";
        let results = apply_rules(text);
        assert_eq!(get(&results, BidField::CompanyName), Some("Acme Supply Co."));
        assert_eq!(get(&results, BidField::Title), Some("Network Switches"));
    }

    #[test]
    fn test_due_date_label_form() {
        let results = apply_rules("Submission Date: 08/15/2024 10:00 AM");
        assert_eq!(get(&results, BidField::DueDate), Some("08/15/2024 10:00 AM"));
    }

    #[test]
    fn test_due_date_skips_submission_type_line() {
        let results = apply_rules("Bid Submission Type: Electronic. Proposals Due July 9, 2024");
        assert_eq!(get(&results, BidField::DueDate), Some("July 9, 2024"));
    }

    #[test]
    fn test_due_date_ignores_due_to_phrase() {
        let results = apply_rules("Pricing is due to change. Closing Date: 08/15/2024");
        assert_eq!(get(&results, BidField::DueDate), Some("08/15/2024"));
    }

    #[test]
    fn test_bare_due_before_numeric_date() {
        let results = apply_rules("All responses due 07/09/2024 by noon");
        assert_eq!(get(&results, BidField::DueDate), Some("07/09/2024 by noon"));
    }

    #[test]
    fn test_submission_without_date_word_not_matched() {
        let results = apply_rules("Submission Instructions: upload through the portal");
        assert!(!results.contains_key(BidField::DueDate.label()));
    }

    #[test]
    fn test_phone_contact() {
        let results = apply_rules("Questions may be directed to (972) 925-3700.");
        assert_eq!(get(&results, BidField::ContactInfo), Some("(972) 925-3700"));
    }

    #[test]
    fn test_no_matches_yield_empty_map() {
        assert!(apply_rules("nothing of interest here").is_empty());
        assert!(apply_rules("").is_empty());
    }

    #[test]
    fn test_empty_capture_is_skipped() {
        let results = apply_rules("Title:");
        assert!(!results.contains_key(BidField::Title.label()));
    }

    #[test]
    fn test_invalid_rule_skipped() {
        let rules = RuleSet::compile(&[RulePattern {
            field: BidField::Product,
            pattern: r"[invalid",
        }]);
        assert!(rules.is_empty());
    }
}
