//! Hybrid field extraction: deterministic rules first, oracle to fill gaps.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::chunker::Chunk;
use crate::oracle::FieldOracle;
use crate::rules::RuleSet;
use crate::schema::FieldMap;

/// Per-document extraction orchestrator.
pub struct HybridExtractor {
    rules: RuleSet,
    oracle: Option<Arc<dyn FieldOracle>>,
}

impl HybridExtractor {
    pub fn new(rules: RuleSet, oracle: Option<Arc<dyn FieldOracle>>) -> Self {
        if rules.is_empty() {
            warn!("No extraction rules compiled; fields come from the oracle only");
        } else {
            debug!("Hybrid extractor using {} rules", rules.len());
        }
        Self { rules, oracle }
    }

    /// Extractor that never consults an oracle.
    pub fn rules_only() -> Self {
        Self::new(RuleSet::default(), None)
    }

    pub fn with_oracle(oracle: Arc<dyn FieldOracle>) -> Self {
        Self::new(RuleSet::default(), Some(oracle))
    }

    /// Extract fields from one document's chunks.
    ///
    /// Rule matches are kept unless the oracle offers a non-empty value for
    /// the same field; null or blank oracle values never erase them.
    pub async fn extract(&self, chunks: &[Chunk], use_oracle: bool) -> FieldMap {
        let full_text = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let mut results = self.rules.apply(&full_text);
        debug!("Rules matched {} fields", results.len());

        if !use_oracle {
            return results;
        }

        let Some(oracle) = &self.oracle else {
            warn!("Oracle requested but none configured; using rule matches only");
            return results;
        };

        let oracle_results = oracle.extract(chunks, &results).await;
        let mut filled = 0;
        for (key, value) in oracle_results {
            if value.is_empty() {
                continue;
            }
            results.insert(key, value);
            filled += 1;
        }
        debug!("Oracle '{}' supplied {} fields", oracle.name(), filled);

        results
    }
}
