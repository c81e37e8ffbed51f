//! Generative-text field oracle.
//!
//! Defines the [`FieldOracle`] trait the hybrid extractor consumes and the
//! OpenRouter-backed implementation. Every oracle honours a strict contract:
//! the returned map holds all 20 canonical labels, each a string or null.

use anyhow::Context;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::chunker::Chunk;
use crate::config::OracleConfig;
use crate::error::ExtractionError;
use crate::openrouter::{Message, OpenRouterClient};
use crate::schema::{null_field_map, BidField, FieldMap, FieldValue};

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([\]}])").expect("trailing comma pattern is valid"));

/// Async trait implemented by each oracle backend.
#[async_trait::async_trait]
pub trait FieldOracle: Send + Sync {
    fn name(&self) -> &str;

    /// Raw oracle call. May fail; may return a partial map.
    async fn try_extract(
        &self,
        chunks: &[Chunk],
        existing: &FieldMap,
    ) -> Result<FieldMap, ExtractionError>;

    /// Contract-honouring call: never fails, always returns every canonical label.
    async fn extract(&self, chunks: &[Chunk], existing: &FieldMap) -> FieldMap {
        match self.try_extract(chunks, existing).await {
            Ok(fields) => complete_fields(fields),
            Err(e) => {
                warn!("Oracle '{}' failed, substituting nulls: {}", self.name(), e);
                null_field_map()
            }
        }
    }
}

/// Keep only canonical fields (under their labels) and fill the rest with null.
pub fn complete_fields(fields: FieldMap) -> FieldMap {
    let mut complete = null_field_map();
    for (key, value) in fields {
        match BidField::from_key(&key) {
            Some(field) => {
                complete.insert(field.label().to_string(), value);
            }
            None => debug!("Dropping non-canonical oracle field '{}'", key),
        }
    }
    complete
}

/// Oracle backed by an OpenRouter chat model.
pub struct OpenRouterOracle {
    client: OpenRouterClient,
    chunk_limit: usize,
}

impl OpenRouterOracle {
    pub fn new(config: &OracleConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: OpenRouterClient::new(config)?,
            chunk_limit: config.chunk_limit.max(1),
        })
    }
}

#[async_trait::async_trait]
impl FieldOracle for OpenRouterOracle {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn try_extract(
        &self,
        chunks: &[Chunk],
        existing: &FieldMap,
    ) -> Result<FieldMap, ExtractionError> {
        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(build_user_prompt(chunks, existing, self.chunk_limit)),
        ];

        debug!(
            "Calling {} with {} of {} chunks",
            self.client.model(),
            chunks.len().min(self.chunk_limit),
            chunks.len()
        );

        let response = self
            .client
            .chat_json_object(messages)
            .await
            .map_err(|e| ExtractionError::OracleFailure(format!("{:#}", e)))?;

        parse_field_response(&response).map_err(|e| ExtractionError::OracleFailure(format!("{:#}", e)))
    }
}

const SYSTEM_PROMPT: &str = r#"You extract structured data from RFP and bid documents.

Rules:
1. Reply with ONLY a JSON object, no commentary.
2. Include every requested field, in the order given. Use null when the document does not state a value.
3. Keep values short and factual, not full sentences.
4. When several values exist, give the most specific one.
5. Write dates as "YYYY-MM-DD HH:MM" when the time is known, else "YYYY-MM-DD".
6. Never invent data."#;

/// Build the variable part of the prompt from the leading chunks.
pub fn build_user_prompt(chunks: &[Chunk], existing: &FieldMap, chunk_limit: usize) -> String {
    let fields = BidField::ALL
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{}. {}", i + 1, f.label()))
        .collect::<Vec<_>>()
        .join("\n");

    let known: Vec<String> = existing
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .filter_map(|(k, v)| v.flatten().map(|s| format!("- {}: {}", k, s)))
        .collect();

    let text = chunks
        .iter()
        .take(chunk_limit)
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let mut prompt = format!("Fields:\n{}\n\n", fields);
    if !known.is_empty() {
        prompt.push_str(&format!(
            "Already found by pattern matching (confirm or correct):\n{}\n\n",
            known.join("\n")
        ));
    }
    prompt.push_str(&format!(
        "--- DOCUMENT START ---\n\n{}\n\n--- DOCUMENT END ---",
        text
    ));
    prompt
}

/// Parse an oracle reply into a field map, tolerating fences and sloppy JSON.
pub fn parse_field_response(response: &str) -> anyhow::Result<FieldMap> {
    let json_str = extract_json_object(response).context("No JSON object in oracle response")?;

    let object: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(json_str) {
        Ok(obj) => obj,
        Err(_) => {
            let repaired = repair_json(json_str);
            serde_json::from_str(&repaired).with_context(|| {
                format!(
                    "Invalid JSON from oracle: {}",
                    json_str.chars().take(200).collect::<String>()
                )
            })?
        }
    };

    Ok(object
        .into_iter()
        .map(|(k, v)| (k, coerce_value(v)))
        .collect())
}

/// Strip code fences, then take the outermost `{...}` span.
fn extract_json_object(response: &str) -> Option<&str> {
    let body = if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(response)
    } else if response.contains("```") {
        response.split("```").nth(1).unwrap_or(response)
    } else {
        response
    };

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (start < end).then(|| &body[start..=end])
}

fn repair_json(json: &str) -> String {
    let quoted = json.replace('\'', "\"");
    TRAILING_COMMA.replace_all(&quoted, "$1").into_owned()
}

fn coerce_value(value: serde_json::Value) -> FieldValue {
    use serde_json::Value;
    match value {
        Value::Null => FieldValue::Null,
        Value::String(s) if s.trim().is_empty() => FieldValue::Null,
        Value::String(s) => FieldValue::Text(s.trim().to_string()),
        Value::Number(n) => FieldValue::Text(n.to_string()),
        Value::Bool(b) => FieldValue::Text(b.to_string()),
        Value::Array(items) => {
            let items: Vec<String> = items
                .into_iter()
                .filter_map(|v| match coerce_value(v) {
                    FieldValue::Text(s) => Some(s),
                    _ => None,
                })
                .collect();
            match items.len() {
                0 => FieldValue::Null,
                1 => FieldValue::Text(items.into_iter().next().unwrap_or_default()),
                _ => FieldValue::List(items),
            }
        }
        other @ Value::Object(_) => FieldValue::Text(other.to_string()),
    }
}
