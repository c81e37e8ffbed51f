//! Pipeline configuration.
//!
//! Settings come from an optional JSON file, then environment variables,
//! then command-line flags, each layer overriding the previous one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::chunker::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";

/// Top-level settings for one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory holding one subdirectory per bid group
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Directory receiving `<group>_consolidated.json` files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Whether the oracle is consulted after the rules
    #[serde(default = "default_true")]
    pub use_oracle: bool,
    #[serde(default)]
    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

/// Settings handed to the oracle adapter's constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Usually supplied through the environment; never serialized
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Number of leading chunks sent to the oracle
    #[serde(default = "default_chunk_limit")]
    pub chunk_limit: usize,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_true() -> bool {
    true
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("data/raw_documents")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_chunk_limit() -> usize {
    8
}

fn default_max_tokens() -> u32 {
    4096
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            api_url: default_api_url(),
            chunk_limit: default_chunk_limit(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            chunking: ChunkingConfig::default(),
            use_oracle: true,
            oracle: OracleConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file if given, otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENROUTER_API_KEY") {
            self.oracle.api_key = Some(key);
        }
        if let Some(dir) = lookup("BID_INPUT_DIR") {
            self.input_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("BID_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(model) = lookup("ORACLE_MODEL") {
            self.oracle.model = model;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than 0");
        }
        if self.chunking.overlap >= self.chunking.chunk_size {
            anyhow::bail!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.overlap,
                self.chunking.chunk_size
            );
        }
        if self.oracle.chunk_limit == 0 {
            anyhow::bail!("oracle.chunk_limit must be greater than 0");
        }
        if self.use_oracle
            && self
                .oracle
                .api_key
                .as_deref()
                .map_or(true, |k| k.trim().is_empty())
        {
            anyhow::bail!(
                "Oracle enabled but OPENROUTER_API_KEY is not set (use --rules-only to skip it)"
            );
        }
        Ok(())
    }
}
