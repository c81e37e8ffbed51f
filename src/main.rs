//! Bid Extractor - batch extraction of procurement bid documents into canonical JSON records.

mod chunker;
mod config;
mod error;
mod extractor;
mod merge;
mod openrouter;
mod oracle;
mod parsers;
mod pipeline;
mod rules;
mod schema;
mod validator;

use clap::Parser;
use config::PipelineConfig;
use extractor::HybridExtractor;
use oracle::{FieldOracle, OpenRouterOracle};
use pipeline::Pipeline;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "bid-extractor", about = "Extract canonical bid records from document folders")]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory with one subdirectory per bid
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory for consolidated JSON output
    #[arg(long)]
    output: Option<PathBuf>,

    /// Skip the language-model oracle
    #[arg(long)]
    rules_only: bool,

    #[arg(long)]
    chunk_size: Option<usize>,

    #[arg(long)]
    overlap: Option<usize>,
}

impl Args {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(input) = &self.input {
            config.input_dir = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if self.rules_only {
            config.use_oracle = false;
        }
        if let Some(size) = self.chunk_size {
            config.chunking.chunk_size = size;
        }
        if let Some(overlap) = self.overlap {
            config.chunking.overlap = overlap;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "bid_extractor=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = PipelineConfig::load(args.config.as_deref())?;
    config.apply_env();
    args.apply(&mut config);
    config.validate()?;

    let extractor = if config.use_oracle {
        let oracle: Arc<dyn FieldOracle> = Arc::new(OpenRouterOracle::new(&config.oracle)?);
        info!("Oracle '{}' enabled ({})", oracle.name(), config.oracle.model);
        HybridExtractor::with_oracle(oracle)
    } else {
        info!("Running with extraction rules only");
        HybridExtractor::rules_only()
    };

    let chunker = chunker::Chunker::new(config.chunking.chunk_size, config.chunking.overlap);
    let pipeline = Pipeline::new(chunker, extractor, config.use_oracle, &config.output_dir);

    let report = pipeline.run(&config.input_dir).await?;

    for group in &report.groups {
        for issue in &group.issues {
            warn!("{} / {}: {}", group.name, issue.file, issue.reason);
        }
    }
    info!(
        "Processed {} bid folders, wrote {} records to {:?}",
        report.groups.len(),
        report.outputs_written(),
        config.output_dir
    );

    Ok(())
}
