//! Live curation against the configured providers.

use curator_config::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::{build_router, curator_from_config, load_pool, write_feed};

/// Input parameters for the Run command strategy.
#[derive(Debug, Clone)]
pub struct RunInput {
    /// JSON file of feed items
    pub input: PathBuf,
    /// Config file override (defaults to ~/curator/config.json)
    pub config: Option<PathBuf>,
    /// Output directory override
    pub output_dir: Option<PathBuf>,
}

/// Strategy for a full pass: ingest, select, quorum, cluster, write pages.
#[derive(Debug, Clone, Copy)]
pub struct RunStrategy;

impl super::CommandStrategy for RunStrategy {
    type Input = RunInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = match &input.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        let pool = load_pool(&input.input)?;
        let router = build_router(&config)?;
        let curator = curator_from_config(&config, Arc::new(router));

        info!(
            "Starting curation: {} models, {} runs per batch, threshold {}",
            config.models.len(),
            config.consensus.runs_per_batch,
            config.consensus.threshold
        );
        let curation = curator.curate(&pool).await?;

        let output_dir = input.output_dir.unwrap_or_else(|| config.output.dir.clone());
        write_feed(curation, &output_dir, config.output.max_feed_items)
    }
}
