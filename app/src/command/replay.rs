//! Offline replay of recorded model responses.
//!
//! A session file holds the items and every response text in call order:
//! all selection runs first, then the clustering response (if any).

use curator_core::{CandidatePool, ConsensusConfig, Curator, ModelSpec, RawItem};
use curator_providers::ScriptedProvider;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

use super::write_feed;

/// Input parameters for the Replay command strategy.
#[derive(Debug, Clone)]
pub struct ReplayInput {
    /// Recorded session file
    pub session: PathBuf,
    /// Output directory
    pub output_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Session {
    items: Vec<RawItem>,
    responses: Vec<String>,
    #[serde(default)]
    threshold: Option<u32>,
    #[serde(default)]
    runs_per_batch: Option<u32>,
    #[serde(default)]
    batch_size: Option<usize>,
    #[serde(default = "Session::default_max_feed_items")]
    max_feed_items: usize,
}

impl Session {
    const fn default_max_feed_items() -> usize {
        100
    }

    fn consensus(&self) -> ConsensusConfig {
        let defaults = ConsensusConfig::default();
        ConsensusConfig {
            runs_per_batch: self.runs_per_batch.unwrap_or(defaults.runs_per_batch),
            threshold: self.threshold.unwrap_or(defaults.threshold),
            ..defaults
        }
    }

    fn model(&self) -> ModelSpec {
        let model = ModelSpec::new("replay");
        match self.batch_size {
            Some(size) => model.with_batch_size(size),
            None => model,
        }
    }
}

/// Strategy for replaying a recorded session through the same pipeline
/// with no network and no pacing.
#[derive(Debug, Clone, Copy)]
pub struct ReplayStrategy;

impl super::CommandStrategy for ReplayStrategy {
    type Input = ReplayInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let content = std::fs::read_to_string(&input.session).map_err(|e| {
            anyhow::anyhow!("Cannot read session {}: {e}", input.session.display())
        })?;
        let session: Session = serde_json::from_str(&content)?;
        info!(
            "Replaying {} responses over {} items",
            session.responses.len(),
            session.items.len()
        );

        let consensus = session.consensus();
        let model = session.model();
        let max_items = session.max_feed_items;
        let provider = ScriptedProvider::new(session.responses);
        let pool = CandidatePool::from_items(session.items);

        let curator = Curator::new(provider, vec![model]).with_consensus(consensus);
        let curation = curator.curate(&pool).await?;
        write_feed(curation, &input.output_dir, max_items)
    }
}
