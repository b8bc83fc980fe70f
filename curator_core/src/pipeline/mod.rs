//! The curation pass: batched selection runs, quorum, clustering.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::candidate::{Candidate, CandidatePool};
use crate::cluster::{ClusterMap, ClusterResolver, ClusteringConfig};
use crate::consensus::{ConsensusConfig, QuorumFilter, Selection, VoteTally};
use crate::decision::{DecisionRecord, parse_decisions};
use crate::output::{OutputRecord, build_records};
use crate::{ChatOptions, LLMProvider, LLMResponse, extract, prompts};

/// One selection model and how it batches candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default = "ModelSpec::default_batch_size")]
    pub batch_size: usize,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display: None,
            batch_size: Self::default_batch_size(),
        }
    }

    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.name)
    }

    const fn default_batch_size() -> usize {
        100
    }
}

/// Everything one pass produced.
#[derive(Debug, Clone)]
pub struct Curation {
    pub selection: Selection,
    pub clusters: ClusterMap,
    pub records: Vec<OutputRecord>,
}

/// Why a single run contributed no votes.
enum RunFailure {
    Provider(anyhow::Error),
    Response(crate::Error),
}

/// Drives selection runs and clustering against one provider.
pub struct Curator<P = Arc<dyn LLMProvider>>
where
    P: Send + Sync,
{
    provider: P,
    models: Vec<ModelSpec>,
    consensus: ConsensusConfig,
    clustering: ClusteringConfig,
    run_delay: Duration,
}

impl<P> Curator<P>
where
    P: LLMProvider + Send + Sync,
{
    pub fn new(provider: P, models: Vec<ModelSpec>) -> Self {
        Self {
            provider,
            models,
            consensus: ConsensusConfig::default(),
            clustering: ClusteringConfig::default(),
            run_delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_consensus(mut self, consensus: ConsensusConfig) -> Self {
        self.consensus = consensus;
        self
    }

    #[must_use]
    pub fn with_clustering(mut self, clustering: ClusteringConfig) -> Self {
        self.clustering = clustering;
        self
    }

    /// Pause between runs of a batch and between batch groups.
    #[must_use]
    pub const fn with_run_delay(mut self, run_delay: Duration) -> Self {
        self.run_delay = run_delay;
        self
    }

    /// Total runs any one candidate is exposed to.
    #[must_use]
    pub fn expected_runs(&self) -> u32 {
        let models = u32::try_from(self.models.len()).unwrap_or(u32::MAX);
        self.consensus.runs_per_batch.saturating_mul(models)
    }

    /// Select, cluster, and build output records.
    pub async fn curate(&self, pool: &CandidatePool) -> anyhow::Result<Curation> {
        let selection = self.select(pool).await?;
        let clusters = self.cluster(pool, &selection).await;
        let records = build_records(pool, &selection, &clusters);
        info!(
            "Curation complete: {} analyzed, {} accepted, {} clusters",
            pool.len(),
            selection.len(),
            clusters.len()
        );
        Ok(Curation {
            selection,
            clusters,
            records,
        })
    }

    /// Run every model over every batch `runs_per_batch` times and apply the quorum.
    ///
    /// A run whose response cannot be read contributes no votes. Provider
    /// errors do the same unless `fail_fast` is set.
    pub async fn select(&self, pool: &CandidatePool) -> anyhow::Result<Selection> {
        let quorum = QuorumFilter::new(self.consensus.threshold, self.expected_runs())?;
        let mut tally = VoteTally::new(pool.len());

        if pool.is_empty() || self.models.is_empty() {
            info!("Nothing to select: {} candidates, {} models", pool.len(), self.models.len());
            return Ok(quorum.apply(tally));
        }

        let batches: Vec<Vec<&[Candidate]>> = self
            .models
            .iter()
            .map(|model| pool.batches(model.batch_size).collect())
            .collect();
        let group_count = batches.iter().map(Vec::len).max().unwrap_or(0);
        let runs = self.consensus.runs_per_batch;

        info!(
            "Processing {group_count} batch groups, {runs} runs per batch via {}",
            self.provider.name()
        );

        for group in 0..group_count {
            info!("Batch group {}/{}", group + 1, group_count);

            for (model, model_batches) in self.models.iter().zip(&batches) {
                let Some(batch) = model_batches.get(group) else {
                    info!("Skipping {} (no batch)", model.display_name());
                    continue;
                };
                info!(
                    "Model {} batch {} (size={})",
                    model.display_name(),
                    group + 1,
                    batch.len()
                );

                for run in 1..=runs {
                    let label = format!("{} Batch{}-Run{}", model.display_name(), group + 1, run);
                    info!("[{}] Run {run}/{runs} start", model.display_name());

                    match self.run_once(model, batch, pool.len()).await {
                        Ok(decisions) => match tally.record_decisions(&decisions, &label) {
                            0 => info!("[{}] Run {run} returned no selections", model.display_name()),
                            counted => info!(
                                "[{}] Run {run} selected {counted} articles",
                                model.display_name()
                            ),
                        },
                        Err(RunFailure::Response(e)) => {
                            warn!("[{}] Run {run} contributes no votes: {e}", model.display_name());
                        }
                        Err(RunFailure::Provider(e)) if self.consensus.fail_fast => {
                            return Err(e.context(format!("{label} failed")));
                        }
                        Err(RunFailure::Provider(e)) => {
                            warn!("[{}] Run {run} provider error, no votes: {e:#}", model.display_name());
                        }
                    }

                    if run < runs {
                        self.pace().await;
                    }
                }
            }

            if group + 1 < group_count {
                self.pace().await;
            }
        }

        let selection = quorum.apply(tally);
        info!(
            "Quorum: {} of {} voted articles selected {}+ times",
            selection.len(),
            selection.voted,
            selection.threshold
        );
        Ok(selection)
    }

    /// One clustering call over the accepted set; singletons on any failure.
    pub async fn cluster(&self, pool: &CandidatePool, selection: &Selection) -> ClusterMap {
        let resolver = ClusterResolver::new(selection.ids());
        if selection.is_empty() {
            return resolver.singletons();
        }
        if !self.clustering.enabled {
            info!("Clustering disabled; {} singleton clusters", selection.len());
            return resolver.singletons();
        }
        let Some(model) = self
            .clustering
            .model
            .as_deref()
            .or_else(|| self.models.first().map(|model| model.name.as_str()))
        else {
            warn!("No clustering model configured; using singletons");
            return resolver.singletons();
        };

        let accepted: Vec<&Candidate> = resolver
            .universe()
            .iter()
            .filter_map(|&id| pool.get(id))
            .collect();
        let messages = prompts::cluster_messages(&accepted, self.clustering.min_similarity);
        let options = ChatOptions::new(model)
            .with_temperature(self.clustering.temperature)
            .with_max_tokens(self.clustering.max_output_tokens);

        info!(
            "Sending {} accepted articles to {model} via {} for clustering",
            accepted.len(),
            self.provider.name()
        );
        match self.provider.chat(&messages, &options).await {
            Ok(response) => {
                log_usage(&options.model, &response);
                resolver.resolve_response(&response.content)
            }
            Err(e) => {
                warn!("Clustering call failed, using singletons: {e:#}");
                resolver.singletons()
            }
        }
    }

    async fn run_once(
        &self,
        model: &ModelSpec,
        batch: &[Candidate],
        candidate_count: usize,
    ) -> Result<Vec<DecisionRecord>, RunFailure> {
        let messages = prompts::selection_messages(batch);
        let options = ChatOptions::new(&model.name).with_temperature(self.consensus.temperature);

        let response = self
            .provider
            .chat(&messages, &options)
            .await
            .map_err(RunFailure::Provider)?;
        log_usage(&model.name, &response);
        let items = extract::extract_array(&response.content).map_err(RunFailure::Response)?;
        Ok(parse_decisions(&items, candidate_count))
    }

    async fn pace(&self) {
        if self.run_delay.is_zero() {
            return;
        }
        info!("Waiting {}s before next run...", self.run_delay.as_secs());
        tokio::time::sleep(self.run_delay).await;
    }
}

fn usage_line(response: &LLMResponse) -> Option<String> {
    response.usage.as_ref().map(|usage| {
        format!(
            "{} prompt + {} completion = {} tokens",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        )
    })
}

fn log_usage(model: &str, response: &LLMResponse) {
    if let Some(line) = usage_line(response) {
        debug!("{model} usage: {line}");
    }
}
