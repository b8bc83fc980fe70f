//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically from `main`.

use curator_config::{Config, ProviderKind};
use curator_core::{CandidatePool, Curation, Curator, LLMProvider, RawItem, paginate};
use curator_providers::{GeminiProvider, OpenAiCompatProvider, ProviderRouter};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::feed;

mod info;
mod init;
mod replay;
mod run;
mod version;

pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use replay::{ReplayInput, ReplayStrategy};
pub use run::{RunInput, RunStrategy};
pub use version::VersionStrategy;

const FEED_TITLE: &str = "Curated Geopolitical Feed";

/// Core trait defining the contract for all command strategies.
///
/// # Example
/// ```ignore
/// struct MyStrategy;
///
/// impl CommandStrategy for MyStrategy {
///     type Input = MyInput;
///
///     async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Items file: either a bare array or `{"items": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemsFile {
    List(Vec<RawItem>),
    Wrapped { items: Vec<RawItem> },
}

impl ItemsFile {
    fn into_items(self) -> Vec<RawItem> {
        match self {
            Self::List(items) | Self::Wrapped { items } => items,
        }
    }
}

fn load_pool(path: &Path) -> anyhow::Result<CandidatePool> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read items {}: {e}", path.display()))?;
    let items = serde_json::from_str::<ItemsFile>(&content)?.into_items();
    let offered = items.len();
    let pool = CandidatePool::from_items(items);
    info!(
        "Ingested {} candidates from {} items ({} skipped)",
        pool.len(),
        offered,
        offered - pool.len()
    );
    Ok(pool)
}

fn build_provider(config: &Config, kind: ProviderKind) -> anyhow::Result<Arc<dyn LLMProvider>> {
    let settings = config
        .providers
        .get(kind)
        .ok_or_else(|| anyhow::anyhow!("No credentials configured for provider {kind:?}"))?;
    let retry_delays = config.pacing.retry_delays_secs.clone();

    let provider: Arc<dyn LLMProvider> = match kind {
        ProviderKind::Gemini => {
            let mut provider =
                GeminiProvider::new(settings.api_key.clone()).with_retry_delays(retry_delays);
            if let Some(base_url) = &settings.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
        ProviderKind::OpenAi => {
            let mut provider =
                OpenAiCompatProvider::new(settings.api_key.clone()).with_retry_delays(retry_delays);
            if let Some(base_url) = &settings.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
    };
    Ok(provider)
}

/// One provider per kind in use, routed by model name. Unlisted models
/// (such as a dedicated clustering model) go to the first model's provider.
fn build_router(config: &Config) -> anyhow::Result<ProviderRouter> {
    let mut built: Vec<(ProviderKind, Arc<dyn LLMProvider>)> = Vec::new();
    let mut router = ProviderRouter::new();

    for model in &config.models {
        let provider = match built.iter().find(|(kind, _)| *kind == model.provider) {
            Some((_, provider)) => provider.clone(),
            None => {
                let provider = build_provider(config, model.provider)?;
                built.push((model.provider, provider.clone()));
                provider
            }
        };
        router = router.route(model.name.clone(), provider);
    }

    if let Some((_, first)) = built.first() {
        router = router.with_fallback(first.clone());
    }
    Ok(router)
}

fn write_feed(curation: Curation, output_dir: &Path, max_items: usize) -> anyhow::Result<()> {
    let pages = paginate(curation.records, max_items);
    info!(
        "Feed split: {} primary, {} overflow, {} dropped",
        pages.primary.len(),
        pages.overflow.len(),
        pages.dropped
    );
    let [primary, overflow] = feed::write_pages(output_dir, pages, FEED_TITLE)?;
    println!("Wrote {}", primary.display());
    println!("Wrote {}", overflow.display());
    Ok(())
}

fn curator_from_config(config: &Config, provider: Arc<dyn LLMProvider>) -> Curator {
    let mut clustering = config.clustering.clone();
    clustering.model = config.clustering_model().map(str::to_string);

    Curator::new(provider, config.model_specs())
        .with_consensus(config.consensus.clone())
        .with_clustering(clustering)
        .with_run_delay(config.pacing.run_delay())
}
