use curator_config::{Config, ProviderConfig};

/// Strategy for displaying configuration information.
///
/// API keys are masked; everything else is printed as loaded.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== curator Configuration ===\n");

        println!("API Keys:");
        println!("  Gemini: {}", masked(config.providers.gemini.as_ref()));
        println!("  OpenAI: {}", masked(config.providers.openai.as_ref()));
        println!();

        println!("Models:");
        for model in &config.models {
            println!(
                "  {} ({}) via {:?}, batch size {}",
                model.name,
                model.display.as_deref().unwrap_or("-"),
                model.provider,
                model.batch_size
            );
        }
        println!();

        println!("Consensus:");
        println!("  Runs Per Batch: {}", config.consensus.runs_per_batch);
        println!("  Threshold: {}", config.consensus.threshold);
        println!("  Fail Fast: {}", config.consensus.fail_fast);
        println!("  Temperature: {}", config.consensus.temperature);
        println!();

        println!("Pacing:");
        println!("  Run Delay: {}s", config.pacing.run_delay_secs);
        println!("  Retry Delays: {:?}", config.pacing.retry_delays_secs);
        println!();

        println!("Clustering:");
        println!("  Enabled: {}", config.clustering.enabled);
        println!("  Model: {}", config.clustering_model().unwrap_or("(none)"));
        println!("  Min Similarity: {}", config.clustering.min_similarity);
        println!();

        println!("Output:");
        println!("  Max Feed Items: {}", config.output.max_feed_items);
        println!("  Directory: {}", config.output.dir.display());

        Ok(())
    }
}

fn masked(provider: Option<&ProviderConfig>) -> String {
    provider.map_or_else(|| "(not configured)".to_string(), ProviderConfig::masked_key)
}
