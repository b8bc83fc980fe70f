use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use curator_core::{ClusteringConfig, ConsensusConfig, ModelSpec};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub models: Vec<ModelConfig>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
}

/// A selection model and the provider that serves it.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default = "ModelConfig::default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub provider: ProviderKind,
}

impl ModelConfig {
    const fn default_batch_size() -> usize {
        100
    }

    #[must_use]
    pub fn spec(&self) -> ModelSpec {
        ModelSpec {
            name: self.name.clone(),
            display: self.display.clone(),
            batch_size: self.batch_size,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<ProviderConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<ProviderConfig>,
}

impl ProvidersConfig {
    #[must_use]
    pub const fn get(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        match kind {
            ProviderKind::Gemini => self.gemini.as_ref(),
            ProviderKind::OpenAi => self.openai.as_ref(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// First and last four characters, for display.
    #[must_use]
    pub fn masked_key(&self) -> String {
        let key = &self.api_key;
        let chars: Vec<char> = key.chars().collect();
        if chars.len() > 8 {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{head}...{tail}")
        } else if key.is_empty() {
            "(not set)".to_string()
        } else {
            "***".to_string()
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PacingConfig {
    /// Seconds slept between runs and between batch groups.
    #[serde(default = "PacingConfig::default_run_delay_secs")]
    pub run_delay_secs: u64,
    /// One retry per entry, after that many seconds. Empty means no retries.
    #[serde(default)]
    pub retry_delays_secs: Vec<u64>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            run_delay_secs: Self::default_run_delay_secs(),
            retry_delays_secs: Vec::new(),
        }
    }
}

impl PacingConfig {
    const fn default_run_delay_secs() -> u64 {
        61
    }

    #[must_use]
    pub const fn run_delay(&self) -> Duration {
        Duration::from_secs(self.run_delay_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_max_feed_items")]
    pub max_feed_items: usize,
    #[serde(default = "OutputConfig::default_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_feed_items: Self::default_max_feed_items(),
            dir: Self::default_dir(),
        }
    }
}

impl OutputConfig {
    const fn default_max_feed_items() -> usize {
        100
    }

    fn default_dir() -> PathBuf {
        PathBuf::from(".")
    }
}

const CONFIG_TEMPLATE: &str = r#"{
  "models": [
    {
      "name": "gemini-2.5-flash",
      "display": "Flash",
      "batch_size": 100,
      "provider": "gemini"
    }
  ],
  "providers": {
    "gemini": {
      "api_key": "your-gemini-api-key-here"
    }
  },
  "consensus": {
    "runs_per_batch": 3,
    "threshold": 2,
    "fail_fast": false,
    "temperature": 0.3
  },
  "pacing": {
    "run_delay_secs": 61,
    "retry_delays_secs": []
  },
  "clustering": {
    "enabled": true,
    "min_similarity": 0.5,
    "max_output_tokens": 2000,
    "temperature": 0.0
  },
  "output": {
    "max_feed_items": 100,
    "dir": "."
  }
}"#;

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("curator"))
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load `~/curator/config.json`.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::default_path()?;

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'curator init' to create config.",
                config_path.display()
            );
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read config {}: {e}", path.display()))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject settings under which no run could ever be accepted or made.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.models.is_empty() {
            anyhow::bail!("No models configured");
        }
        if let Some(model) = self.models.iter().find(|m| m.batch_size == 0) {
            anyhow::bail!("Model {} has batch_size 0", model.name);
        }
        if self.consensus.runs_per_batch == 0 {
            anyhow::bail!("consensus.runs_per_batch must be at least 1");
        }
        if self.consensus.threshold == 0 {
            anyhow::bail!("consensus.threshold must be at least 1");
        }
        if self.consensus.threshold > self.consensus.runs_per_batch {
            warn!(
                "consensus.threshold {} exceeds runs_per_batch {}; nothing can be accepted \
                 unless several models vote",
                self.consensus.threshold, self.consensus.runs_per_batch
            );
        }
        Ok(())
    }

    /// Model used for the clustering call.
    #[must_use]
    pub fn clustering_model(&self) -> Option<&str> {
        self.clustering
            .model
            .as_deref()
            .or_else(|| self.models.first().map(|m| m.name.as_str()))
    }

    #[must_use]
    pub fn model_specs(&self) -> Vec<ModelSpec> {
        self.models.iter().map(ModelConfig::spec).collect()
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, CONFIG_TEMPLATE)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Edit the config file and add your Gemini API key");
        println!("   2. Export your feed items to a JSON array file");
        println!("   3. Run 'curator run --input items.json'");
        println!();
        println!("🔧 Configuration options:");
        println!("   - models: selection models, each run runs_per_batch times per batch");
        println!("   - consensus.threshold: votes an article needs to be accepted");
        println!("   - pacing.run_delay_secs: pause between runs (rate limits)");
        println!();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_and_validates() {
        let config: Config = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.models[0].provider, ProviderKind::Gemini);
        assert_eq!(config.consensus.threshold, 2);
        assert_eq!(config.pacing.run_delay(), Duration::from_secs(61));
        assert_eq!(config.clustering_model(), Some("gemini-2.5-flash"));
    }

    #[test]
    fn minimal_config_takes_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"models": [{"name": "m", "provider": "openai"}]}"#).unwrap();
        assert_eq!(config.models[0].batch_size, 100);
        assert_eq!(config.models[0].provider, ProviderKind::OpenAi);
        assert_eq!(config.consensus.runs_per_batch, 3);
        assert!(config.pacing.retry_delays_secs.is_empty());
        assert_eq!(config.output.max_feed_items, 100);
        assert!(config.providers.get(ProviderKind::OpenAi).is_none());
        assert_eq!(config.model_specs()[0].display_name(), "m");
    }

    #[test]
    fn validate_rejects_unusable_settings() {
        let base = r#"{"models": [{"name": "m"}]}"#;
        let mut config: Config = serde_json::from_str(base).unwrap();
        config.consensus.threshold = 0;
        assert!(config.validate().is_err());

        let mut config: Config = serde_json::from_str(base).unwrap();
        config.models[0].batch_size = 0;
        assert!(config.validate().is_err());

        let mut config: Config = serde_json::from_str(base).unwrap();
        config.models.clear();
        assert!(config.validate().is_err());

        let mut config: Config = serde_json::from_str(base).unwrap();
        config.consensus.threshold = 5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn masked_key_hides_middle() {
        let key = |k: &str| ProviderConfig {
            api_key: k.to_string(),
            base_url: None,
        };
        assert_eq!(key("abcd1234wxyz").masked_key(), "abcd...wxyz");
        assert_eq!(key("short").masked_key(), "***");
        assert_eq!(key("").masked_key(), "(not set)");
    }
}
