//! Multi-run vote aggregation and quorum acceptance.

use serde::{Deserialize, Serialize};

mod quorum;
mod tally;

pub use quorum::{Accepted, QuorumFilter, Selection};
pub use tally::{VoteEntry, VoteTally};

/// How many independent runs each batch gets and how many must agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    #[serde(default = "ConsensusConfig::default_runs_per_batch")]
    pub runs_per_batch: u32,
    #[serde(default = "ConsensusConfig::default_threshold")]
    pub threshold: u32,
    /// Abort the pass on a provider error instead of counting the run as empty.
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default = "ConsensusConfig::default_temperature")]
    pub temperature: f32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            runs_per_batch: Self::default_runs_per_batch(),
            threshold: Self::default_threshold(),
            fail_fast: false,
            temperature: Self::default_temperature(),
        }
    }
}

impl ConsensusConfig {
    const fn default_runs_per_batch() -> u32 {
        3
    }

    const fn default_threshold() -> u32 {
        QuorumFilter::DEFAULT_THRESHOLD
    }

    const fn default_temperature() -> f32 {
        0.3
    }
}
