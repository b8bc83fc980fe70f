//! Near-duplicate clustering over the accepted set.
//!
//! A model proposes groups; [`ClusterResolver`] turns those proposals into a
//! partition of the accepted ids. Members are claimed greedily in proposal
//! order, so when two proposals overlap the earlier one keeps the shared ids.
//! Whatever no proposal claims becomes a singleton, in ascending id order.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::candidate::CandidateId;
use crate::extract;

mod proposal;

pub use proposal::{GroupProposal, parse_proposals};

/// Settings for the single clustering call made after quorum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default = "ClusteringConfig::default_enabled")]
    pub enabled: bool,
    /// Model used for clustering; the first configured model when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "ClusteringConfig::default_min_similarity")]
    pub min_similarity: f32,
    #[serde(default = "ClusteringConfig::default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default)]
    pub temperature: f32,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            model: None,
            min_similarity: Self::default_min_similarity(),
            max_output_tokens: Self::default_max_output_tokens(),
            temperature: 0.0,
        }
    }
}

impl ClusteringConfig {
    const fn default_enabled() -> bool {
        true
    }

    const fn default_min_similarity() -> f32 {
        0.5
    }

    const fn default_max_output_tokens() -> u32 {
        2000
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    /// Sequential id assigned by the resolver.
    pub id: usize,
    pub representative: CandidateId,
    /// Members in proposal order; always contains the representative.
    pub members: Vec<CandidateId>,
}

impl Cluster {
    fn singleton(id: usize, candidate: CandidateId) -> Self {
        Self {
            id,
            representative: candidate,
            members: vec![candidate],
        }
    }

    /// Members other than the representative.
    pub fn similar(&self) -> impl Iterator<Item = CandidateId> + '_ {
        self.members
            .iter()
            .copied()
            .filter(|member| *member != self.representative)
    }
}

/// Clusters in emission order: resolved groups first, then singletons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterMap {
    clusters: Vec<Cluster>,
}

impl ClusterMap {
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    #[must_use]
    pub fn cluster_of(&self, id: CandidateId) -> Option<&Cluster> {
        self.clusters
            .iter()
            .find(|cluster| cluster.members.contains(&id))
    }

    /// `(representative, members)` pairs in emission order.
    #[must_use]
    pub fn summary(&self) -> Vec<(CandidateId, Vec<CandidateId>)> {
        self.clusters
            .iter()
            .map(|cluster| (cluster.representative, cluster.members.clone()))
            .collect()
    }
}

/// Partitions an accepted id set according to group proposals.
#[derive(Debug, Clone)]
pub struct ClusterResolver {
    /// Accepted ids, ascending and unique.
    universe: Vec<CandidateId>,
    /// `accepted[id]` is true when `id` is in the universe.
    accepted: Vec<bool>,
}

impl ClusterResolver {
    #[must_use]
    pub fn new(accepted: impl IntoIterator<Item = CandidateId>) -> Self {
        let mut universe: Vec<CandidateId> = accepted.into_iter().collect();
        universe.sort_unstable();
        universe.dedup();

        let mut mask = vec![false; universe.last().map_or(0, |max| max + 1)];
        for &id in &universe {
            mask[id] = true;
        }

        Self {
            universe,
            accepted: mask,
        }
    }

    #[must_use]
    pub fn universe(&self) -> &[CandidateId] {
        &self.universe
    }

    /// Every accepted id as its own cluster.
    #[must_use]
    pub fn singletons(&self) -> ClusterMap {
        self.resolve(&[])
    }

    /// Resolve a raw clustering response, degrading to singletons when the
    /// text holds no list of proposals.
    #[must_use]
    pub fn resolve_response(&self, text: &str) -> ClusterMap {
        match extract::extract_array(text) {
            Ok(items) => self.resolve(&parse_proposals(&items)),
            Err(e) => {
                warn!("Clustering response unusable, falling back to singletons: {e}");
                self.singletons()
            }
        }
    }

    /// Resolve proposals in order, then sweep unclaimed ids into singletons.
    #[must_use]
    pub fn resolve(&self, proposals: &[GroupProposal]) -> ClusterMap {
        let mut claimed = vec![false; self.accepted.len()];
        let mut clusters = Vec::new();

        for (index, proposal) in proposals.iter().enumerate() {
            let members = self.known_members(proposal);
            let Some(representative) = self.representative_of(proposal, &members) else {
                debug!("Dropping proposal {index}: no accepted members");
                continue;
            };
            if claimed[representative] {
                debug!("Dropping proposal {index}: representative {representative} already claimed");
                continue;
            }

            let members: Vec<CandidateId> = members
                .into_iter()
                .filter(|member| !claimed[*member])
                .collect();
            for &member in &members {
                claimed[member] = true;
            }

            clusters.push(Cluster {
                id: clusters.len(),
                representative,
                members,
            });
        }

        for &id in &self.universe {
            if !claimed[id] {
                clusters.push(Cluster::singleton(clusters.len(), id));
            }
        }

        ClusterMap { clusters }
    }

    /// Proposal members that are accepted ids, deduplicated, in proposal order.
    fn known_members(&self, proposal: &GroupProposal) -> Vec<CandidateId> {
        let mut members = Vec::with_capacity(proposal.members.len());
        for &raw in &proposal.members {
            if let Some(id) = self.lookup(raw) {
                if !members.contains(&id) {
                    members.push(id);
                }
            }
        }
        members
    }

    fn representative_of(
        &self,
        proposal: &GroupProposal,
        members: &[CandidateId],
    ) -> Option<CandidateId> {
        proposal
            .representative
            .and_then(|raw| self.lookup(raw))
            .filter(|rep| members.contains(rep))
            .or_else(|| members.first().copied())
    }

    fn lookup(&self, raw: i64) -> Option<CandidateId> {
        let id = usize::try_from(raw).ok()?;
        self.accepted.get(id).copied().unwrap_or(false).then_some(id)
    }
}
