//! Output records handed to the feed writer, one per cluster.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::candidate::{CandidateId, CandidatePool};
use crate::cluster::ClusterMap;
use crate::consensus::Selection;
use crate::decision::{DEFAULT_CATEGORY, DEFAULT_REASON};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    pub id: CandidateId,
    pub title: String,
    pub link: String,
    pub representative: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub cluster_id: usize,
    /// The representative candidate's id.
    pub id: CandidateId,
    pub title: String,
    pub link: String,
    pub description: String,
    pub published_at: String,
    pub category: String,
    pub reason: String,
    pub selected_by: Vec<String>,
    pub selection_count: u32,
    /// Every cluster member, representative included, in cluster order.
    pub members: Vec<MemberRef>,
}

impl OutputRecord {
    /// Members other than the representative, for a "similar items" list.
    pub fn similar(&self) -> impl Iterator<Item = &MemberRef> {
        self.members.iter().filter(|member| !member.representative)
    }
}

/// Join clusters back to their candidates and vote provenance.
///
/// Clusters whose representative is not in the pool are skipped, as are
/// member ids the pool does not know.
#[must_use]
pub fn build_records(
    pool: &CandidatePool,
    selection: &Selection,
    clusters: &ClusterMap,
) -> Vec<OutputRecord> {
    clusters
        .iter()
        .filter_map(|cluster| {
            let representative = pool.get(cluster.representative)?;
            let accepted = selection.get(cluster.representative);

            let members = cluster
                .members
                .iter()
                .filter_map(|&id| pool.get(id))
                .map(|candidate| MemberRef {
                    id: candidate.id,
                    title: candidate.title.clone(),
                    link: candidate.link.clone(),
                    representative: candidate.id == cluster.representative,
                })
                .collect();

            Some(OutputRecord {
                cluster_id: cluster.id,
                id: representative.id,
                title: representative.title.clone(),
                link: representative.link.clone(),
                description: representative.description.clone(),
                published_at: representative.published_at.clone(),
                category: accepted
                    .and_then(|a| a.category.clone())
                    .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                reason: accepted
                    .and_then(|a| a.reason.clone())
                    .unwrap_or_else(|| DEFAULT_REASON.to_string()),
                selected_by: accepted.map(|a| a.provenance.clone()).unwrap_or_default(),
                selection_count: accepted.map_or(0, |a| a.votes),
                members,
            })
        })
        .collect()
}

/// Records split across a primary and an overflow page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedPages {
    pub primary: Vec<OutputRecord>,
    pub overflow: Vec<OutputRecord>,
    /// Records beyond both pages.
    pub dropped: usize,
}

/// First `max_items` records go to `primary`, the next `max_items` to
/// `overflow`; the rest are dropped.
#[must_use]
pub fn paginate(mut records: Vec<OutputRecord>, max_items: usize) -> FeedPages {
    let capacity = max_items.saturating_mul(2);
    let dropped = records.len().saturating_sub(capacity);
    if dropped > 0 {
        warn!(
            "{} records exceed two pages of {}; dropping the rest",
            records.len(),
            max_items
        );
        records.truncate(capacity);
    }

    let overflow = records.split_off(records.len().min(max_items));
    FeedPages {
        primary: records,
        overflow,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::RawItem;
    use crate::cluster::{ClusterResolver, GroupProposal};
    use crate::consensus::{QuorumFilter, VoteTally};
    use crate::decision::DecisionRecord;

    fn pool(n: usize) -> CandidatePool {
        CandidatePool::from_items(
            (0..n).map(|i| RawItem::new(format!("Title {i}"), format!("https://news/{i}"))),
        )
    }

    fn record(id: CandidateId) -> OutputRecord {
        OutputRecord {
            cluster_id: id,
            id,
            title: String::new(),
            link: String::new(),
            description: String::new(),
            published_at: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            reason: DEFAULT_REASON.to_string(),
            selected_by: Vec::new(),
            selection_count: 0,
            members: Vec::new(),
        }
    }

    #[test]
    fn records_follow_cluster_order_with_provenance() {
        let pool = pool(4);
        let mut tally = VoteTally::new(pool.len());
        tally.record_decisions(
            &[
                DecisionRecord {
                    id: 2,
                    category: Some("Conflict".into()),
                    reason: Some("Ceasefire collapse".into()),
                },
                DecisionRecord::bare(3),
                DecisionRecord::bare(1),
            ],
            "Batch1-Run1",
        );
        tally.record([1, 2, 3], "Batch1-Run2");
        let selection = QuorumFilter::new(2, 3).unwrap().apply(tally);

        let clusters = ClusterResolver::new(selection.ids())
            .resolve(&[GroupProposal::new(2, vec![3, 2])]);
        let records = build_records(&pool, &selection, &clusters);

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.id, 2);
        assert_eq!(first.title, "Title 2");
        assert_eq!(first.category, "Conflict");
        assert_eq!(first.reason, "Ceasefire collapse");
        assert_eq!(first.selected_by, vec!["Batch1-Run1", "Batch1-Run2"]);
        assert_eq!(first.selection_count, 2);
        assert_eq!(
            first.similar().map(|m| m.id).collect::<Vec<_>>(),
            vec![3]
        );
        assert!(first.members.iter().any(|m| m.id == 2 && m.representative));

        let second = &records[1];
        assert_eq!((second.cluster_id, second.id), (1, 1));
        assert_eq!(second.category, DEFAULT_CATEGORY);
        assert_eq!(second.similar().count(), 0);
    }

    #[test]
    fn paginate_splits_and_drops() {
        let pages = paginate((0..5).map(record).collect(), 2);
        assert_eq!(pages.primary.iter().map(|r| r.id).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(pages.overflow.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(pages.dropped, 1);
    }

    #[test]
    fn paginate_short_list_leaves_overflow_empty() {
        let pages = paginate((0..1).map(record).collect(), 100);
        assert_eq!(pages.primary.len(), 1);
        assert!(pages.overflow.is_empty());
        assert_eq!(pages.dropped, 0);

        let empty = paginate(Vec::new(), 100);
        assert_eq!(empty, FeedPages::default());
    }
}
