use serde::Serialize;
use tracing::debug;

use super::tally::VoteTally;
use crate::candidate::CandidateId;
use crate::error::{Error, Result};

/// A candidate that met the quorum, with its provenance carried forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accepted {
    pub id: CandidateId,
    pub votes: u32,
    pub provenance: Vec<String>,
    pub category: Option<String>,
    pub reason: Option<String>,
}

/// The outcome of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Accepted candidates, ascending by id.
    pub accepted: Vec<Accepted>,
    pub threshold: u32,
    pub expected_runs: u32,
    /// Candidates that received at least one vote.
    pub voted: usize,
}

impl Selection {
    #[must_use]
    pub fn ids(&self) -> Vec<CandidateId> {
        self.accepted.iter().map(|accepted| accepted.id).collect()
    }

    #[must_use]
    pub fn get(&self, id: CandidateId) -> Option<&Accepted> {
        self.accepted
            .binary_search_by_key(&id, |accepted| accepted.id)
            .ok()
            .and_then(|index| self.accepted.get(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Fixed-threshold acceptance over a [`VoteTally`].
///
/// Every vote weighs the same regardless of which run or model cast it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuorumFilter {
    threshold: u32,
    expected_runs: u32,
}

impl QuorumFilter {
    /// The default quorum: two of three runs.
    pub const DEFAULT_THRESHOLD: u32 = 2;

    /// `expected_runs` is reported alongside the result but never affects it.
    ///
    /// # Errors
    /// [`Error::InvalidThreshold`] when `threshold` is zero.
    pub const fn new(threshold: u32, expected_runs: u32) -> Result<Self> {
        if threshold == 0 {
            return Err(Error::InvalidThreshold);
        }
        Ok(Self {
            threshold,
            expected_runs,
        })
    }

    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    #[must_use]
    pub const fn expected_runs(&self) -> u32 {
        self.expected_runs
    }

    #[must_use]
    pub const fn accepts(&self, votes: u32) -> bool {
        votes >= self.threshold
    }

    /// Consume the tally and keep every candidate with at least `threshold` votes.
    #[must_use]
    pub fn apply(&self, tally: VoteTally) -> Selection {
        let mut voted = 0;
        let accepted = tally
            .into_voted()
            .inspect(|_| voted += 1)
            .filter(|(_, entry)| self.accepts(entry.count))
            .map(|(id, entry)| Accepted {
                id,
                votes: entry.count,
                provenance: entry.provenance,
                category: entry.category,
                reason: entry.reason,
            })
            .collect::<Vec<_>>();

        debug!(
            "Quorum {}/{}: {} of {} voted candidates accepted",
            self.threshold,
            self.expected_runs,
            accepted.len(),
            voted
        );

        Selection {
            accepted,
            threshold: self.threshold,
            expected_runs: self.expected_runs,
            voted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_of_three_runs() {
        let mut tally = VoteTally::new(10);
        tally.record([5, 6], "run1");
        tally.record([5], "run2");
        tally.record([6, 7], "run3");

        let selection = QuorumFilter::new(2, 3).unwrap().apply(tally);
        assert_eq!(selection.ids(), vec![5, 6]);
        assert_eq!(selection.voted, 3);
        assert_eq!(selection.get(5).unwrap().provenance, vec!["run1", "run2"]);
        assert_eq!(selection.get(6).unwrap().provenance, vec!["run1", "run3"]);
        assert!(selection.get(7).is_none());
    }

    #[test]
    fn boundary_is_inclusive_for_any_threshold() {
        for threshold in 1..=5_u32 {
            let mut tally = VoteTally::new(2);
            for run in 0..threshold - 1 {
                tally.record([0, 1], &format!("run{run}"));
            }
            tally.record([1], "last");

            let selection = QuorumFilter::new(threshold, 5).unwrap().apply(tally);
            assert_eq!(selection.ids(), vec![1], "threshold {threshold}");
        }
    }

    #[test]
    fn zero_threshold_is_rejected() {
        assert_eq!(QuorumFilter::new(0, 3), Err(Error::InvalidThreshold));
    }

    #[test]
    fn nothing_meeting_quorum_is_an_empty_selection() {
        let mut tally = VoteTally::new(3);
        tally.record([0, 1, 2], "only run");
        let selection = QuorumFilter::new(2, 3).unwrap().apply(tally);
        assert!(selection.is_empty());
        assert_eq!(selection.voted, 3);
        assert_eq!(selection.expected_runs, 3);
    }

    #[test]
    fn annotations_are_carried_forward() {
        let mut tally = VoteTally::new(1);
        tally.record_decisions(
            &[crate::DecisionRecord {
                id: 0,
                category: Some("Diplomacy".into()),
                reason: None,
            }],
            "a",
        );
        tally.record([0], "b");
        let selection = QuorumFilter::new(2, 2).unwrap().apply(tally);
        let accepted = selection.get(0).unwrap();
        assert_eq!(accepted.category.as_deref(), Some("Diplomacy"));
        assert_eq!(accepted.reason, None);
        assert_eq!(accepted.votes, 2);
    }
}
