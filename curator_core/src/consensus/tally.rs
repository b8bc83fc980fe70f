use serde::Serialize;

use crate::candidate::CandidateId;
use crate::decision::{self, DecisionRecord};

/// Accumulated votes for one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VoteEntry {
    pub count: u32,
    /// One label per accepting run, in the order the runs were recorded.
    pub provenance: Vec<String>,
    /// First category any run attached to this candidate.
    pub category: Option<String>,
    /// First reason any run attached to this candidate.
    pub reason: Option<String>,
}

/// Per-candidate vote counts for one aggregation pass.
///
/// Entries live in an arena indexed by candidate id. Counts only grow; there
/// is no way to retract a vote.
#[derive(Debug, Clone)]
pub struct VoteTally {
    entries: Vec<VoteEntry>,
    runs_recorded: usize,
}

impl VoteTally {
    #[must_use]
    pub fn new(candidate_count: usize) -> Self {
        Self {
            entries: vec![VoteEntry::default(); candidate_count],
            runs_recorded: 0,
        }
    }

    /// Count one vote under `label` for every in-range id.
    ///
    /// Out-of-range ids are ignored. An id repeated within one call is
    /// counted once. Recording the same `(ids, label)` twice counts twice.
    /// Returns how many candidates received a vote.
    pub fn record<I>(&mut self, ids: I, label: &str) -> usize
    where
        I: IntoIterator<Item = i64>,
    {
        let candidate_count = self.entries.len();
        let mut voted = vec![false; candidate_count];
        let mut counted = 0;
        for raw in ids {
            let Some(id) = decision::to_candidate_id(raw, candidate_count) else {
                continue;
            };
            if self.vote(id, label, &mut voted).is_some() {
                counted += 1;
            }
        }
        self.runs_recorded += 1;
        counted
    }

    /// Like [`record`](Self::record), also keeping the first category and
    /// reason seen for each candidate.
    pub fn record_decisions(&mut self, decisions: &[DecisionRecord], label: &str) -> usize {
        let mut voted = vec![false; self.entries.len()];
        let mut counted = 0;
        for decision in decisions {
            let Some(entry) = self.vote(decision.id, label, &mut voted) else {
                continue;
            };
            if entry.category.is_none() {
                entry.category.clone_from(&decision.category);
            }
            if entry.reason.is_none() {
                entry.reason.clone_from(&decision.reason);
            }
            counted += 1;
        }
        self.runs_recorded += 1;
        counted
    }

    fn vote(&mut self, id: CandidateId, label: &str, voted: &mut [bool]) -> Option<&mut VoteEntry> {
        let seen = voted.get_mut(id)?;
        if *seen {
            return None;
        }
        *seen = true;

        let entry = self.entries.get_mut(id)?;
        entry.count += 1;
        entry.provenance.push(label.to_string());
        Some(entry)
    }

    #[must_use]
    pub fn entry(&self, id: CandidateId) -> Option<&VoteEntry> {
        self.entries.get(id).filter(|entry| entry.count > 0)
    }

    #[must_use]
    pub fn count(&self, id: CandidateId) -> u32 {
        self.entry(id).map_or(0, |entry| entry.count)
    }

    #[must_use]
    pub const fn candidate_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of `record` calls so far, including ones that counted nothing.
    #[must_use]
    pub const fn runs_recorded(&self) -> usize {
        self.runs_recorded
    }

    /// Candidates with at least one vote, ascending by id.
    pub fn voted(&self) -> impl Iterator<Item = (CandidateId, &VoteEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.count > 0)
    }

    pub(crate) fn into_voted(self) -> impl Iterator<Item = (CandidateId, VoteEntry)> {
        self.entries
            .into_iter()
            .enumerate()
            .filter(|(_, entry)| entry.count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_adds_one_vote_and_label_per_id() {
        let mut tally = VoteTally::new(4);
        let counted = tally.record([1, 3], "Batch1-Run1");
        assert_eq!(counted, 2);
        assert_eq!(tally.count(1), 1);
        assert_eq!(tally.count(3), 1);
        assert_eq!(tally.count(0), 0);
        assert_eq!(
            tally.entry(3).unwrap().provenance,
            vec!["Batch1-Run1".to_string()]
        );
    }

    #[test]
    fn out_of_range_ids_are_silently_dropped() {
        let mut tally = VoteTally::new(2);
        assert_eq!(tally.record([-1, 0, 2, 99], "run"), 1);
        assert_eq!(tally.voted().count(), 1);
        assert_eq!(tally.runs_recorded(), 1);
    }

    #[test]
    fn repeated_id_within_one_run_counts_once() {
        let mut tally = VoteTally::new(3);
        tally.record([2, 2, 2], "run");
        assert_eq!(tally.count(2), 1);
        assert_eq!(tally.entry(2).unwrap().provenance.len(), 1);
    }

    #[test]
    fn same_label_twice_double_counts() {
        let mut tally = VoteTally::new(3);
        tally.record([1], "dup");
        tally.record([1], "dup");
        assert_eq!(tally.count(1), 2);
        assert_eq!(
            tally.entry(1).unwrap().provenance,
            vec!["dup".to_string(), "dup".to_string()]
        );
    }

    #[test]
    fn first_annotation_wins() {
        let mut tally = VoteTally::new(2);
        tally.record_decisions(&[DecisionRecord::bare(0)], "r1");
        tally.record_decisions(
            &[DecisionRecord {
                id: 0,
                category: Some("Energy".into()),
                reason: Some("Pipeline deal".into()),
            }],
            "r2",
        );
        tally.record_decisions(
            &[DecisionRecord {
                id: 0,
                category: Some("Trade".into()),
                reason: None,
            }],
            "r3",
        );

        let entry = tally.entry(0).unwrap();
        assert_eq!(entry.count, 3);
        assert_eq!(entry.category.as_deref(), Some("Energy"));
        assert_eq!(entry.reason.as_deref(), Some("Pipeline deal"));
        assert_eq!(entry.provenance, vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn empty_run_is_still_a_recorded_run() {
        let mut tally = VoteTally::new(2);
        assert_eq!(tally.record(std::iter::empty(), "empty"), 0);
        assert_eq!(tally.runs_recorded(), 1);
        assert_eq!(tally.voted().count(), 0);
    }
}
