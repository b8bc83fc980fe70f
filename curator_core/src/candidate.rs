//! Candidate items and their ingestion into a dense id space.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Dense, 0-based id assigned in ingestion order.
pub type CandidateId = usize;

const DEFAULT_TITLE: &str = "No Title";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub title: String,
    pub link: String,
    pub description: String,
    pub published_at: String,
}

/// An item as delivered by a feed reader, before it has an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "pubDate")]
    pub published_at: Option<String>,
}

impl RawItem {
    #[must_use]
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            link: Some(link.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    // Feeds without <link> often carry the permalink in <guid>.
    fn resolved_link(&self) -> Option<&str> {
        [self.link.as_deref(), self.guid.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|link| !link.is_empty())
    }
}

/// The immutable candidate set for one curation pass.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
    seen_links: HashSet<String>,
}

impl CandidatePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest items in order, skipping linkless and duplicate-link items.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = RawItem>) -> Self {
        let mut pool = Self::new();
        for item in items {
            pool.ingest(item);
        }
        pool
    }

    /// Assign the next id to `item`, or return `None` if it was skipped.
    pub fn ingest(&mut self, item: RawItem) -> Option<CandidateId> {
        let link = item.resolved_link()?.to_string();
        if !self.seen_links.insert(link.clone()) {
            return None;
        }

        let title = item
            .title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();
        let description = item
            .description
            .filter(|description| !description.trim().is_empty())
            .unwrap_or_else(|| title.clone());

        let id = self.candidates.len();
        self.candidates.push(Candidate {
            id,
            title,
            link,
            description,
            published_at: item.published_at.unwrap_or_default(),
        });
        Some(id)
    }

    #[must_use]
    pub fn get(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    /// Consecutive batches of at most `size` candidates (a zero size is treated as one).
    pub fn batches(&self, size: usize) -> impl Iterator<Item = &[Candidate]> {
        self.candidates.chunks(size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_in_ingestion_order() {
        let pool = CandidatePool::from_items([
            RawItem::new("A", "https://a"),
            RawItem::new("B", "https://b"),
            RawItem::new("C", "https://c"),
        ]);
        let ids: Vec<_> = pool.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(pool.get(1).map(|c| c.title.as_str()), Some("B"));
    }

    #[test]
    fn duplicate_and_missing_links_are_skipped() {
        let mut pool = CandidatePool::new();
        assert_eq!(pool.ingest(RawItem::new("A", "https://a")), Some(0));
        assert_eq!(pool.ingest(RawItem::new("A again", "https://a")), None);
        assert_eq!(pool.ingest(RawItem::new("No link", "  ")), None);
        assert_eq!(pool.ingest(RawItem::new("B", "https://b")), Some(1));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn guid_stands_in_for_missing_link() {
        let item = RawItem {
            title: Some("Guid only".to_string()),
            guid: Some("https://guid".to_string()),
            ..RawItem::default()
        };
        let pool = CandidatePool::from_items([item]);
        assert_eq!(pool.get(0).map(|c| c.link.as_str()), Some("https://guid"));
    }

    #[test]
    fn title_and_description_defaults() {
        let item = RawItem {
            title: Some("  Summit opens  ".to_string()),
            link: Some("https://s".to_string()),
            ..RawItem::default()
        };
        let untitled = RawItem {
            link: Some("https://u".to_string()),
            ..RawItem::default()
        };
        let pool = CandidatePool::from_items([item, untitled]);

        let first = pool.get(0).unwrap();
        assert_eq!(first.title, "Summit opens");
        assert_eq!(first.description, "Summit opens");
        assert_eq!(pool.get(1).unwrap().title, DEFAULT_TITLE);
    }

    #[test]
    fn raw_items_accept_pub_date_alias() {
        let item: RawItem = serde_json::from_str(
            r#"{"title": "T", "link": "https://t", "pubDate": "Mon, 01 Jan 2024 00:00:00 +0000"}"#,
        )
        .unwrap();
        assert_eq!(
            item.published_at.as_deref(),
            Some("Mon, 01 Jan 2024 00:00:00 +0000")
        );
    }

    #[test]
    fn batches_cover_pool_in_order() {
        let pool = CandidatePool::from_items(
            (0..5).map(|i| RawItem::new(format!("T{i}"), format!("https://{i}"))),
        );
        let sizes: Vec<_> = pool.batches(2).map(<[Candidate]>::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(pool.batches(0).count(), 5);
    }
}
