//! Feed documents written at the end of a pass.

use chrono::{DateTime, Utc};
use curator_core::{FeedPages, OutputRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

pub const PRIMARY_FILE: &str = "feed.json";
pub const OVERFLOW_FILE: &str = "feed_overflow.json";

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedDocument {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub run_id: Uuid,
    pub items: Vec<OutputRecord>,
}

/// Write both pages into `dir`, sharing one run id. Empty pages are still written.
pub fn write_pages(dir: &Path, pages: FeedPages, title: &str) -> anyhow::Result<[PathBuf; 2]> {
    std::fs::create_dir_all(dir)?;
    let run_id = Uuid::now_v7();
    let generated_at = Utc::now();

    let primary = FeedDocument {
        title: title.to_string(),
        generated_at,
        run_id,
        items: pages.primary,
    };
    let overflow = FeedDocument {
        title: format!("{title} (overflow)"),
        generated_at,
        run_id,
        items: pages.overflow,
    };

    Ok([
        write_document(&dir.join(PRIMARY_FILE), &primary)?,
        write_document(&dir.join(OVERFLOW_FILE), &overflow)?,
    ])
}

fn write_document(path: &Path, document: &FeedDocument) -> anyhow::Result<PathBuf> {
    std::fs::write(path, serde_json::to_string_pretty(document)?)?;
    info!("Wrote {} items to {}", document.items.len(), path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_primary_and_empty_overflow() {
        let dir = std::env::temp_dir().join(format!("curator-feed-{}", Uuid::now_v7()));
        let [primary, overflow] = write_pages(&dir, FeedPages::default(), "Digest").unwrap();

        let primary: FeedDocument =
            serde_json::from_str(&std::fs::read_to_string(primary).unwrap()).unwrap();
        let overflow: FeedDocument =
            serde_json::from_str(&std::fs::read_to_string(overflow).unwrap()).unwrap();

        assert_eq!(primary.title, "Digest");
        assert_eq!(overflow.title, "Digest (overflow)");
        assert_eq!(primary.run_id, overflow.run_id);
        assert!(primary.items.is_empty() && overflow.items.is_empty());

        std::fs::remove_dir_all(dir).unwrap();
    }
}
