//! Prompt text for the selection and clustering calls.

use crate::ChatMessage;
use crate::candidate::Candidate;

pub const SELECTION_SYSTEM_PROMPT: &str = "You are a Geopolitical Intelligence Filter.
Return ONLY a JSON array of article IDs (integers) that are geopolitically significant.
No explanation, no text, JSON only.";

/// One `"{id}: {title}"` line per candidate in the batch.
#[must_use]
pub fn selection_messages(batch: &[Candidate]) -> Vec<ChatMessage> {
    let listing = batch
        .iter()
        .map(|candidate| format!("{}: {}", candidate.id, single_line(&candidate.title)))
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        ChatMessage::system(SELECTION_SYSTEM_PROMPT),
        ChatMessage::user(listing),
    ]
}

/// Tab-separated `id, title, link, description` lines for the clustering call.
#[must_use]
pub fn cluster_messages(candidates: &[&Candidate], min_similarity: f32) -> Vec<ChatMessage> {
    let percent = (min_similarity.clamp(0.0, 1.0) * 100.0).round();
    let system = format!(
        "You are a strict clustering assistant. Input is a tab-separated list: \
         id<TAB>title<TAB>link<TAB>description. Cluster headlines that are near-duplicates \
         or strongly about the same event/impact. Only group items when similarity is \
         approximately >= {percent}%. Choose one main representative per cluster (prefer \
         the clearest title). Output VALID JSON only: an array of objects with fields \
         {{\"cluster_id\":int, \"main\":id, \"members\":[ids...]}}. No commentary, no \
         markdown, no code fences."
    );

    let listing = candidates
        .iter()
        .map(|candidate| {
            format!(
                "{}\t{}\t{}\t{}",
                candidate.id,
                single_line(&candidate.title),
                candidate.link,
                single_line(&candidate.description)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        ChatMessage::system(system),
        ChatMessage::user(format!("ARTICLES:\n{listing}")),
    ]
}

fn single_line(text: &str) -> String {
    text.replace(['\n', '\r', '\t'], " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn candidate(id: usize, title: &str) -> Candidate {
        Candidate {
            id,
            title: title.to_string(),
            link: format!("https://news/{id}"),
            description: "line one\nline two".to_string(),
            published_at: String::new(),
        }
    }

    #[test]
    fn selection_prompt_lists_ids_and_titles() {
        let messages = selection_messages(&[candidate(4, "Talks\nresume"), candidate(5, "Vote")]);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "4: Talks resume\n5: Vote");
    }

    #[test]
    fn cluster_prompt_is_tab_separated() {
        let a = candidate(0, "A");
        let messages = cluster_messages(&[&a], 0.5);
        assert!(messages[0].content.contains(">= 50%"));
        assert_eq!(
            messages[1].content,
            "ARTICLES:\n0\tA\thttps://news/0\tline one line two"
        );
    }
}
