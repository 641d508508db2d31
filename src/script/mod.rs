//! Narration script assembly.
//!
//! [`ScriptAssembler::assemble`] is a pure function of its inputs: no
//! external calls, no randomness, no clock. Calling it twice on the same
//! article list yields byte-identical script text.

use crate::article_store::Article;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum characters of article content narrated per story.
const MAX_CONTENT_CHARS: usize = 1000;

/// Appended when story content is cut at the cap.
const TRUNCATION_MARKER: &str = "...";

const INTRO_TEMPLATE: &str =
    "Welcome to your personalized news podcast. Here are the top {count} stories for you today.";

const OUTRO: &str = "That's all for today's news. Thank you for listening!";

/// The role a segment plays in the script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SegmentKind {
    Intro,
    /// A narrated story, tagged with the article it came from.
    Story { article_id: i64 },
    Outro,
}

/// One narration segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptSegment {
    pub kind: SegmentKind,
    pub text: String,
}

/// An assembled narration script.
///
/// Ephemeral: built per pipeline invocation and discarded after synthesis.
/// Only the flattened script and the article ids survive into the
/// provenance record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptDocument {
    pub segments: Vec<ScriptSegment>,
    /// The flattened text handed to speech synthesis.
    pub script: String,
    /// Ids of the articles narrated, in narration order.
    pub article_ids: Vec<i64>,
    pub story_count: usize,
}

/// Deterministic multi-article script assembly.
pub struct ScriptAssembler;

impl ScriptAssembler {
    /// Build a narration script from articles, in input order.
    ///
    /// `category_names` resolves `category_id` to a display name; unknown or
    /// absent categories narrate as "General". Duplicate articles in the
    /// input produce duplicate segments; the input is passed through as-is.
    /// An empty input still yields a well-formed intro/outro document.
    pub fn assemble(articles: &[Article], category_names: &HashMap<i64, String>) -> ScriptDocument {
        let mut segments = Vec::with_capacity(articles.len() + 2);

        segments.push(ScriptSegment {
            kind: SegmentKind::Intro,
            text: INTRO_TEMPLATE.replace("{count}", &articles.len().to_string()),
        });

        for (idx, article) in articles.iter().enumerate() {
            let category = article
                .category_id
                .and_then(|id| category_names.get(&id))
                .map(String::as_str)
                .unwrap_or("General");

            let content = truncate_content(article.narration_content());
            let source = article.source.as_deref().unwrap_or("Unknown source");

            segments.push(ScriptSegment {
                kind: SegmentKind::Story {
                    article_id: article.id,
                },
                text: format!(
                    "Story {}: {}\n{}\nSource: {}",
                    idx + 1,
                    category,
                    content,
                    source
                ),
            });
        }

        segments.push(ScriptSegment {
            kind: SegmentKind::Outro,
            text: OUTRO.to_string(),
        });

        let script = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        ScriptDocument {
            script,
            article_ids: articles.iter().map(|a| a.id).collect(),
            story_count: articles.len(),
            segments,
        }
    }
}

/// Cap content at [`MAX_CONTENT_CHARS`] characters, appending the marker
/// when cut. Counts characters, not bytes, so the cut never lands inside a
/// UTF-8 sequence.
fn truncate_content(content: &str) -> String {
    let mut chars = content.char_indices();
    match chars.nth(MAX_CONTENT_CHARS) {
        Some((byte_idx, _)) => format!("{}{}", &content[..byte_idx], TRUNCATION_MARKER),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(id: i64, text: &str) -> Article {
        Article {
            id,
            text: text.to_string(),
            summary: None,
            source: None,
            category_id: None,
            relevance_score: None,
            date_written: None,
            date_created: Utc::now(),
            embedding: None,
        }
    }

    #[test]
    fn test_labels_appear_once_in_input_order() {
        let articles = vec![article(7, "first"), article(3, "second"), article(9, "third")];
        let doc = ScriptAssembler::assemble(&articles, &HashMap::new());

        for n in 1..=3 {
            let label = format!("Story {}: ", n);
            assert_eq!(doc.script.matches(&label).count(), 1, "label {}", label);
        }

        let pos1 = doc.script.find("first").unwrap();
        let pos2 = doc.script.find("second").unwrap();
        let pos3 = doc.script.find("third").unwrap();
        assert!(pos1 < pos2 && pos2 < pos3);

        assert_eq!(doc.article_ids, vec![7, 3, 9]);
    }

    #[test]
    fn test_long_content_truncated_with_marker() {
        let long = "x".repeat(1500);
        let doc = ScriptAssembler::assemble(&[article(1, &long)], &HashMap::new());

        assert!(!doc.script.contains(&long));
        let expected = format!("{}...", "x".repeat(1000));
        assert!(doc.script.contains(&expected));
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        // Multi-byte content longer than the cap must not split a char.
        let long = "ø".repeat(1200);
        let doc = ScriptAssembler::assemble(&[article(1, &long)], &HashMap::new());

        let expected = format!("{}...", "ø".repeat(1000));
        assert!(doc.script.contains(&expected));
    }

    #[test]
    fn test_content_at_cap_not_marked() {
        let exact = "y".repeat(1000);
        let doc = ScriptAssembler::assemble(&[article(1, &exact)], &HashMap::new());
        assert!(doc.script.contains(&exact));
        assert!(!doc.script.contains(&format!("{}...", exact)));
    }

    #[test]
    fn test_empty_input_is_well_formed() {
        let doc = ScriptAssembler::assemble(&[], &HashMap::new());

        assert_eq!(doc.story_count, 0);
        assert!(doc.article_ids.is_empty());
        assert_eq!(doc.segments.len(), 2);
        assert!(doc.script.contains("top 0 stories"));
        assert!(doc.script.contains("Thank you for listening!"));
    }

    #[test]
    fn test_summary_preferred_over_text() {
        let mut a = article(1, "the full text");
        a.summary = Some("the summary".to_string());
        let doc = ScriptAssembler::assemble(&[a], &HashMap::new());

        assert!(doc.script.contains("the summary"));
        assert!(!doc.script.contains("the full text"));
    }

    #[test]
    fn test_category_and_source_fallbacks() {
        let mut names = HashMap::new();
        names.insert(3, "Technology".to_string());

        let mut known = article(1, "a");
        known.category_id = Some(3);
        known.source = Some("https://example.com/a".to_string());

        let mut unknown_cat = article(2, "b");
        unknown_cat.category_id = Some(99);

        let doc = ScriptAssembler::assemble(&[known, unknown_cat, article(3, "c")], &names);

        assert!(doc.script.contains("Story 1: Technology"));
        assert!(doc.script.contains("Source: https://example.com/a"));
        assert!(doc.script.contains("Story 2: General"));
        assert!(doc.script.contains("Story 3: General"));
        assert!(doc.script.contains("Source: Unknown source"));
    }

    #[test]
    fn test_duplicates_pass_through() {
        let a = article(5, "repeated story");
        let doc = ScriptAssembler::assemble(&[a.clone(), a], &HashMap::new());

        assert_eq!(doc.story_count, 2);
        assert_eq!(doc.article_ids, vec![5, 5]);
        assert_eq!(doc.script.matches("repeated story").count(), 2);
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let articles = vec![article(1, "one"), article(2, "two")];
        let names = HashMap::new();

        let first = ScriptAssembler::assemble(&articles, &names);
        let second = ScriptAssembler::assemble(&articles, &names);

        assert_eq!(first.script, second.script);
        assert_eq!(first.article_ids, second.article_ids);
    }
}
