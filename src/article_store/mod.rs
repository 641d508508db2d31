//! Article store abstraction for Fortell.
//!
//! Provides a trait-based interface over the relational store that holds
//! articles (with optional embedding vectors), categories, user preference
//! vectors, and podcast provenance records.

mod memory;
mod sqlite;

pub use memory::MemoryArticleStore;
pub use sqlite::SqliteArticleStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored news article.
///
/// `id` and `date_created` are assigned by the store on insert and are
/// immutable afterwards. The embedding is write-once: re-embedding means a
/// new row or an explicit overwrite, never a partial update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Store-assigned identifier.
    pub id: i64,
    /// Full original content.
    pub text: String,
    /// Narration-ready condensed text; narration falls back to `text`.
    pub summary: Option<String>,
    /// Origin URL or publication name.
    pub source: Option<String>,
    /// Topic grouping reference.
    pub category_id: Option<i64>,
    /// Descriptive metadata in [1,10]; never a ranking input.
    pub relevance_score: Option<i32>,
    /// Original publication timestamp.
    pub date_written: Option<DateTime<Utc>>,
    /// Ingestion timestamp, set once by the store.
    pub date_created: DateTime<Utc>,
    /// Embedding vector; absent until computed.
    pub embedding: Option<Vec<f32>>,
}

impl Article {
    /// Text used for narration: summary when present and non-empty,
    /// otherwise the full text.
    pub fn narration_content(&self) -> &str {
        match &self.summary {
            Some(s) if !s.trim().is_empty() => s,
            _ => &self.text,
        }
    }
}

/// The insert shape of an article: everything the store does not assign.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub text: String,
    pub summary: Option<String>,
    pub source: Option<String>,
    pub category_id: Option<i64>,
    pub relevance_score: Option<i32>,
    pub date_written: Option<DateTime<Utc>>,
    pub embedding: Option<Vec<f32>>,
}

/// A topic grouping for articles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Persisted result of a successful pipeline run. Never mutated after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastRecord {
    pub id: i64,
    pub user_id: Option<i64>,
    /// The flattened narration script.
    pub script: String,
    /// Location of the rendered audio.
    pub s3_link: String,
    /// Optional external publish link.
    pub spotify_link: Option<String>,
    pub date_created: DateTime<Utc>,
}

/// The insert shape of a podcast record.
#[derive(Debug, Clone)]
pub struct PodcastDraft {
    pub user_id: Option<i64>,
    pub script: String,
    pub s3_link: String,
    pub spotify_link: Option<String>,
}

/// Trait for article store implementations.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert an article, assigning its id and creation timestamp.
    ///
    /// A draft embedding whose length differs from the store's configured
    /// dimensions is rejected outright; mismatches are never padded or
    /// truncated.
    async fn insert(&self, draft: &ArticleDraft) -> Result<Article>;

    /// Insert a batch of articles in one transaction: all rows or none.
    async fn insert_batch(&self, drafts: &[ArticleDraft]) -> Result<Vec<i64>>;

    /// Fetch a single article by id.
    async fn get(&self, id: i64) -> Result<Option<Article>>;

    /// Fetch articles by id. Rows come back in store order and missing ids
    /// are omitted; callers that need input order reorder themselves.
    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Article>>;

    /// Fetch articles in any of the given categories, newest first,
    /// capped at `limit`.
    async fn by_category(&self, categories: &[i64], limit: usize) -> Result<Vec<Article>>;

    /// Fetch every article that has an embedding, optionally restricted to
    /// a category set. Articles without an embedding are never returned
    /// here, which keeps them out of similarity search entirely.
    async fn embedded(&self, categories: Option<&[i64]>) -> Result<Vec<Article>>;

    /// Total article count.
    async fn article_count(&self) -> Result<usize>;

    /// Create or rename a category.
    async fn upsert_category(&self, id: i64, name: &str) -> Result<()>;

    /// List all categories.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Fetch a user's preference vector, if one is stored.
    async fn user_preference(&self, user_id: i64) -> Result<Option<Vec<f32>>>;

    /// Store a user's preference vector (dimension-checked like articles).
    async fn set_user_preference(&self, user_id: i64, vector: &[f32]) -> Result<()>;

    /// Persist a podcast provenance record.
    async fn insert_podcast(&self, draft: &PodcastDraft) -> Result<PodcastRecord>;

    /// Fetch a podcast record by id.
    async fn get_podcast(&self, id: i64) -> Result<Option<PodcastRecord>>;

    /// List a user's podcast records, newest first.
    async fn podcasts_for_user(&self, user_id: i64, limit: usize) -> Result<Vec<PodcastRecord>>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Cosine distance: 1 minus cosine similarity. Lower is more similar.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_distance_inverts_similarity() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((cosine_distance(&a, &a)).abs() < 0.001);
        assert!((cosine_distance(&a, &b) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_narration_content_fallback() {
        let mut article = Article {
            id: 1,
            text: "full text".to_string(),
            summary: None,
            source: None,
            category_id: None,
            relevance_score: None,
            date_written: None,
            date_created: Utc::now(),
            embedding: None,
        };
        assert_eq!(article.narration_content(), "full text");

        article.summary = Some("  ".to_string());
        assert_eq!(article.narration_content(), "full text");

        article.summary = Some("condensed".to_string());
        assert_eq!(article.narration_content(), "condensed");
    }
}
