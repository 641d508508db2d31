//! Criteria resolution against the article store.

use super::SelectionCriteria;
use crate::article_store::{cosine_distance, Article, ArticleStore};
use crate::embedding::Embedder;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Resolves [`SelectionCriteria`] into an ordered list of candidate
/// articles. Read-only; an empty result is a valid outcome, not an error.
pub struct Retriever {
    store: Arc<dyn ArticleStore>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    /// Create a new retriever.
    pub fn new(store: Arc<dyn ArticleStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Select candidate articles for the given criteria.
    #[instrument(skip(self, criteria))]
    pub async fn select(&self, criteria: &SelectionCriteria) -> Result<Vec<Article>> {
        criteria.validate()?;

        match criteria {
            SelectionCriteria::ByQueryText {
                text,
                limit,
                categories,
                similarity_floor,
            } => {
                let query_vector = self.embedder.embed(text).await?;
                self.ranked(&query_vector, categories.as_deref(), *limit, *similarity_floor)
                    .await
            }
            SelectionCriteria::ByUserPreference {
                vector,
                limit,
                similarity_floor,
            } => self.ranked(vector, None, *limit, *similarity_floor).await,
            SelectionCriteria::ByIds(ids) => self.by_ids(ids).await,
            SelectionCriteria::ByCategory { categories, limit } => {
                self.store.by_category(categories, *limit).await
            }
        }
    }

    /// Exact similarity ranking: scan every embedded article, compute cosine
    /// distance in Rust, and sort with a stable tiebreak on id.
    ///
    /// This is the deliberate "slow but correct" mode. The storage engine's
    /// vector ordering is not trusted, so ranking never happens in SQL.
    /// A full-table scan does not scale horizontally; swapping in an
    /// approximate nearest-neighbor index would relax the exact-ordering
    /// guarantee for everything past the top results.
    async fn ranked(
        &self,
        query_vector: &[f32],
        categories: Option<&[i64]>,
        limit: usize,
        similarity_floor: Option<f32>,
    ) -> Result<Vec<Article>> {
        let candidates = self.store.embedded(categories).await?;

        let max_distance = similarity_floor.map(|floor| 1.0 - floor);

        let mut scored: Vec<(f32, Article)> = candidates
            .into_iter()
            .filter_map(|article| {
                let embedding = article.embedding.as_ref()?;
                let distance = cosine_distance(query_vector, embedding);
                Some((distance, article))
            })
            .filter(|(distance, _)| max_distance.map(|max| *distance <= max).unwrap_or(true))
            .collect();

        // Ascending by distance; ties broken by ascending id so that equal
        // vectors come back in a deterministic order.
        scored.sort_by(|(da, a), (db, b)| {
            da.partial_cmp(db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(limit);

        debug!("Ranked {} candidates", scored.len());
        Ok(scored.into_iter().map(|(_, article)| article).collect())
    }

    /// Fetch by primary key, preserving the order of the input id list.
    /// Ids not found are omitted without error.
    async fn by_ids(&self, ids: &[i64]) -> Result<Vec<Article>> {
        let found = self.store.get_by_ids(ids).await?;
        let mut by_id: HashMap<i64, Article> =
            found.into_iter().map(|a| (a.id, a)).collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article_store::{ArticleDraft, MemoryArticleStore};
    use crate::error::FortellError;
    use async_trait::async_trait;

    /// Embedder stub that hands back a fixed vector for any input.
    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.trim().is_empty() {
                return Err(FortellError::Embedding("empty input".to_string()));
            }
            Ok(self.0.clone())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| self.0.clone()).collect())
        }

        fn dimensions(&self) -> usize {
            self.0.len()
        }
    }

    async fn seeded_store() -> Arc<MemoryArticleStore> {
        let store = Arc::new(MemoryArticleStore::new(2));
        // Distances to [1, 0]: a1 = 0.0, a2 = 1.0, a3 ~ 0.29
        for (text, embedding) in [
            ("exact match", Some(vec![1.0, 0.0])),
            ("orthogonal", Some(vec![0.0, 1.0])),
            ("close", Some(vec![1.0, 1.0])),
            ("no vector", None),
        ] {
            store
                .insert(&ArticleDraft {
                    text: text.to_string(),
                    embedding,
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_ranking_ascending_by_distance() {
        let store = seeded_store().await;
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.0])));

        let results = retriever
            .select(&SelectionCriteria::ByQueryText {
                text: "query".to_string(),
                limit: 10,
                categories: None,
                similarity_floor: None,
            })
            .await
            .unwrap();

        let texts: Vec<&str> = results.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["exact match", "close", "orthogonal"]);
    }

    #[tokio::test]
    async fn test_vectorless_articles_never_ranked() {
        let store = seeded_store().await;
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.0])));

        let results = retriever
            .select(&SelectionCriteria::ByQueryText {
                text: "query".to_string(),
                limit: 10,
                categories: None,
                similarity_floor: None,
            })
            .await
            .unwrap();

        assert!(results.iter().all(|a| a.text != "no vector"));
    }

    #[tokio::test]
    async fn test_similarity_floor_filters() {
        let store = seeded_store().await;
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.0])));

        // Floor 0.9 => max distance 0.1; only the exact match survives.
        let results = retriever
            .select(&SelectionCriteria::ByUserPreference {
                vector: vec![1.0, 0.0],
                limit: 10,
                similarity_floor: Some(0.9),
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "exact match");
    }

    #[tokio::test]
    async fn test_equal_distances_break_ties_by_id() {
        let store = Arc::new(MemoryArticleStore::new(2));
        for _ in 0..3 {
            store
                .insert(&ArticleDraft {
                    text: "same".to_string(),
                    embedding: Some(vec![1.0, 0.0]),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.0])));

        let results = retriever
            .select(&SelectionCriteria::ByUserPreference {
                vector: vec![1.0, 0.0],
                limit: 10,
                similarity_floor: None,
            })
            .await
            .unwrap();

        let ids: Vec<i64> = results.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_limit_caps_results() {
        let store = seeded_store().await;
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.0])));

        let results = retriever
            .select(&SelectionCriteria::ByUserPreference {
                vector: vec![1.0, 0.0],
                limit: 2,
                similarity_floor: None,
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_by_ids_preserves_input_order_and_omits_missing() {
        let store = Arc::new(MemoryArticleStore::new(2));
        let mut ids = Vec::new();
        for text in ["a", "b", "c"] {
            let article = store
                .insert(&ArticleDraft {
                    text: text.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
            ids.push(article.id);
        }
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.0])));

        // Request c, <missing>, a: result is [c, a], in that order.
        let results = retriever
            .select(&SelectionCriteria::ByIds(vec![ids[2], 999, ids[0]]))
            .await
            .unwrap();

        let texts: Vec<&str> = results.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn test_by_category_newest_first() {
        let store = Arc::new(MemoryArticleStore::new(2));
        for i in 0..5 {
            store
                .insert(&ArticleDraft {
                    text: format!("story {}", i),
                    category_id: Some(3),
                    ..Default::default()
                })
                .await
                .unwrap();
            // Creation timestamps must differ for the ordering to be observable.
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.0])));

        let results = retriever
            .select(&SelectionCriteria::ByCategory {
                categories: vec![3],
                limit: 2,
            })
            .await
            .unwrap();

        let texts: Vec<&str> = results.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["story 4", "story 3"]);
    }

    #[tokio::test]
    async fn test_empty_result_is_ok_not_error() {
        let store = Arc::new(MemoryArticleStore::new(2));
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.0])));

        let results = retriever
            .select(&SelectionCriteria::ByCategory {
                categories: vec![42],
                limit: 5,
            })
            .await
            .unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_surfaces() {
        let store = seeded_store().await;
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.0])));

        let err = retriever
            .select(&SelectionCriteria::ByQueryText {
                text: "".to_string(),
                limit: 5,
                categories: None,
                similarity_floor: None,
            })
            .await
            .unwrap_err();

        // Empty text means the embedder cannot produce a vector.
        assert!(matches!(err, FortellError::Embedding(_)));
    }
}
