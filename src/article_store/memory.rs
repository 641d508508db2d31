//! In-memory article store implementation.
//!
//! Useful for testing and small datasets.

use super::{
    Article, ArticleDraft, ArticleStore, Category, PodcastDraft, PodcastRecord,
};
use crate::error::{FortellError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct Inner {
    articles: Vec<Article>,
    categories: HashMap<i64, String>,
    user_preferences: HashMap<i64, Vec<f32>>,
    podcasts: Vec<PodcastRecord>,
    next_article_id: i64,
    next_podcast_id: i64,
}

/// In-memory article store.
pub struct MemoryArticleStore {
    inner: RwLock<Inner>,
    dimensions: usize,
}

impl MemoryArticleStore {
    /// Create a new in-memory article store.
    pub fn new(dimensions: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_article_id: 1,
                next_podcast_id: 1,
                ..Default::default()
            }),
            dimensions,
        }
    }

    fn check_dimensions(&self, embedding: Option<&Vec<f32>>) -> Result<()> {
        if let Some(vec) = embedding {
            if vec.len() != self.dimensions {
                return Err(FortellError::InvalidInput(format!(
                    "Embedding has {} dimensions, store expects {}",
                    vec.len(),
                    self.dimensions
                )));
            }
        }
        Ok(())
    }

    fn materialize(inner: &mut Inner, draft: &ArticleDraft) -> Article {
        let id = inner.next_article_id;
        inner.next_article_id += 1;
        Article {
            id,
            text: draft.text.clone(),
            summary: draft.summary.clone(),
            source: draft.source.clone(),
            category_id: draft.category_id,
            relevance_score: draft.relevance_score,
            date_written: draft.date_written,
            date_created: Utc::now(),
            embedding: draft.embedding.clone(),
        }
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn insert(&self, draft: &ArticleDraft) -> Result<Article> {
        if draft.text.trim().is_empty() {
            return Err(FortellError::InvalidInput(
                "Article text must not be empty".to_string(),
            ));
        }
        self.check_dimensions(draft.embedding.as_ref())?;

        let mut inner = self.inner.write().unwrap();
        let article = Self::materialize(&mut inner, draft);
        inner.articles.push(article.clone());
        Ok(article)
    }

    async fn insert_batch(&self, drafts: &[ArticleDraft]) -> Result<Vec<i64>> {
        // Validate everything up front so the batch lands whole or not at all.
        for draft in drafts {
            if draft.text.trim().is_empty() {
                return Err(FortellError::InvalidInput(
                    "Article text must not be empty".to_string(),
                ));
            }
            self.check_dimensions(draft.embedding.as_ref())?;
        }

        let mut inner = self.inner.write().unwrap();
        let mut ids = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let article = Self::materialize(&mut inner, draft);
            ids.push(article.id);
            inner.articles.push(article);
        }
        Ok(ids)
    }

    async fn get(&self, id: i64) -> Result<Option<Article>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Article>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .articles
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn by_category(&self, categories: &[i64], limit: usize) -> Result<Vec<Article>> {
        let inner = self.inner.read().unwrap();
        let mut matches: Vec<Article> = inner
            .articles
            .iter()
            .filter(|a| a.category_id.map(|c| categories.contains(&c)).unwrap_or(false))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.date_created.cmp(&a.date_created));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn embedded(&self, categories: Option<&[i64]>) -> Result<Vec<Article>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .articles
            .iter()
            .filter(|a| a.embedding.is_some())
            .filter(|a| match categories {
                Some(cats) if !cats.is_empty() => {
                    a.category_id.map(|c| cats.contains(&c)).unwrap_or(false)
                }
                _ => true,
            })
            .cloned()
            .collect())
    }

    async fn article_count(&self) -> Result<usize> {
        let inner = self.inner.read().unwrap();
        Ok(inner.articles.len())
    }

    async fn upsert_category(&self, id: i64, name: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.categories.insert(id, name.to_string());
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let inner = self.inner.read().unwrap();
        let mut categories: Vec<Category> = inner
            .categories
            .iter()
            .map(|(id, name)| Category {
                id: *id,
                name: name.clone(),
            })
            .collect();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn user_preference(&self, user_id: i64) -> Result<Option<Vec<f32>>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.user_preferences.get(&user_id).cloned())
    }

    async fn set_user_preference(&self, user_id: i64, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(FortellError::InvalidInput(format!(
                "Preference vector has {} dimensions, store expects {}",
                vector.len(),
                self.dimensions
            )));
        }
        let mut inner = self.inner.write().unwrap();
        inner.user_preferences.insert(user_id, vector.to_vec());
        Ok(())
    }

    async fn insert_podcast(&self, draft: &PodcastDraft) -> Result<PodcastRecord> {
        let mut inner = self.inner.write().unwrap();
        let id = inner.next_podcast_id;
        inner.next_podcast_id += 1;

        let record = PodcastRecord {
            id,
            user_id: draft.user_id,
            script: draft.script.clone(),
            s3_link: draft.s3_link.clone(),
            spotify_link: draft.spotify_link.clone(),
            date_created: Utc::now(),
        };
        inner.podcasts.push(record.clone());
        Ok(record)
    }

    async fn get_podcast(&self, id: i64) -> Result<Option<PodcastRecord>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.podcasts.iter().find(|p| p.id == id).cloned())
    }

    async fn podcasts_for_user(&self, user_id: i64, limit: usize) -> Result<Vec<PodcastRecord>> {
        let inner = self.inner.read().unwrap();
        let mut records: Vec<PodcastRecord> = inner
            .podcasts
            .iter()
            .filter(|p| p.user_id == Some(user_id))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date_created.cmp(&a.date_created));
        records.truncate(limit);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basics() {
        let store = MemoryArticleStore::new(3);

        let article = store
            .insert(&ArticleDraft {
                text: "hello".to_string(),
                embedding: Some(vec![1.0, 0.0, 0.0]),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(article.id, 1);
        assert_eq!(store.article_count().await.unwrap(), 1);
        assert_eq!(store.embedded(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_batch_validates_up_front() {
        let store = MemoryArticleStore::new(3);

        let drafts = vec![
            ArticleDraft {
                text: "fine".to_string(),
                ..Default::default()
            },
            ArticleDraft {
                text: "broken".to_string(),
                embedding: Some(vec![1.0]),
                ..Default::default()
            },
        ];

        assert!(store.insert_batch(&drafts).await.is_err());
        assert_eq!(store.article_count().await.unwrap(), 0);
    }
}
