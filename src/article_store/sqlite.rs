//! SQLite-based article store implementation.
//!
//! Embeddings are stored as little-endian f32 BLOBs and compared in Rust.
//! Similarity ranking happens in the retriever, not in SQL: the store only
//! hands back the rows that carry an embedding.

use super::{
    Article, ArticleDraft, ArticleStore, Category, PodcastDraft, PodcastRecord,
};
use crate::error::{FortellError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    summary TEXT,
    source TEXT,
    category_id INTEGER,
    relevance_score INTEGER,
    date_written TEXT,
    date_created TEXT NOT NULL,
    embedding BLOB
);

CREATE INDEX IF NOT EXISTS idx_articles_category_id ON articles(category_id);
CREATE INDEX IF NOT EXISTS idx_articles_date_created ON articles(date_created);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    preferences BLOB
);

CREATE TABLE IF NOT EXISTS podcasts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    script TEXT NOT NULL,
    s3_link TEXT NOT NULL,
    spotify_link TEXT,
    date_created TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_podcasts_user_id ON podcasts(user_id);
"#;

/// SQLite-based article store.
pub struct SqliteArticleStore {
    conn: Mutex<Connection>,
    dimensions: usize,
}

impl SqliteArticleStore {
    /// Open (or create) an article store at the given path.
    ///
    /// `dimensions` is the embedding width every stored vector must match.
    #[instrument(skip_all)]
    pub fn new(path: &Path, dimensions: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite article store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            dimensions,
        })
    }

    /// Create an in-memory article store (useful for testing).
    pub fn in_memory(dimensions: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            dimensions,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| FortellError::Storage(format!("Failed to acquire lock: {}", e)))
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

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_article(row: &Row<'_>) -> rusqlite::Result<Article> {
        let date_written_str: Option<String> = row.get(6)?;
        let date_created_str: String = row.get(7)?;
        let embedding_bytes: Option<Vec<u8>> = row.get(8)?;

        Ok(Article {
            id: row.get(0)?,
            text: row.get(1)?,
            summary: row.get(2)?,
            source: row.get(3)?,
            category_id: row.get(4)?,
            relevance_score: row.get(5)?,
            date_written: date_written_str
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|dt| dt.with_timezone(&Utc))),
            date_created: DateTime::parse_from_rfc3339(&date_created_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            embedding: embedding_bytes.map(|b| Self::bytes_to_embedding(&b)),
        })
    }

    fn insert_draft(conn: &Connection, draft: &ArticleDraft, date_created: &str) -> Result<i64> {
        conn.execute(
            r#"
            INSERT INTO articles
            (text, summary, source, category_id, relevance_score, date_written, date_created, embedding)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                draft.text,
                draft.summary,
                draft.source,
                draft.category_id,
                draft.relevance_score,
                draft.date_written.map(|dt| dt.to_rfc3339()),
                date_created,
                draft.embedding.as_deref().map(Self::embedding_to_bytes),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    const ARTICLE_COLUMNS: &'static str =
        "id, text, summary, source, category_id, relevance_score, date_written, date_created, embedding";
}

#[async_trait]
impl ArticleStore for SqliteArticleStore {
    #[instrument(skip(self, draft))]
    async fn insert(&self, draft: &ArticleDraft) -> Result<Article> {
        if draft.text.trim().is_empty() {
            return Err(FortellError::InvalidInput(
                "Article text must not be empty".to_string(),
            ));
        }
        self.check_dimensions(draft.embedding.as_ref())?;

        let date_created = Utc::now();
        let id = {
            let conn = self.lock()?;
            Self::insert_draft(&conn, draft, &date_created.to_rfc3339())?
        };

        debug!("Inserted article {}", id);

        Ok(Article {
            id,
            text: draft.text.clone(),
            summary: draft.summary.clone(),
            source: draft.source.clone(),
            category_id: draft.category_id,
            relevance_score: draft.relevance_score,
            date_written: draft.date_written,
            date_created,
            embedding: draft.embedding.clone(),
        })
    }

    #[instrument(skip(self, drafts), fields(count = drafts.len()))]
    async fn insert_batch(&self, drafts: &[ArticleDraft]) -> Result<Vec<i64>> {
        for draft in drafts {
            if draft.text.trim().is_empty() {
                return Err(FortellError::InvalidInput(
                    "Article text must not be empty".to_string(),
                ));
            }
            self.check_dimensions(draft.embedding.as_ref())?;
        }

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let date_created = Utc::now().to_rfc3339();
        let mut ids = Vec::with_capacity(drafts.len());
        for draft in drafts {
            ids.push(Self::insert_draft(&tx, draft, &date_created)?);
        }

        tx.commit()?;
        info!("Committed {} articles in one transaction", ids.len());
        Ok(ids)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: i64) -> Result<Option<Article>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            &format!("SELECT {} FROM articles WHERE id = ?1", Self::ARTICLE_COLUMNS),
            params![id],
            Self::row_to_article,
        );

        match result {
            Ok(article) => Ok(Some(article)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Article>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM articles WHERE id IN ({})",
            Self::ARTICLE_COLUMNS,
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(rusqlite::params_from_iter(ids.iter()), Self::row_to_article)?;
        let articles: Vec<Article> = rows.filter_map(|r| r.ok()).collect();

        debug!("Fetched {} of {} requested articles", articles.len(), ids.len());
        Ok(articles)
    }

    #[instrument(skip(self, categories))]
    async fn by_category(&self, categories: &[i64], limit: usize) -> Result<Vec<Article>> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;

        let placeholders = vec!["?"; categories.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM articles WHERE category_id IN ({}) ORDER BY date_created DESC LIMIT {}",
            Self::ARTICLE_COLUMNS,
            placeholders,
            limit
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(
            rusqlite::params_from_iter(categories.iter()),
            Self::row_to_article,
        )?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    #[instrument(skip(self, categories))]
    async fn embedded(&self, categories: Option<&[i64]>) -> Result<Vec<Article>> {
        let conn = self.lock()?;

        let sql = match categories {
            Some(cats) if !cats.is_empty() => {
                let placeholders = vec!["?"; cats.len()].join(", ");
                format!(
                    "SELECT {} FROM articles WHERE embedding IS NOT NULL AND category_id IN ({})",
                    Self::ARTICLE_COLUMNS,
                    placeholders
                )
            }
            _ => format!(
                "SELECT {} FROM articles WHERE embedding IS NOT NULL",
                Self::ARTICLE_COLUMNS
            ),
        };
        let mut stmt = conn.prepare(&sql)?;

        let articles: Vec<Article> = match categories {
            Some(cats) if !cats.is_empty() => stmt
                .query_map(rusqlite::params_from_iter(cats.iter()), Self::row_to_article)?
                .filter_map(|r| r.ok())
                .collect(),
            _ => stmt
                .query_map([], Self::row_to_article)?
                .filter_map(|r| r.ok())
                .collect(),
        };

        debug!("Scanned {} embedded articles", articles.len());
        Ok(articles)
    }

    async fn article_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn upsert_category(&self, id: i64, name: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO categories (id, name) VALUES (?1, ?2)",
            params![id, name],
        )?;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    #[instrument(skip(self))]
    async fn user_preference(&self, user_id: i64) -> Result<Option<Vec<f32>>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT preferences FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get::<_, Option<Vec<u8>>>(0),
        );

        match result {
            Ok(bytes) => Ok(bytes.map(|b| Self::bytes_to_embedding(&b))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_user_preference(&self, user_id: i64, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(FortellError::InvalidInput(format!(
                "Preference vector has {} dimensions, store expects {}",
                vector.len(),
                self.dimensions
            )));
        }

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO users (id, preferences) VALUES (?1, ?2)",
            params![user_id, Self::embedding_to_bytes(vector)],
        )?;
        Ok(())
    }

    #[instrument(skip(self, draft))]
    async fn insert_podcast(&self, draft: &PodcastDraft) -> Result<PodcastRecord> {
        let date_created = Utc::now();
        let id = {
            let conn = self.lock()?;
            conn.execute(
                r#"
                INSERT INTO podcasts (user_id, script, s3_link, spotify_link, date_created)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    draft.user_id,
                    draft.script,
                    draft.s3_link,
                    draft.spotify_link,
                    date_created.to_rfc3339(),
                ],
            )?;
            conn.last_insert_rowid()
        };

        info!("Recorded podcast {}", id);

        Ok(PodcastRecord {
            id,
            user_id: draft.user_id,
            script: draft.script.clone(),
            s3_link: draft.s3_link.clone(),
            spotify_link: draft.spotify_link.clone(),
            date_created,
        })
    }

    async fn get_podcast(&self, id: i64) -> Result<Option<PodcastRecord>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT id, user_id, script, s3_link, spotify_link, date_created FROM podcasts WHERE id = ?1",
            params![id],
            |row| {
                let date_created_str: String = row.get(5)?;
                Ok(PodcastRecord {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    script: row.get(2)?,
                    s3_link: row.get(3)?,
                    spotify_link: row.get(4)?,
                    date_created: DateTime::parse_from_rfc3339(&date_created_str)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn podcasts_for_user(&self, user_id: i64, limit: usize) -> Result<Vec<PodcastRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT id, user_id, script, s3_link, spotify_link, date_created
             FROM podcasts WHERE user_id = ?1 ORDER BY date_created DESC LIMIT {}",
            limit
        ))?;

        let rows = stmt.query_map(params![user_id], |row| {
            let date_created_str: String = row.get(5)?;
            Ok(PodcastRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                script: row.get(2)?,
                s3_link: row.get(3)?,
                spotify_link: row.get(4)?,
                date_created: DateTime::parse_from_rfc3339(&date_created_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(text: &str, embedding: Option<Vec<f32>>) -> ArticleDraft {
        ArticleDraft {
            text: text.to_string(),
            embedding,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let store = SqliteArticleStore::in_memory(3).unwrap();

        let a = store.insert(&draft("first", Some(vec![1.0, 0.0, 0.0]))).await.unwrap();
        let b = store.insert(&draft("second", None)).await.unwrap();

        assert!(a.id > 0);
        assert!(b.id > a.id);
        assert_eq!(store.article_count().await.unwrap(), 2);

        let fetched = store.get(a.id).await.unwrap().unwrap();
        assert_eq!(fetched.text, "first");
        assert_eq!(fetched.embedding, Some(vec![1.0, 0.0, 0.0]));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = SqliteArticleStore::in_memory(3).unwrap();

        let err = store.insert(&draft("bad", Some(vec![1.0, 0.0]))).await.unwrap_err();
        assert!(matches!(err, FortellError::InvalidInput(_)));
        assert_eq!(store.article_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_embedded_excludes_vectorless_rows() {
        let store = SqliteArticleStore::in_memory(3).unwrap();

        store.insert(&draft("with", Some(vec![1.0, 0.0, 0.0]))).await.unwrap();
        store.insert(&draft("without", None)).await.unwrap();

        let embedded = store.embedded(None).await.unwrap();
        assert_eq!(embedded.len(), 1);
        assert_eq!(embedded[0].text, "with");
    }

    #[tokio::test]
    async fn test_embedded_category_filter() {
        let store = SqliteArticleStore::in_memory(2).unwrap();

        let mut d1 = draft("cat3", Some(vec![1.0, 0.0]));
        d1.category_id = Some(3);
        let mut d2 = draft("cat7", Some(vec![0.0, 1.0]));
        d2.category_id = Some(7);
        store.insert(&d1).await.unwrap();
        store.insert(&d2).await.unwrap();

        let only3 = store.embedded(Some(&[3])).await.unwrap();
        assert_eq!(only3.len(), 1);
        assert_eq!(only3[0].text, "cat3");
    }

    #[tokio::test]
    async fn test_get_by_ids_omits_missing() {
        let store = SqliteArticleStore::in_memory(3).unwrap();

        let a = store.insert(&draft("a", None)).await.unwrap();
        let b = store.insert(&draft("b", None)).await.unwrap();

        let found = store.get_by_ids(&[a.id, 999, b.id]).await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_insert_batch_is_atomic() {
        let store = SqliteArticleStore::in_memory(3).unwrap();

        // A bad draft anywhere in the batch means nothing is persisted.
        let drafts = vec![
            draft("ok", Some(vec![1.0, 0.0, 0.0])),
            draft("bad dims", Some(vec![1.0])),
        ];
        assert!(store.insert_batch(&drafts).await.is_err());
        assert_eq!(store.article_count().await.unwrap(), 0);

        let good = vec![draft("one", None), draft("two", Some(vec![0.0, 1.0, 0.0]))];
        let ids = store.insert_batch(&good).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(store.article_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_categories_roundtrip() {
        let store = SqliteArticleStore::in_memory(3).unwrap();

        store.upsert_category(3, "Technology").await.unwrap();
        store.upsert_category(5, "Politics").await.unwrap();
        store.upsert_category(3, "Tech").await.unwrap();

        let cats = store.list_categories().await.unwrap();
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].name, "Tech");
    }

    #[tokio::test]
    async fn test_user_preference_roundtrip() {
        let store = SqliteArticleStore::in_memory(3).unwrap();

        assert!(store.user_preference(1).await.unwrap().is_none());

        store.set_user_preference(1, &[0.5, 0.5, 0.0]).await.unwrap();
        let pref = store.user_preference(1).await.unwrap().unwrap();
        assert_eq!(pref, vec![0.5, 0.5, 0.0]);

        assert!(store.set_user_preference(1, &[0.5]).await.is_err());
    }

    #[tokio::test]
    async fn test_podcast_record_roundtrip() {
        let store = SqliteArticleStore::in_memory(3).unwrap();

        let record = store
            .insert_podcast(&PodcastDraft {
                user_id: Some(42),
                script: "Welcome...".to_string(),
                s3_link: "http://example.com/podcast.mp3".to_string(),
                spotify_link: None,
            })
            .await
            .unwrap();

        let fetched = store.get_podcast(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.script, "Welcome...");
        assert_eq!(fetched.user_id, Some(42));

        let for_user = store.podcasts_for_user(42, 10).await.unwrap();
        assert_eq!(for_user.len(), 1);
        assert!(store.podcasts_for_user(7, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.db");
        let store = SqliteArticleStore::new(&path, 3).unwrap();

        store.insert(&draft("persisted", None)).await.unwrap();
        assert_eq!(store.article_count().await.unwrap(), 1);
        assert!(path.exists());
    }
}
