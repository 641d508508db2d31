//! Podcast pipeline for Fortell.
//!
//! Coordinates retrieval, script assembly, speech synthesis, audio storage,
//! and provenance recording.

use crate::article_store::{
    ArticleDraft, ArticleStore, PodcastDraft, PodcastRecord, SqliteArticleStore,
};
use crate::config::{Settings, StorageProvider};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{FortellError, Result};
use crate::narration::{OpenAISynthesizer, Synthesizer, VoiceId, VoiceInfo};
use crate::retrieval::{Retriever, SelectionCriteria};
use crate::script::ScriptAssembler;
use crate::storage::{batch_item_key, podcast_key, AudioStorage, HttpAudioStorage, LocalAudioStorage};
use crate::summarize::{OpenAISummarizer, Summarizer};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One externally-extracted item fed to the batch path.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SeedItem {
    /// Identifying URL, recorded in error entries and stored as the source.
    pub url: String,
    pub title: Option<String>,
    /// Extracted content; an item without content fails individually.
    pub text: Option<String>,
}

/// Per-batch defaults applied to every seed item.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub category_id: Option<i64>,
    pub relevance_score: Option<i32>,
    /// Target narration length per item, in minutes.
    pub target_minutes: u32,
    pub voice: Option<VoiceId>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            category_id: None,
            relevance_score: None,
            target_minutes: 2,
            voice: None,
        }
    }
}

/// Audio rendered for one successfully processed batch item.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BatchItemAudio {
    pub index: usize,
    pub title: Option<String>,
    pub source: String,
    pub audio_link: String,
}

/// Outcome of a batch run. Zero successes is still an Ok outcome; only an
/// unreachable store fails the call itself.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BatchReport {
    /// Number of seed items attempted.
    pub articles_found: usize,
    pub articles_processed: usize,
    pub articles_with_audio: usize,
    /// Ids assigned by the final commit, in seed order.
    pub article_ids: Vec<i64>,
    pub articles: Vec<BatchItemAudio>,
    /// One entry per failed item, keyed by index and URL.
    pub errors: Vec<String>,
}

/// The main pipeline: selection criteria in, podcast record out.
///
/// All external collaborators are injected once at construction and shared
/// for the life of the process; nothing here is reconstructed mid-run.
pub struct PodcastPipeline {
    settings: Settings,
    store: Arc<dyn ArticleStore>,
    embedder: Arc<dyn Embedder>,
    synthesizer: Arc<dyn Synthesizer>,
    summarizer: Arc<dyn Summarizer>,
    storage: Arc<dyn AudioStorage>,
    retriever: Retriever,
}

impl PodcastPipeline {
    /// Create a pipeline with default components from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let dimensions = settings.embedding.dimensions as usize;

        let store: Arc<dyn ArticleStore> =
            Arc::new(SqliteArticleStore::new(&settings.sqlite_path(), dimensions)?);

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            dimensions,
        ));

        let synthesizer: Arc<dyn Synthesizer> =
            Arc::new(OpenAISynthesizer::with_config(&settings.narration.model));

        let summarizer: Arc<dyn Summarizer> = Arc::new(OpenAISummarizer::with_config(
            &settings.summarization.model,
            settings.summarization.words_per_minute,
            settings.summarization.max_input_chars,
        ));

        let storage: Arc<dyn AudioStorage> = match settings.storage.provider {
            StorageProvider::Local => Arc::new(LocalAudioStorage::new(
                settings.media_dir(),
                &settings.storage.base_url,
            )),
            StorageProvider::Http => {
                let endpoint = settings.storage.endpoint.as_deref().ok_or_else(|| {
                    FortellError::Config(
                        "storage.endpoint is required for the http provider".to_string(),
                    )
                })?;
                Arc::new(HttpAudioStorage::new(endpoint, &settings.storage.base_url))
            }
        };

        Ok(Self::with_components(
            settings,
            store,
            embedder,
            synthesizer,
            summarizer,
            storage,
        ))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        store: Arc<dyn ArticleStore>,
        embedder: Arc<dyn Embedder>,
        synthesizer: Arc<dyn Synthesizer>,
        summarizer: Arc<dyn Summarizer>,
        storage: Arc<dyn AudioStorage>,
    ) -> Self {
        let retriever = Retriever::new(store.clone(), embedder.clone());

        Self {
            settings,
            store,
            embedder,
            synthesizer,
            summarizer,
            storage,
            retriever,
        }
    }

    /// Get a reference to the article store.
    pub fn store(&self) -> Arc<dyn ArticleStore> {
        self.store.clone()
    }

    /// Get a reference to the retriever.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Voices offered by the synthesis engine.
    pub fn voices(&self) -> Vec<VoiceInfo> {
        self.synthesizer.voices()
    }

    /// The voice used when a request does not name one.
    pub fn default_voice(&self) -> VoiceId {
        VoiceId::new(self.settings.narration.voice.clone())
    }

    /// Build user-preference criteria by resolving the stored vector.
    ///
    /// A user without a stored preference vector has no candidates.
    pub async fn criteria_for_user(
        &self,
        user_id: i64,
        limit: usize,
        similarity_floor: Option<f32>,
    ) -> Result<SelectionCriteria> {
        let vector = self
            .store
            .user_preference(user_id)
            .await?
            .ok_or(FortellError::NoCandidates)?;

        Ok(SelectionCriteria::ByUserPreference {
            vector,
            limit,
            similarity_floor,
        })
    }

    /// Embed and store a single article.
    pub async fn ingest_article(&self, mut draft: ArticleDraft) -> Result<crate::article_store::Article> {
        if draft.embedding.is_none() {
            draft.embedding = Some(self.embedder.embed(&draft.text).await?);
        }
        self.store.insert(&draft).await
    }

    /// Run the full single-podcast path: select, assemble, synthesize,
    /// store audio, record provenance.
    ///
    /// Steps are strictly sequential; any failure aborts the run with its
    /// originating error kind and no partial record is persisted.
    #[instrument(skip(self, criteria))]
    pub async fn run(
        &self,
        criteria: &SelectionCriteria,
        voice: Option<VoiceId>,
        user_id: Option<i64>,
    ) -> Result<PodcastRecord> {
        let voice = voice.unwrap_or_else(|| self.default_voice());

        let articles = self.retriever.select(criteria).await?;
        if articles.is_empty() {
            return Err(FortellError::NoCandidates);
        }
        info!("Selected {} articles", articles.len());

        let category_names = self.category_names().await?;
        let doc = ScriptAssembler::assemble(&articles, &category_names);

        let audio = self.synthesizer.synthesize(&doc.script, &voice).await?;
        info!("Synthesized {} bytes of audio", audio.len());

        let key = podcast_key(Utc::now());
        let s3_link = self.storage.store(&key, &audio).await?;

        let record = self
            .store
            .insert_podcast(&PodcastDraft {
                user_id,
                script: doc.script,
                s3_link,
                spotify_link: None,
            })
            .await?;

        info!("Recorded podcast {} ({} stories)", record.id, doc.story_count);
        Ok(record)
    }

    /// Run the batch ingest-and-narrate path.
    ///
    /// Each seed is processed in isolation: summarization, synthesis,
    /// upload, or embedding failure on one item is recorded and the rest
    /// continue. The surviving articles land in ONE store transaction after
    /// every item was attempted; only that commit failing aborts the batch.
    #[instrument(skip(self, seeds, options), fields(seeds = seeds.len()))]
    pub async fn run_batch(
        &self,
        seeds: &[SeedItem],
        options: &BatchOptions,
    ) -> Result<BatchReport> {
        let voice = options.voice.clone().unwrap_or_else(|| self.default_voice());
        let at = Utc::now();

        let max_concurrent = self.settings.narration.max_concurrent.max(1);

        let indexed: Vec<(usize, SeedItem)> = seeds.iter().cloned().enumerate().collect();
        let outcomes: Vec<(usize, String, Result<(ArticleDraft, BatchItemAudio)>)> =
            stream::iter(indexed.into_iter().map(|(idx, seed)| {
                let voice = voice.clone();
                let summarizer = self.summarizer.clone();
                let synthesizer = self.synthesizer.clone();
                let storage = self.storage.clone();
                let embedder = self.embedder.clone();
                let options = options.clone();

                async move {
                    let url = seed.url.clone();
                    let outcome = Self::process_seed(
                        idx, seed, &voice, summarizer, synthesizer, storage, embedder, &options, at,
                    )
                    .await;
                    (idx, url, outcome)
                }
            }))
            .buffered(max_concurrent)
            .collect()
            .await;

        let mut report = BatchReport {
            articles_found: seeds.len(),
            ..Default::default()
        };
        let mut drafts = Vec::new();

        for (idx, url, outcome) in outcomes {
            match outcome {
                Ok((draft, audio)) => {
                    report.articles_processed += 1;
                    report.articles_with_audio += 1;
                    report.articles.push(audio);
                    drafts.push(draft);
                }
                Err(e) => {
                    let message = format!("Article {} ({}): {}", idx, url, e);
                    warn!("{}", message);
                    report.errors.push(message);
                }
            }
        }

        // One transaction for the whole batch: every draft or none of them.
        if !drafts.is_empty() {
            report.article_ids = self.store.insert_batch(&drafts).await?;
        }

        info!(
            "Batch complete: {}/{} items processed, {} errors",
            report.articles_processed,
            report.articles_found,
            report.errors.len()
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_seed(
        idx: usize,
        seed: SeedItem,
        voice: &VoiceId,
        summarizer: Arc<dyn Summarizer>,
        synthesizer: Arc<dyn Synthesizer>,
        storage: Arc<dyn AudioStorage>,
        embedder: Arc<dyn Embedder>,
        options: &BatchOptions,
        at: DateTime<Utc>,
    ) -> Result<(ArticleDraft, BatchItemAudio)> {
        let text = seed
            .text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| FortellError::InvalidInput("No text content available".to_string()))?;

        let summary = summarizer
            .summarize(text, seed.title.as_deref(), options.target_minutes)
            .await?;

        let audio = synthesizer.synthesize(&summary, voice).await?;
        let audio_link = storage.store(&batch_item_key(idx, at), &audio).await?;

        // Embed the original text, not the summary.
        let embedding = embedder.embed(text).await?;

        let draft = ArticleDraft {
            text: text.to_string(),
            summary: Some(summary),
            source: Some(seed.url.clone()),
            category_id: options.category_id,
            relevance_score: options.relevance_score,
            date_written: None,
            embedding: Some(embedding),
        };

        let audio_info = BatchItemAudio {
            index: idx,
            title: seed.title,
            source: seed.url,
            audio_link,
        };

        Ok((draft, audio_info))
    }

    async fn category_names(&self) -> Result<HashMap<i64, String>> {
        Ok(self
            .store
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect())
    }
}
