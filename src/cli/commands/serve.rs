//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for article search, article ingest, and podcast
//! generation.

use crate::article_store::{Article, PodcastRecord};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::FortellError;
use crate::narration::VoiceId;
use crate::pipeline::{BatchOptions, BatchReport, PodcastPipeline, SeedItem};
use crate::retrieval::SelectionCriteria;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    pipeline: PodcastPipeline,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let pipeline = PodcastPipeline::new(settings)?;

    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/voices", get(voices))
        .route("/articles/search", post(search_articles))
        .route("/articles", post(create_article))
        .route("/articles/batch", post(ingest_batch))
        .route("/articles/{id}", get(get_article))
        .route("/podcasts/generate/query", post(generate_from_query))
        .route("/podcasts/generate/user", post(generate_from_user))
        .route("/podcasts/generate/articles", post(generate_from_articles))
        .route("/podcasts/generate/categories", post(generate_from_categories))
        .route("/podcasts/{id}", get(get_podcast))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Fortell API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Voices", "GET  /voices");
    Output::kv("Search", "POST /articles/search");
    Output::kv("Create Article", "POST /articles");
    Output::kv("Ingest Batch", "POST /articles/batch");
    Output::kv("Get Article", "GET  /articles/:id");
    Output::kv("Generate (query)", "POST /podcasts/generate/query");
    Output::kv("Generate (user)", "POST /podcasts/generate/user");
    Output::kv("Generate (ids)", "POST /podcasts/generate/articles");
    Output::kv("Generate (categories)", "POST /podcasts/generate/categories");
    Output::kv("Get Podcast", "GET  /podcasts/:id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    category_ids: Option<Vec<i64>>,
    #[serde(default)]
    similarity_floor: Option<f32>,
}

fn default_limit() -> usize {
    10
}

#[derive(Serialize)]
struct ArticleResponse {
    id: i64,
    text: String,
    summary: Option<String>,
    source: Option<String>,
    category_id: Option<i64>,
    relevance_score: Option<i32>,
    date_written: Option<DateTime<Utc>>,
    date_created: DateTime<Utc>,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            text: article.text,
            summary: article.summary,
            source: article.source,
            category_id: article.category_id,
            relevance_score: article.relevance_score,
            date_written: article.date_written,
            date_created: article.date_created,
        }
    }
}

#[derive(Deserialize)]
struct CreateArticleRequest {
    text: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    category_id: Option<i64>,
    #[serde(default)]
    relevance_score: Option<i32>,
    #[serde(default)]
    date_written: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct BatchRequest {
    results: Vec<SeedItem>,
    #[serde(default)]
    default_category_id: Option<i64>,
    #[serde(default)]
    default_relevance_score: Option<i32>,
    #[serde(default = "default_minutes")]
    target_duration_minutes: u32,
    #[serde(default)]
    voice_id: Option<String>,
}

fn default_minutes() -> u32 {
    2
}

#[derive(Deserialize)]
struct GenerateFromQueryRequest {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    category_ids: Option<Vec<i64>>,
    #[serde(default)]
    similarity_floor: Option<f32>,
    #[serde(default)]
    voice_id: Option<String>,
}

#[derive(Deserialize)]
struct GenerateFromUserRequest {
    user_id: i64,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    similarity_threshold: Option<f32>,
    #[serde(default)]
    voice_id: Option<String>,
}

#[derive(Deserialize)]
struct GenerateFromArticlesRequest {
    article_ids: Vec<i64>,
    #[serde(default)]
    voice_id: Option<String>,
}

#[derive(Deserialize)]
struct GenerateFromCategoriesRequest {
    category_ids: Vec<i64>,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    voice_id: Option<String>,
}

#[derive(Serialize)]
struct PodcastResponse {
    success: bool,
    podcast_id: i64,
    s3_link: String,
    message: String,
}

#[derive(Serialize)]
struct PodcastDetailResponse {
    id: i64,
    user_id: Option<i64>,
    script: String,
    s3_link: String,
    spotify_link: Option<String>,
    date_created: DateTime<Utc>,
}

impl From<PodcastRecord> for PodcastDetailResponse {
    fn from(record: PodcastRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            script: record.script,
            s3_link: record.s3_link,
            spotify_link: record.spotify_link,
            date_created: record.date_created,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Map a pipeline error onto an HTTP response.
fn error_response(e: FortellError) -> axum::response::Response {
    let status = match &e {
        FortellError::NoCandidates => StatusCode::NOT_FOUND,
        FortellError::InvalidCriteria(_) | FortellError::InvalidInput(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "service": "fortell" }))
}

async fn voices(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({ "voices": state.pipeline.voices() }))
}

async fn search_articles(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    let criteria = SelectionCriteria::ByQueryText {
        text: req.query,
        limit: req.limit,
        categories: req.category_ids,
        similarity_floor: req.similarity_floor,
    };

    match state.pipeline.retriever().select(&criteria).await {
        Ok(articles) => Json(
            articles
                .into_iter()
                .map(ArticleResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn create_article(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateArticleRequest>,
) -> impl IntoResponse {
    let draft = crate::article_store::ArticleDraft {
        text: req.text,
        summary: req.summary,
        source: req.source,
        category_id: req.category_id,
        relevance_score: req.relevance_score,
        date_written: req.date_written,
        embedding: None,
    };

    match state.pipeline.ingest_article(draft).await {
        Ok(article) => (StatusCode::CREATED, Json(ArticleResponse::from(article))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn ingest_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> impl IntoResponse {
    let options = BatchOptions {
        category_id: req.default_category_id,
        relevance_score: req.default_relevance_score,
        target_minutes: req.target_duration_minutes,
        voice: req.voice_id.map(VoiceId::new),
    };

    match state.pipeline.run_batch(&req.results, &options).await {
        Ok(report) => Json::<BatchReport>(report).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_article(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(id): axum::extract::Path<i64>,
) -> impl IntoResponse {
    match state.pipeline.store().get(id).await {
        Ok(Some(article)) => Json(ArticleResponse::from(article)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Article not found: {}", id),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn generate_from_query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateFromQueryRequest>,
) -> impl IntoResponse {
    let criteria = SelectionCriteria::ByQueryText {
        text: req.query,
        limit: req.limit,
        categories: req.category_ids,
        similarity_floor: req.similarity_floor,
    };

    run_pipeline(&state, criteria, req.voice_id, None).await
}

async fn generate_from_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateFromUserRequest>,
) -> impl IntoResponse {
    let criteria = match state
        .pipeline
        .criteria_for_user(req.user_id, req.limit, req.similarity_threshold)
        .await
    {
        Ok(criteria) => criteria,
        Err(e) => return error_response(e),
    };

    run_pipeline(&state, criteria, req.voice_id, Some(req.user_id)).await
}

async fn generate_from_articles(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateFromArticlesRequest>,
) -> impl IntoResponse {
    run_pipeline(
        &state,
        SelectionCriteria::ByIds(req.article_ids),
        req.voice_id,
        None,
    )
    .await
}

async fn generate_from_categories(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateFromCategoriesRequest>,
) -> impl IntoResponse {
    run_pipeline(
        &state,
        SelectionCriteria::ByCategory {
            categories: req.category_ids,
            limit: req.limit,
        },
        req.voice_id,
        None,
    )
    .await
}

async fn run_pipeline(
    state: &Arc<AppState>,
    criteria: SelectionCriteria,
    voice_id: Option<String>,
    user_id: Option<i64>,
) -> axum::response::Response {
    match state
        .pipeline
        .run(&criteria, voice_id.map(VoiceId::new), user_id)
        .await
    {
        Ok(record) => Json(PodcastResponse {
            success: true,
            podcast_id: record.id,
            s3_link: record.s3_link,
            message: "Successfully generated podcast".to_string(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_podcast(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(id): axum::extract::Path<i64>,
) -> impl IntoResponse {
    match state.pipeline.store().get_podcast(id).await {
        Ok(Some(record)) => Json(PodcastDetailResponse::from(record)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Podcast not found: {}", id),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
