//! Fortell - News Narration
//!
//! Turn stored news articles into narrated podcast audio.
//!
//! The name "Fortell" comes from the Norwegian word for "tell."
//!
//! # Overview
//!
//! Fortell allows you to:
//! - Ingest news articles and compute semantic embeddings for retrieval
//! - Select relevant articles by query, user preference, id, or category
//! - Assemble a multi-article narration script deterministically
//! - Render the script to audio and record where it landed
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `article_store` - Article, category, and podcast-record storage
//! - `embedding` - Embedding generation
//! - `retrieval` - Selection criteria and similarity ranking
//! - `script` - Narration script assembly
//! - `narration` - Speech synthesis
//! - `summarize` - Narration-ready summarization for batch ingest
//! - `storage` - Durable audio storage
//! - `pipeline` - End-to-end coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use fortell::config::Settings;
//! use fortell::pipeline::PodcastPipeline;
//! use fortell::retrieval::SelectionCriteria;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = PodcastPipeline::new(settings)?;
//!
//!     let record = pipeline
//!         .run(
//!             &SelectionCriteria::ByCategory { categories: vec![3], limit: 5 },
//!             None,
//!             None,
//!         )
//!         .await?;
//!     println!("Podcast audio at {}", record.s3_link);
//!
//!     Ok(())
//! }
//! ```

pub mod article_store;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod narration;
pub mod openai;
pub mod pipeline;
pub mod retrieval;
pub mod script;
pub mod storage;
pub mod summarize;

pub use error::{FortellError, Result};
