//! Narration-ready summarization for the batch ingest path.

mod openai;

pub use openai::OpenAISummarizer;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for summary generation.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Condense article text into a summary sized for `target_minutes` of
    /// spoken narration.
    async fn summarize(
        &self,
        text: &str,
        title: Option<&str>,
        target_minutes: u32,
    ) -> Result<String>;
}
