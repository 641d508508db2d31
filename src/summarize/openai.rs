//! OpenAI chat-completion summarizer.

use super::Summarizer;
use crate::error::{FortellError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

const SYSTEM_PROMPT: &str = "You are an expert news summarizer creating content for audio podcasts. \
    Create engaging, natural-sounding summaries that work well when read aloud. \
    Use clear, conversational language. Avoid complex formatting or special characters.";

/// OpenAI-based summarizer.
pub struct OpenAISummarizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    words_per_minute: u32,
    max_input_chars: usize,
}

impl OpenAISummarizer {
    /// Create a new summarizer with default settings.
    pub fn new() -> Self {
        Self::with_config("gpt-4o-mini", 150, 8000)
    }

    /// Create a new summarizer with custom model and sizing.
    pub fn with_config(model: &str, words_per_minute: u32, max_input_chars: usize) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            words_per_minute,
            max_input_chars,
        }
    }

    fn build_user_prompt(&self, text: &str, title: Option<&str>, target_minutes: u32) -> String {
        let target_words = target_minutes * self.words_per_minute;

        let mut prompt = format!(
            "Summarize the following article in approximately {} words \
             (for a {}-minute audio narration at {} words per minute).\n\n\
             Requirements:\n\
             - Make it engaging and natural for audio listening\n\
             - Use conversational language\n\
             - Include key facts and insights\n\
             - Start with a brief hook\n\
             - End with a conclusion or key takeaway\n\
             - Avoid bullet points, use flowing prose\n\n",
            target_words, target_minutes, self.words_per_minute
        );

        if let Some(title) = title {
            prompt.push_str(&format!("Article Title: {}\n\n", title));
        }

        // Cap the input so oversized articles do not overflow the model context.
        let capped: String = text.chars().take(self.max_input_chars).collect();
        prompt.push_str(&format!("Article Text:\n{}", capped));
        prompt
    }
}

impl Default for OpenAISummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for OpenAISummarizer {
    #[instrument(skip(self, text, title), fields(text_chars = text.len()))]
    async fn summarize(
        &self,
        text: &str,
        title: Option<&str>,
        target_minutes: u32,
    ) -> Result<String> {
        if text.trim().is_empty() {
            return Err(FortellError::Summarization(
                "Cannot summarize empty input".to_string(),
            ));
        }

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| FortellError::Summarization(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(self.build_user_prompt(text, title, target_minutes))
                .build()
                .map_err(|e| FortellError::Summarization(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .build()
            .map_err(|e| FortellError::Summarization(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| FortellError::Summarization(format!("Chat API error: {}", e)))?;

        let summary = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                FortellError::Summarization("Model returned an empty summary".to_string())
            })?;

        debug!("Generated summary with {} words", summary.split_whitespace().count());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_target_words_and_title() {
        let summarizer = OpenAISummarizer::with_config("gpt-4o-mini", 150, 8000);
        let prompt = summarizer.build_user_prompt("body", Some("Headline"), 2);

        assert!(prompt.contains("approximately 300 words"));
        assert!(prompt.contains("2-minute audio narration"));
        assert!(prompt.contains("Article Title: Headline"));
        assert!(prompt.contains("Article Text:\nbody"));
    }

    #[test]
    fn test_prompt_caps_input_length() {
        let summarizer = OpenAISummarizer::with_config("gpt-4o-mini", 150, 100);
        let long = "a".repeat(500);
        let prompt = summarizer.build_user_prompt(&long, None, 1);

        let body = prompt.split("Article Text:\n").nth(1).unwrap();
        assert_eq!(body.chars().count(), 100);
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_api_call() {
        let summarizer = OpenAISummarizer::new();
        let err = summarizer.summarize(" ", None, 2).await.unwrap_err();
        assert!(matches!(err, FortellError::Summarization(_)));
    }
}
