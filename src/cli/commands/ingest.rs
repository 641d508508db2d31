//! Ingest command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::narration::VoiceId;
use crate::pipeline::{BatchOptions, PodcastPipeline, SeedItem};
use anyhow::Result;

/// Run the ingest command: narrate and store a batch of seed items from a
/// JSON file.
pub async fn run_ingest(
    file: &str,
    category: Option<i64>,
    relevance: Option<i32>,
    minutes: u32,
    voice: Option<String>,
    settings: Settings,
) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let seeds: Vec<SeedItem> = serde_json::from_str(&content)?;

    if seeds.is_empty() {
        Output::warning("Seed file contains no items.");
        return Ok(());
    }

    // Reject obviously malformed source URLs before spending API calls.
    for seed in &seeds {
        if url::Url::parse(&seed.url).is_err() {
            anyhow::bail!("Seed item has an invalid URL: {}", seed.url);
        }
    }

    let pipeline = PodcastPipeline::new(settings)?;

    let options = BatchOptions {
        category_id: category,
        relevance_score: relevance,
        target_minutes: minutes,
        voice: voice.map(VoiceId::new),
    };

    let spinner = Output::spinner(&format!("Processing {} items...", seeds.len()));
    let report = pipeline.run_batch(&seeds, &options).await;
    spinner.finish_and_clear();

    match report {
        Ok(report) => {
            Output::success(&format!(
                "Processed {}/{} items ({} with audio)",
                report.articles_processed, report.articles_found, report.articles_with_audio
            ));

            if !report.article_ids.is_empty() {
                Output::kv(
                    "Article ids",
                    &report
                        .article_ids
                        .iter()
                        .map(|id| id.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                );
            }

            for item in &report.articles {
                Output::list_item(&format!(
                    "{} -> {}",
                    item.title.as_deref().unwrap_or(&item.source),
                    item.audio_link
                ));
            }

            if !report.errors.is_empty() {
                Output::warning(&format!("{} items failed:", report.errors.len()));
                for error in &report.errors {
                    Output::list_item(error);
                }
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Batch failed: {}", e));
            Err(anyhow::anyhow!("{}", e))
        }
    }
}
