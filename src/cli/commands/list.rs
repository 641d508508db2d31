//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::PodcastPipeline;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(user: i64, limit: usize, settings: Settings) -> Result<()> {
    let pipeline = PodcastPipeline::new(settings)?;

    let records = pipeline.store().podcasts_for_user(user, limit).await?;

    if records.is_empty() {
        Output::warning(&format!("No podcasts recorded for user {}.", user));
        return Ok(());
    }

    Output::header(&format!("Podcasts for user {}", user));
    for record in &records {
        Output::podcast_info(
            record.id,
            &record.s3_link,
            &record.date_created.format("%Y-%m-%d %H:%M").to_string(),
        );
    }

    Ok(())
}
