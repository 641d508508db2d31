//! Search command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::PodcastPipeline;
use crate::retrieval::SelectionCriteria;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: usize,
    floor: Option<f32>,
    categories: Option<Vec<i64>>,
    settings: Settings,
) -> Result<()> {
    let pipeline = PodcastPipeline::new(settings)?;

    let criteria = SelectionCriteria::ByQueryText {
        text: query.to_string(),
        limit,
        categories,
        similarity_floor: floor,
    };

    let spinner = Output::spinner("Searching...");
    let results = pipeline.retriever().select(&criteria).await;
    spinner.finish_and_clear();

    match results {
        Ok(articles) => {
            if articles.is_empty() {
                Output::warning("No articles found matching your query.");
            } else {
                Output::success(&format!("Found {} articles", articles.len()));
                for article in &articles {
                    Output::article_result(
                        article.id,
                        article.source.as_deref(),
                        article.narration_content(),
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
