//! Generate command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::FortellError;
use crate::narration::VoiceId;
use crate::pipeline::PodcastPipeline;
use crate::retrieval::SelectionCriteria;
use anyhow::Result;

/// Arguments for one podcast generation run; exactly one selector is set.
pub struct GenerateArgs {
    pub query: Option<String>,
    pub user: Option<i64>,
    pub ids: Option<Vec<i64>>,
    pub categories: Option<Vec<i64>>,
    pub limit: usize,
    pub floor: Option<f32>,
    pub voice: Option<String>,
}

/// Run the generate command.
pub async fn run_generate(args: GenerateArgs, settings: Settings) -> Result<()> {
    let pipeline = PodcastPipeline::new(settings)?;

    let criteria = match (&args.query, args.user, &args.ids, &args.categories) {
        (Some(query), None, None, None) => SelectionCriteria::ByQueryText {
            text: query.clone(),
            limit: args.limit,
            categories: None,
            similarity_floor: args.floor,
        },
        (None, Some(user_id), None, None) => {
            pipeline
                .criteria_for_user(user_id, args.limit, args.floor)
                .await?
        }
        (None, None, Some(ids), None) => SelectionCriteria::ByIds(ids.clone()),
        (None, None, None, Some(categories)) => SelectionCriteria::ByCategory {
            categories: categories.clone(),
            limit: args.limit,
        },
        _ => {
            anyhow::bail!("Pass exactly one of --query, --user, --ids, or --categories");
        }
    };

    let spinner = Output::spinner("Generating podcast...");
    let result = pipeline
        .run(&criteria, args.voice.map(VoiceId::new), args.user)
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(record) => {
            Output::success(&format!("Generated podcast {}", record.id));
            Output::kv("Audio", &record.s3_link);
            Output::kv("Script length", &format!("{} chars", record.script.len()));
            Ok(())
        }
        Err(FortellError::NoCandidates) => {
            Output::warning("No articles matched the selection; nothing to narrate.");
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Generation failed: {}", e));
            Err(anyhow::anyhow!("{}", e))
        }
    }
}
