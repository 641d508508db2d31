//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, mut settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(&settings)?;
            println!("{}", content);
        }

        ConfigAction::Path => {
            println!("{}", Settings::default_config_path().display());
        }

        ConfigAction::Set { key, value } => {
            match key.as_str() {
                "general.data_dir" => settings.general.data_dir = value.clone(),
                "general.log_level" => settings.general.log_level = value.clone(),
                "embedding.model" => settings.embedding.model = value.clone(),
                "embedding.dimensions" => settings.embedding.dimensions = value.parse()?,
                "narration.model" => settings.narration.model = value.clone(),
                "narration.voice" => settings.narration.voice = value.clone(),
                "narration.max_concurrent" => settings.narration.max_concurrent = value.parse()?,
                "summarization.model" => settings.summarization.model = value.clone(),
                "article_store.sqlite_path" => settings.article_store.sqlite_path = value.clone(),
                "storage.provider" => {
                    settings.storage.provider =
                        value.parse().map_err(|e: String| anyhow::anyhow!(e))?
                }
                "storage.media_dir" => settings.storage.media_dir = value.clone(),
                "storage.base_url" => settings.storage.base_url = value.clone(),
                "storage.endpoint" => settings.storage.endpoint = Some(value.clone()),
                _ => {
                    anyhow::bail!("Unknown configuration key: {}", key);
                }
            }

            settings.save()?;
            Output::success(&format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}
