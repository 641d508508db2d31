//! Init command implementation.

use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the init command: create directories, write a default config, and
/// check the environment.
pub fn run_init(settings: &Settings) -> Result<()> {
    Output::header("Fortell Init");
    println!();

    std::fs::create_dir_all(settings.data_dir())?;
    Output::success(&format!("Data directory: {}", settings.data_dir().display()));

    std::fs::create_dir_all(settings.media_dir())?;
    Output::success(&format!("Media directory: {}", settings.media_dir().display()));

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config already exists: {}", config_path.display()));
    } else {
        settings.save()?;
        Output::success(&format!("Wrote default config: {}", config_path.display()));
    }

    if std::env::var("OPENAI_API_KEY").is_ok() {
        Output::success("OPENAI_API_KEY is set");
    } else {
        Output::warning("OPENAI_API_KEY is not set; embedding, summarization, and synthesis calls will fail");
    }

    println!();
    Output::info("Run 'fortell serve' to start the API, or 'fortell generate --help' to get started.");
    Ok(())
}
