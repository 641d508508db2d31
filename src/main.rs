//! Fortell CLI entry point.

use anyhow::Result;
use clap::Parser;
use fortell::cli::{commands, Cli, Commands};
use fortell::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("fortell={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure the data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Search {
            query,
            limit,
            floor,
            categories,
        } => {
            commands::run_search(query, *limit, *floor, categories.clone(), settings).await?;
        }

        Commands::Generate {
            query,
            user,
            ids,
            categories,
            limit,
            floor,
            voice,
        } => {
            commands::run_generate(
                commands::GenerateArgs {
                    query: query.clone(),
                    user: *user,
                    ids: ids.clone(),
                    categories: categories.clone(),
                    limit: *limit,
                    floor: *floor,
                    voice: voice.clone(),
                },
                settings,
            )
            .await?;
        }

        Commands::Ingest {
            file,
            category,
            relevance,
            minutes,
            voice,
        } => {
            commands::run_ingest(file, *category, *relevance, *minutes, voice.clone(), settings)
                .await?;
        }

        Commands::List { user, limit } => {
            commands::run_list(*user, *limit, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
