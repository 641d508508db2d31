//! CLI module for Fortell.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Fortell - News Narration
///
/// Turn stored news articles into narrated podcast audio. The name
/// "Fortell" comes from the Norwegian word for "tell."
#[derive(Parser, Debug)]
#[command(name = "fortell")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Fortell and verify configuration
    Init,

    /// Search stored articles by semantic similarity
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity (0.0-1.0); articles further away are dropped
        #[arg(short, long)]
        floor: Option<f32>,

        /// Restrict to category ids
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<i64>>,
    },

    /// Generate a narrated podcast from stored articles
    Generate {
        /// Select articles matching a free-text query
        #[arg(long, conflicts_with_all = ["user", "ids", "categories"])]
        query: Option<String>,

        /// Select articles matching a user's stored preference vector
        #[arg(long, conflicts_with_all = ["query", "ids", "categories"])]
        user: Option<i64>,

        /// Select specific article ids, narrated in the given order
        #[arg(long, value_delimiter = ',', conflicts_with_all = ["query", "user", "categories"])]
        ids: Option<Vec<i64>>,

        /// Select the most recent articles in these categories
        #[arg(long, value_delimiter = ',', conflicts_with_all = ["query", "user", "ids"])]
        categories: Option<Vec<i64>>,

        /// Maximum number of articles to narrate
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity (0.0-1.0) for query/user selection
        #[arg(short, long)]
        floor: Option<f32>,

        /// Synthesis voice
        #[arg(long)]
        voice: Option<String>,
    },

    /// Ingest extracted seed items and narrate each one
    Ingest {
        /// Path to a JSON file holding an array of seed items
        /// ({url, title, text})
        file: String,

        /// Category id assigned to every ingested article
        #[arg(long)]
        category: Option<i64>,

        /// Relevance score (1-10) assigned to every ingested article
        #[arg(long)]
        relevance: Option<i32>,

        /// Target narration length per item, in minutes
        #[arg(long, default_value = "2")]
        minutes: u32,

        /// Synthesis voice
        #[arg(long)]
        voice: Option<String>,
    },

    /// List a user's podcast records
    List {
        /// User id
        #[arg(short, long)]
        user: i64,

        /// Maximum number of records
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "narration.voice")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Show configuration file path
    Path,
}
