//! Configuration settings for Fortell.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub narration: NarrationSettings,
    pub summarization: SummarizationSettings,
    pub article_store: ArticleStoreSettings,
    pub storage: StorageSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.fortell".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions. Article embeddings are validated against this
    /// at insert time.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationSettings {
    /// Synthesis provider (openai).
    pub provider: String,
    /// TTS model to use.
    pub model: String,
    /// Default voice when a request does not name one.
    pub voice: String,
    /// Maximum concurrent per-item synthesis calls in a batch.
    pub max_concurrent: usize,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "tts-1".to_string(),
            voice: "nova".to_string(),
            max_concurrent: 2,
        }
    }
}

/// Summarization settings for the batch ingest path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationSettings {
    /// LLM model for narration-ready summaries.
    pub model: String,
    /// Speaking pace used to size summaries (words per minute).
    pub words_per_minute: u32,
    /// Maximum characters of source text sent to the model.
    pub max_input_chars: usize,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            words_per_minute: 150,
            max_input_chars: 8000,
        }
    }
}

/// Article store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleStoreSettings {
    /// Store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for ArticleStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.fortell/articles.db".to_string(),
        }
    }
}

/// Audio storage provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// Store rendered audio under a local media directory (default).
    #[default]
    Local,
    /// Upload rendered audio via HTTP PUT (presigned URL / object gateway).
    Http,
}

impl std::str::FromStr for StorageProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageProvider::Local),
            "http" | "s3" => Ok(StorageProvider::Http),
            _ => Err(format!("Unknown storage provider: {}", s)),
        }
    }
}

impl std::fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageProvider::Local => write!(f, "local"),
            StorageProvider::Http => write!(f, "http"),
        }
    }
}

/// Durable audio storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Storage provider (local, http).
    pub provider: StorageProvider,
    /// Media directory for the local provider.
    pub media_dir: String,
    /// Public base URL that stored keys are joined onto.
    pub base_url: String,
    /// Upload endpoint for the http provider.
    pub endpoint: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: StorageProvider::Local,
            media_dir: "~/.fortell/media".to_string(),
            base_url: "http://localhost:3000/media".to_string(),
            endpoint: None,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::FortellError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fortell")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.article_store.sqlite_path)
    }

    /// Get the expanded media directory path.
    pub fn media_dir(&self) -> PathBuf {
        Self::expand_path(&self.storage.media_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.embedding.dimensions, 1536);
        assert_eq!(settings.narration.voice, "nova");
        assert_eq!(settings.storage.provider, StorageProvider::Local);
        assert_eq!(settings.summarization.words_per_minute, 150);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [narration]
            voice = "onyx"
            "#,
        )
        .unwrap();
        assert_eq!(settings.narration.voice, "onyx");
        assert_eq!(settings.narration.model, "tts-1");
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
    }

    #[test]
    fn test_storage_provider_parsing() {
        assert_eq!("local".parse::<StorageProvider>().unwrap(), StorageProvider::Local);
        assert_eq!("s3".parse::<StorageProvider>().unwrap(), StorageProvider::Http);
        assert!("ftp".parse::<StorageProvider>().is_err());
    }
}
