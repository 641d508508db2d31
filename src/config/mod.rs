//! Configuration management for Fortell.

mod settings;

pub use settings::{
    ArticleStoreSettings, EmbeddingSettings, GeneralSettings, NarrationSettings, Settings,
    StorageProvider, StorageSettings, SummarizationSettings,
};
