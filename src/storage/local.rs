//! Local-directory audio storage.
//!
//! Writes audio under a media directory and returns the key joined onto a
//! configured public base URL, so a file server fronting the directory can
//! serve what the store "uploaded".

use super::AudioStorage;
use crate::error::{FortellError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Filesystem-backed audio storage.
pub struct LocalAudioStorage {
    media_dir: PathBuf,
    base_url: String,
}

impl LocalAudioStorage {
    /// Create a local storage backend rooted at `media_dir`.
    pub fn new(media_dir: PathBuf, base_url: &str) -> Self {
        Self {
            media_dir,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AudioStorage for LocalAudioStorage {
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    async fn store(&self, key: &str, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            return Err(FortellError::Storage(
                "Refusing to store empty audio".to_string(),
            ));
        }

        let path = self.media_dir.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        debug!("Stored audio at {:?}", path);
        Ok(format!("{}/{}", self.base_url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalAudioStorage::new(dir.path().to_path_buf(), "http://localhost:3000/media/");

        let url = storage
            .store("podcasts/podcast_x.mp3", b"mp3-bytes")
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:3000/media/podcasts/podcast_x.mp3");
        let written = std::fs::read(dir.path().join("podcasts/podcast_x.mp3")).unwrap();
        assert_eq!(written, b"mp3-bytes");
    }

    #[tokio::test]
    async fn test_empty_audio_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalAudioStorage::new(dir.path().to_path_buf(), "http://x");

        let err = storage.store("podcasts/empty.mp3", b"").await.unwrap_err();
        assert!(matches!(err, FortellError::Storage(_)));
        assert!(!dir.path().join("podcasts/empty.mp3").exists());
    }
}
