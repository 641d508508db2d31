//! HTTP PUT audio storage.
//!
//! Uploads audio to an object gateway or presigned-URL endpoint with a
//! single PUT per file.

use super::AudioStorage;
use crate::error::{FortellError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

/// HTTP-backed audio storage.
pub struct HttpAudioStorage {
    client: reqwest::Client,
    endpoint: String,
    base_url: String,
}

impl HttpAudioStorage {
    /// Create an HTTP storage backend.
    ///
    /// `endpoint` receives PUTs of `{endpoint}/{key}`; `base_url` is what
    /// readers are handed back, joined with the same key.
    pub fn new(endpoint: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AudioStorage for HttpAudioStorage {
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    async fn store(&self, key: &str, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            return Err(FortellError::Storage(
                "Refusing to store empty audio".to_string(),
            ));
        }

        let upload_url = format!("{}/{}", self.endpoint, key);
        let response = self
            .client
            .put(&upload_url)
            .header(CONTENT_TYPE, "audio/mpeg")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| FortellError::Storage(format!("Upload of {} failed: {}", key, e)))?;

        if !response.status().is_success() {
            return Err(FortellError::Storage(format!(
                "Upload of {} failed with status {}",
                key,
                response.status()
            )));
        }

        debug!("Uploaded audio to {}", upload_url);
        Ok(format!("{}/{}", self.base_url, key))
    }
}
