//! Durable storage for rendered audio.
//!
//! Uploads are all-or-nothing: a successful `store` call returns the URL of
//! a complete audio file, and a failed one leaves nothing referenced.

mod http;
mod local;

pub use http::HttpAudioStorage;
pub use local::LocalAudioStorage;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for audio storage backends.
#[async_trait]
pub trait AudioStorage: Send + Sync {
    /// Store audio bytes under `key` and return a durable URL
    /// (content-type audio/mpeg).
    async fn store(&self, key: &str, bytes: &[u8]) -> Result<String>;
}

/// Storage key for a full podcast rendered at `at`.
pub fn podcast_key(at: DateTime<Utc>) -> String {
    format!("podcasts/podcast_{}.mp3", at.format("%Y%m%d_%H%M%S"))
}

/// Storage key for the audio of one batch item.
pub fn batch_item_key(index: usize, at: DateTime<Utc>) -> String {
    format!(
        "podcasts/article_{}_{}.mp3",
        index + 1,
        at.format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_key_naming() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 9).unwrap();
        assert_eq!(podcast_key(at), "podcasts/podcast_20240305_143009.mp3");
        assert_eq!(batch_item_key(0, at), "podcasts/article_1_20240305_143009.mp3");
    }
}
