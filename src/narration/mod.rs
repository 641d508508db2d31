//! Speech synthesis for narration scripts.

mod openai;

pub use openai::OpenAISynthesizer;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifier of a synthesis voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceId(pub String);

impl VoiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A voice offered by the synthesis engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
}

/// Trait for speech synthesis implementations.
///
/// One synchronous call per script, no internal chunking; the caller keeps
/// the script within the engine's accepted input size. Output is
/// all-or-nothing: a failed call never yields partial audio.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Render a script to audio bytes (MP3).
    ///
    /// Fails on an empty script, an unknown voice, or upstream failure.
    async fn synthesize(&self, script: &str, voice: &VoiceId) -> Result<Vec<u8>>;

    /// List the voices this engine offers.
    fn voices(&self) -> Vec<VoiceInfo>;
}
