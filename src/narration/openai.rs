//! OpenAI speech synthesis implementation.

use super::{Synthesizer, VoiceId, VoiceInfo};
use crate::error::{FortellError, Result};
use crate::openai::create_client;
use async_openai::types::{
    CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Voices accepted by the OpenAI speech API.
const KNOWN_VOICES: &[(&str, &str)] = &[
    ("alloy", "Alloy"),
    ("echo", "Echo"),
    ("fable", "Fable"),
    ("onyx", "Onyx"),
    ("nova", "Nova"),
    ("shimmer", "Shimmer"),
];

/// OpenAI-based speech synthesizer.
pub struct OpenAISynthesizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAISynthesizer {
    /// Create a new synthesizer with the default model.
    pub fn new() -> Self {
        Self::with_config("tts-1")
    }

    /// Create a new synthesizer with a custom TTS model.
    pub fn with_config(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }

    /// Resolve a [`VoiceId`] against the engine's voice set.
    fn resolve_voice(voice: &VoiceId) -> Result<Voice> {
        match voice.as_str() {
            "alloy" => Ok(Voice::Alloy),
            "echo" => Ok(Voice::Echo),
            "fable" => Ok(Voice::Fable),
            "onyx" => Ok(Voice::Onyx),
            "nova" => Ok(Voice::Nova),
            "shimmer" => Ok(Voice::Shimmer),
            other => Err(FortellError::Synthesis(format!(
                "Unknown voice: {}",
                other
            ))),
        }
    }

    fn speech_model(&self) -> SpeechModel {
        match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        }
    }
}

impl Default for OpenAISynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Synthesizer for OpenAISynthesizer {
    #[instrument(skip(self, script), fields(script_chars = script.len(), voice = %voice))]
    async fn synthesize(&self, script: &str, voice: &VoiceId) -> Result<Vec<u8>> {
        if script.trim().is_empty() {
            return Err(FortellError::Synthesis(
                "Cannot synthesize an empty script".to_string(),
            ));
        }

        let voice = Self::resolve_voice(voice)?;

        let request = CreateSpeechRequestArgs::default()
            .input(script)
            .voice(voice)
            .model(self.speech_model())
            .response_format(SpeechResponseFormat::Mp3)
            .build()
            .map_err(|e| FortellError::Synthesis(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .map_err(|e| FortellError::Synthesis(format!("Speech API error: {}", e)))?;

        debug!("Synthesized {} bytes of audio", response.bytes.len());
        Ok(response.bytes.to_vec())
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        KNOWN_VOICES
            .iter()
            .map(|(id, name)| VoiceInfo {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_script_rejected_before_api_call() {
        let synth = OpenAISynthesizer::new();
        let err = synth
            .synthesize("  \n ", &VoiceId::new("nova"))
            .await
            .unwrap_err();
        assert!(matches!(err, FortellError::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_unknown_voice_rejected_before_api_call() {
        let synth = OpenAISynthesizer::new();
        let err = synth
            .synthesize("Hello there.", &VoiceId::new("darth"))
            .await
            .unwrap_err();
        assert!(matches!(err, FortellError::Synthesis(_)));
    }

    #[test]
    fn test_voice_listing() {
        let synth = OpenAISynthesizer::new();
        let voices = synth.voices();
        assert_eq!(voices.len(), 6);
        assert!(voices.iter().any(|v| v.id == "nova"));
    }
}
