//! Speech-to-text provider trait and wire-level transcript types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ProviderResult;

/// Options for a transcription request.
#[derive(Debug, Clone, Default)]
pub struct TranscribeOptions {
    /// Hint the spoken language when known
    pub language: Option<String>,
    /// Request word/segment timestamps (verbose output)
    pub timestamps: bool,
}

impl TranscribeOptions {
    pub fn verbose() -> Self {
        Self {
            language: None,
            timestamps: true,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// One raw timed segment as the provider reported it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
    /// Provider-native confidence signal: average log-probability when the
    /// provider reports one.
    #[serde(default)]
    pub avg_logprob: Option<f64>,
    /// Speaker index when the provider diarizes
    #[serde(default)]
    pub speaker: Option<u32>,
}

/// A provider's full transcript response.
///
/// `segments` may be empty: some providers return flat text only, and the
/// standardization layer must tolerate that.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawTranscript {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<RawSegment>,
    /// Provider's own idea of the spoken language, if any
    #[serde(default)]
    pub language: Option<String>,
}

/// Speech-to-text capability.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Stable provider name, recorded as `model_source` on segments.
    fn name(&self) -> &str;

    /// Transcribe an audio file.
    async fn transcribe(
        &self,
        audio_path: &Path,
        opts: &TranscribeOptions,
    ) -> ProviderResult<RawTranscript>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_tolerates_flat_text() {
        let json = r#"{"text": "hello there"}"#;
        let t: RawTranscript = serde_json::from_str(json).unwrap();
        assert_eq!(t.text, "hello there");
        assert!(t.segments.is_empty());
        assert!(t.language.is_none());
    }

    #[test]
    fn test_segment_with_logprob() {
        let json = r#"{"text": "hi", "start": 0.0, "end": 1.5, "avg_logprob": -0.2}"#;
        let s: RawSegment = serde_json::from_str(json).unwrap();
        assert_eq!(s.avg_logprob, Some(-0.2));
        assert!(s.speaker.is_none());
    }
}
