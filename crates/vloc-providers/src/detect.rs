//! Spoken-language detection.
//!
//! Runs a short transcription against the primary provider and reads the
//! language it reports, falling back to a secondary provider on any
//! failure. Detection is advisory: when both providers fail the default
//! language is returned with explicit low confidence, never an error, so a
//! flaky detector can degrade routing quality but can never block the
//! pipeline.

use std::path::Path;
use tracing::{info, warn};

use crate::speech::{SpeechToText, TranscribeOptions};

/// Confidence reported when both providers fail and the default is used.
pub const DEFAULT_LANGUAGE_CONFIDENCE: f64 = 0.30;

/// Ceiling for heuristic confidence; detection is never certain.
const MAX_HEURISTIC_CONFIDENCE: f64 = 0.95;

/// Confidence assigned to the secondary provider's answer.
const SECONDARY_CONFIDENCE: f64 = 0.70;

/// Detection outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLanguage {
    pub code: String,
    pub confidence: f64,
}

/// Detect the spoken language of an audio sample.
pub async fn detect_language(
    audio_path: &Path,
    primary: &dyn SpeechToText,
    secondary: &dyn SpeechToText,
    default_code: &str,
) -> DetectedLanguage {
    let opts = TranscribeOptions::default();

    match primary.transcribe(audio_path, &opts).await {
        Ok(transcript) => {
            if let Some(code) = transcript.language.clone() {
                let confidence = heuristic_confidence(&transcript.text);
                info!(code, confidence, provider = primary.name(), "Language detected");
                return DetectedLanguage { code, confidence };
            }
            warn!(provider = primary.name(), "Primary reported no language");
        }
        Err(e) => {
            warn!(provider = primary.name(), error = %e, "Primary language detection failed");
        }
    }

    match secondary.transcribe(audio_path, &opts).await {
        Ok(transcript) => {
            if let Some(code) = transcript.language {
                info!(code, provider = secondary.name(), "Language detected via secondary");
                return DetectedLanguage {
                    code,
                    confidence: SECONDARY_CONFIDENCE,
                };
            }
        }
        Err(e) => {
            warn!(provider = secondary.name(), error = %e, "Secondary language detection failed");
        }
    }

    DetectedLanguage {
        code: default_code.to_string(),
        confidence: DEFAULT_LANGUAGE_CONFIDENCE,
    }
}

/// Heuristic confidence from transcript shape: longer output with few
/// special characters reads as a cleaner decode. A deterministic stand-in,
/// not a calibrated quality metric.
pub fn heuristic_confidence(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return DEFAULT_LANGUAGE_CONFIDENCE;
    }

    let length_score = (trimmed.chars().count() as f64 / 200.0).min(1.0);

    let total = trimmed.chars().count() as f64;
    let special = trimmed
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !matches!(c, '.' | ',' | '?' | '!' | '\'' | '-'))
        .count() as f64;
    let cleanliness = 1.0 - (special / total).min(1.0);

    (0.4 + 0.35 * length_score + 0.25 * cleanliness).min(MAX_HEURISTIC_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ProviderResult};
    use crate::speech::RawTranscript;
    use async_trait::async_trait;

    struct Stub {
        name: &'static str,
        language: Option<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl SpeechToText for Stub {
        fn name(&self) -> &str {
            self.name
        }

        async fn transcribe(
            &self,
            _audio_path: &Path,
            _opts: &TranscribeOptions,
        ) -> ProviderResult<RawTranscript> {
            if self.fail {
                return Err(ProviderError::network(self.name, "down"));
            }
            Ok(RawTranscript {
                text: "a perfectly ordinary sentence of reasonable length for scoring".to_string(),
                segments: vec![],
                language: self.language.map(str::to_string),
            })
        }
    }

    #[tokio::test]
    async fn test_primary_wins() {
        let primary = Stub { name: "p", language: Some("bn"), fail: false };
        let secondary = Stub { name: "s", language: Some("en"), fail: false };
        let d = detect_language(Path::new("/a.wav"), &primary, &secondary, "en").await;
        assert_eq!(d.code, "bn");
        assert!(d.confidence > DEFAULT_LANGUAGE_CONFIDENCE);
        assert!(d.confidence <= 0.95);
    }

    #[tokio::test]
    async fn test_secondary_on_primary_failure() {
        let primary = Stub { name: "p", language: Some("bn"), fail: true };
        let secondary = Stub { name: "s", language: Some("hi"), fail: false };
        let d = detect_language(Path::new("/a.wav"), &primary, &secondary, "en").await;
        assert_eq!(d.code, "hi");
        assert_eq!(d.confidence, 0.70);
    }

    #[tokio::test]
    async fn test_both_fail_returns_default() {
        let primary = Stub { name: "p", language: None, fail: true };
        let secondary = Stub { name: "s", language: None, fail: true };
        let d = detect_language(Path::new("/a.wav"), &primary, &secondary, "en").await;
        assert_eq!(d.code, "en");
        assert_eq!(d.confidence, DEFAULT_LANGUAGE_CONFIDENCE);
    }

    #[test]
    fn test_heuristic_capped() {
        let long_clean = "word ".repeat(200);
        assert!(heuristic_confidence(&long_clean) <= 0.95);
        assert!(heuristic_confidence("") == DEFAULT_LANGUAGE_CONFIDENCE);
        // Noisy text scores below clean text of the same length.
        let clean = "hello there this is clean text for sure";
        let noisy = "h#l$o t^&re t@is *s n()sy t<>t f%r s!re+=";
        assert!(heuristic_confidence(noisy) < heuristic_confidence(clean));
    }
}
