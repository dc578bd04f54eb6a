//! Pipeline configuration.

use std::time::Duration;

/// Pipeline configuration, environment-driven with sensible defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum subtitle duration in seconds. Longer segments are split.
    pub max_subtitle_duration: f64,
    /// Wall-clock budget per external stage (extraction, provider calls)
    pub stage_timeout: Duration,
    /// Language assumed when detection fails entirely
    pub default_language: String,
    /// Raw confidence assumed when a provider reports no log-probability
    pub raw_confidence_default: f64,
    /// Confidence for a whole-duration segment synthesized from flat text
    pub flat_text_confidence: f64,
    /// Confidence ceiling for fallback-provider segmented output
    pub fallback_confidence_cap: f64,
    /// Confidence for fallback-provider flat-text output
    pub fallback_flat_confidence: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_subtitle_duration: 30.0,
            stage_timeout: Duration::from_secs(600),
            default_language: "en".to_string(),
            raw_confidence_default: 0.8,
            flat_text_confidence: 0.7,
            fallback_confidence_cap: 0.75,
            fallback_flat_confidence: 0.65,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_subtitle_duration: std::env::var("VLOC_MAX_SUBTITLE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_subtitle_duration),
            stage_timeout: Duration::from_secs(
                std::env::var("VLOC_STAGE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.stage_timeout.as_secs()),
            ),
            default_language: std::env::var("VLOC_DEFAULT_LANGUAGE")
                .unwrap_or(defaults.default_language),
            raw_confidence_default: defaults.raw_confidence_default,
            flat_text_confidence: defaults.flat_text_confidence,
            fallback_confidence_cap: defaults.fallback_confidence_cap,
            fallback_flat_confidence: defaults.fallback_flat_confidence,
        }
    }
}
