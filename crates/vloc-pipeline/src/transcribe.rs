//! Transcription engine: provider invocation, segment standardization,
//! confidence scoring and long-segment splitting.

use tracing::{info, warn};

use vloc_media::ExtractedAudio;
use vloc_models::{PipelineStage, TranscriptionSegment, Video};
use vloc_providers::{
    FallbackLadder, ProviderError, RawTranscript, SpeechToText, TranscribeOptions,
};
use vloc_store::{NewSegment, Store};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::StageLogger;
use crate::providers::ProviderSet;

/// Model source tag applied to all fallback-provider output.
pub const FALLBACK_MODEL_SOURCE: &str = "fallback-service";

/// Convert a provider's average log-probability to a 0-1 confidence.
pub fn scaled_confidence(avg_logprob: Option<f64>, default: f64) -> f64 {
    match avg_logprob {
        Some(lp) => lp.exp().clamp(0.0, 1.0),
        None => default,
    }
}

/// Provider identity weight in the enhanced score. The fallback service
/// is graded down relative to a first-choice model.
fn provider_weight(model_source: &str) -> f64 {
    if model_source == FALLBACK_MODEL_SOURCE {
        0.9
    } else {
        1.0
    }
}

/// Combine raw confidence, a text-quality heuristic and provider identity
/// into the persisted score.
pub fn enhanced_confidence(raw: f64, text: &str, model_source: &str) -> f64 {
    let quality = vloc_providers::detect::heuristic_confidence(text);
    ((0.6 * raw + 0.4 * quality) * provider_weight(model_source)).clamp(0.0, 1.0)
}

/// Split `text` into clause-sized units at sentence/clause boundaries.
fn split_clauses(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        current.push(c);
        let at_boundary = matches!(c, '.' | '!' | '?' | ';' | ',' | '\u{0964}');
        let next_is_break = chars
            .get(i + 1)
            .map(|n| n.is_whitespace())
            .unwrap_or(true);
        if at_boundary && next_is_break {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                units.push(trimmed.to_string());
            }
            current.clear();
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        units.push(trimmed.to_string());
    }
    units
}

/// Split a segment exceeding `max_duration` into contiguous sub-segments.
///
/// Text is divided at clause boundaries, falling back to word boundaries
/// and finally to a plain character split for a single unbroken token.
/// Time is redistributed proportionally to character share, so sub-segment
/// boundaries stay monotonic and together span exactly the original
/// interval.
pub fn split_long_segment(segment: NewSegment, max_duration: f64) -> Vec<NewSegment> {
    let duration = segment.end_time - segment.start_time;
    if duration <= max_duration {
        return vec![segment];
    }

    let wanted = (duration / max_duration).ceil() as usize;
    let mut units = split_clauses(&segment.text);
    if units.len() < wanted {
        units = segment
            .text
            .split_whitespace()
            .map(str::to_string)
            .collect();
    }
    let parts = wanted.min(units.len()).max(1);
    if parts == 1 {
        // Single unbroken token: divide its characters evenly as a last
        // resort so no piece exceeds the limit.
        return hard_split_chars(segment, wanted, duration);
    }

    let total_chars: usize = units.iter().map(|u| u.chars().count()).sum();
    let mut buckets: Vec<Vec<String>> = vec![Vec::new(); parts];
    let mut seen = 0usize;
    let mut idx = 0usize;
    for unit in units {
        let len = unit.chars().count();
        let fair_end = ((idx + 1) * total_chars) / parts;
        if !buckets[idx].is_empty() && seen + len > fair_end && idx + 1 < parts {
            idx += 1;
        }
        seen += len;
        buckets[idx].push(unit);
    }
    buckets.retain(|b| !b.is_empty());

    let mut result = Vec::with_capacity(buckets.len());
    let mut consumed = 0usize;
    let mut cursor = segment.start_time;
    let bucket_count = buckets.len();
    for (i, bucket) in buckets.into_iter().enumerate() {
        let chars: usize = bucket.iter().map(|u| u.chars().count()).sum();
        consumed += chars;
        let end = if i + 1 == bucket_count {
            segment.end_time
        } else {
            segment.start_time + duration * (consumed as f64 / total_chars as f64)
        };
        let sub = NewSegment {
            language: segment.language.clone(),
            text: bucket.join(" "),
            start_time: cursor,
            end_time: end,
            confidence: segment.confidence,
            model_source: segment.model_source.clone(),
            speaker_id: segment.speaker_id,
            speaker_name: segment.speaker_name.clone(),
        };
        cursor = end;
        // A lopsided bucket can still exceed the limit; split again while
        // progress is being made.
        if sub.end_time - sub.start_time > max_duration
            && sub.end_time - sub.start_time < duration
        {
            result.extend(split_long_segment(sub, max_duration));
        } else {
            result.push(sub);
        }
    }
    result
}

/// Character-wise division for text with no clause or word boundaries.
fn hard_split_chars(segment: NewSegment, parts: usize, duration: f64) -> Vec<NewSegment> {
    let chars: Vec<char> = segment.text.chars().collect();
    if parts < 2 || chars.len() < parts {
        return vec![segment];
    }

    let total = chars.len();
    let mut result = Vec::with_capacity(parts);
    let mut cursor = segment.start_time;
    let mut consumed = 0usize;
    for i in 0..parts {
        let upto = ((i + 1) * total) / parts;
        let end = if i + 1 == parts {
            segment.end_time
        } else {
            segment.start_time + duration * (upto as f64 / total as f64)
        };
        result.push(NewSegment {
            language: segment.language.clone(),
            text: chars[consumed..upto].iter().collect(),
            start_time: cursor,
            end_time: end,
            confidence: segment.confidence,
            model_source: segment.model_source.clone(),
            speaker_id: segment.speaker_id,
            speaker_name: segment.speaker_name.clone(),
        });
        consumed = upto;
        cursor = end;
    }
    result
}

/// Standardize one provider's raw transcript into persistable segments.
///
/// Never returns an empty list for a transcript carrying any text: a
/// provider that reports flat text only yields a single whole-duration
/// segment at reduced confidence.
pub fn standardize(
    transcript: &RawTranscript,
    language: &str,
    duration: f64,
    model_source: &str,
    config: &PipelineConfig,
    fallback: bool,
) -> Vec<NewSegment> {
    if transcript.segments.is_empty() {
        let text = transcript.text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        let confidence = if fallback {
            config.fallback_flat_confidence
        } else {
            config.flat_text_confidence
        };
        let whole = NewSegment {
            language: language.to_string(),
            text: text.to_string(),
            start_time: 0.0,
            end_time: duration.max(0.01),
            confidence,
            model_source: model_source.to_string(),
            speaker_id: None,
            speaker_name: None,
        };
        return split_long_segment(whole, config.max_subtitle_duration);
    }

    let mut raw: Vec<_> = transcript
        .segments
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .collect();
    raw.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));

    let mut out = Vec::with_capacity(raw.len());
    for s in raw {
        let start = s.start.max(0.0);
        let end = if duration > 0.0 {
            s.end.min(duration)
        } else {
            s.end
        };
        if end <= start {
            warn!(start, end, "Dropping raw segment with degenerate bounds");
            continue;
        }

        let raw_confidence = scaled_confidence(s.avg_logprob, config.raw_confidence_default);
        let mut confidence = enhanced_confidence(raw_confidence, &s.text, model_source);
        if fallback {
            confidence = confidence.min(config.fallback_confidence_cap);
        }

        let segment = NewSegment {
            language: language.to_string(),
            text: s.text.trim().to_string(),
            start_time: start,
            end_time: end,
            confidence,
            model_source: model_source.to_string(),
            speaker_id: s.speaker,
            speaker_name: s.speaker.map(|id| format!("Speaker {}", id + 1)),
        };
        out.extend(split_long_segment(segment, config.max_subtitle_duration));
    }
    out
}

/// Transcription engine over the configured speech providers.
pub struct TranscriptionEngine {
    store: Store,
    providers: ProviderSet,
    config: PipelineConfig,
}

impl TranscriptionEngine {
    pub fn new(store: Store, providers: ProviderSet, config: PipelineConfig) -> Self {
        Self {
            store,
            providers,
            config,
        }
    }

    fn source_language(&self, video: &Video) -> String {
        video
            .detected_language
            .clone()
            .unwrap_or_else(|| self.config.default_language.clone())
    }

    /// Run the selected providers and persist standardized segments.
    ///
    /// A failing provider is not retried against a different one here; the
    /// explicit [`TranscriptionEngine::run_fallback`] entry point covers
    /// that.
    pub async fn run(
        &self,
        video: &Video,
        audio: &ExtractedAudio,
        selected_models: &[String],
    ) -> PipelineResult<Vec<TranscriptionSegment>> {
        let logger = StageLogger::new(video.id, PipelineStage::Transcription);
        let providers = self.providers.select_speech(selected_models);
        if providers.is_empty() {
            return Err(PipelineError::invalid_state(format!(
                "no speech providers match selection {selected_models:?}"
            )));
        }

        let language = self.source_language(video);
        let opts = TranscribeOptions::verbose().with_language(&language);

        let mut new_segments = Vec::new();
        for provider in &providers {
            logger.log_progress(&format!("requesting transcript from {}", provider.name()));
            let transcript = provider.transcribe(&audio.wav_path, &opts).await?;
            let standardized = standardize(
                &transcript,
                &language,
                audio.duration,
                provider.name(),
                &self.config,
                false,
            );
            logger.log_progress(&format!(
                "{} produced {} segments",
                provider.name(),
                standardized.len()
            ));
            new_segments.extend(standardized);
        }

        if new_segments.is_empty() {
            return Err(PipelineError::Provider(ProviderError::parse(
                providers[0].name(),
                "provider returned an empty transcript",
            )));
        }

        let persisted = self
            .store
            .segments()
            .replace_for_video(video.id, new_segments)
            .await?;
        logger.log_completion(&format!("persisted {} segments", persisted.len()));
        Ok(persisted)
    }

    /// Explicit fallback entry point: secondary then tertiary provider,
    /// walked only past quota-class errors, output tagged
    /// `fallback-service` with capped confidence.
    pub async fn run_fallback(
        &self,
        video: &Video,
        audio: &ExtractedAudio,
    ) -> PipelineResult<Vec<TranscriptionSegment>> {
        let logger = StageLogger::new(video.id, PipelineStage::Transcription);
        let rungs: Vec<_> = self.providers.fallback_speech().to_vec();
        if rungs.is_empty() {
            return Err(PipelineError::invalid_state(
                "no fallback speech providers configured",
            ));
        }

        let language = self.source_language(video);
        let opts = TranscribeOptions::verbose().with_language(&language);

        let ladder = FallbackLadder::new(rungs);
        let wav_path = audio.wav_path.clone();
        let transcript = ladder
            .attempt(|p: &std::sync::Arc<dyn SpeechToText>| {
                let p = p.clone();
                let path = wav_path.clone();
                let opts = opts.clone();
                async move { p.transcribe(&path, &opts).await }
            })
            .await?;

        let new_segments = standardize(
            &transcript,
            &language,
            audio.duration,
            FALLBACK_MODEL_SOURCE,
            &self.config,
            true,
        );
        if new_segments.is_empty() {
            return Err(PipelineError::Provider(ProviderError::parse(
                FALLBACK_MODEL_SOURCE,
                "fallback providers returned an empty transcript",
            )));
        }

        let persisted = self
            .store
            .segments()
            .replace_for_video(video.id, new_segments)
            .await?;
        info!(
            video_id = %video.id,
            segments = persisted.len(),
            "Fallback transcription persisted"
        );
        logger.log_completion("fallback transcription complete");
        Ok(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vloc_providers::RawSegment;

    fn cfg() -> PipelineConfig {
        PipelineConfig::default()
    }

    fn new_seg(text: &str, start: f64, end: f64) -> NewSegment {
        NewSegment {
            language: "bn".to_string(),
            text: text.to_string(),
            start_time: start,
            end_time: end,
            confidence: 0.9,
            model_source: "whisper-1".to_string(),
            speaker_id: None,
            speaker_name: None,
        }
    }

    #[test]
    fn test_scaled_confidence() {
        assert!((scaled_confidence(Some(0.0), 0.8) - 1.0).abs() < 1e-9);
        assert!((scaled_confidence(Some(-0.5), 0.8) - (-0.5f64).exp()).abs() < 1e-9);
        assert_eq!(scaled_confidence(None, 0.8), 0.8);
    }

    #[test]
    fn test_split_clauses() {
        let units = split_clauses("First part, second part. Third part! And more");
        assert_eq!(
            units,
            vec!["First part,", "second part.", "Third part!", "And more"]
        );
    }

    #[test]
    fn test_short_segment_untouched() {
        let subs = split_long_segment(new_seg("short one.", 0.0, 10.0), 30.0);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].start_time, 0.0);
        assert_eq!(subs[0].end_time, 10.0);
    }

    #[test]
    fn test_long_segment_split_contiguous() {
        let text = "This is the first sentence of a long passage. \
                    Here comes a second one with more words in it. \
                    A third clause follows, then a fourth one too.";
        let subs = split_long_segment(new_seg(text, 10.0, 55.0), 30.0);

        assert!(subs.len() >= 2);
        assert_eq!(subs[0].start_time, 10.0);
        assert_eq!(subs.last().unwrap().end_time, 55.0);
        for pair in subs.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
        }
        for sub in &subs {
            assert!(sub.end_time - sub.start_time <= 30.0 + 1e-9);
            assert!(!sub.text.is_empty());
        }
    }

    #[test]
    fn test_single_token_hard_splits_by_characters() {
        let subs = split_long_segment(new_seg("supercalifragilistic", 0.0, 45.0), 30.0);
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].start_time, 0.0);
        assert_eq!(subs.last().unwrap().end_time, 45.0);
        for sub in &subs {
            assert!(sub.end_time - sub.start_time <= 30.0 + 1e-9);
        }
        // Pieces concatenate back to the original token.
        let joined: String = subs.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, "supercalifragilistic");
    }

    #[test]
    fn test_single_char_over_limit_stays_whole() {
        let subs = split_long_segment(new_seg("a", 0.0, 45.0), 30.0);
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn test_standardize_flat_text_synthesizes_segment() {
        let transcript = RawTranscript {
            text: "only a flat transcript".to_string(),
            segments: vec![],
            language: None,
        };
        let segs = standardize(&transcript, "bn", 12.0, "whisper-1", &cfg(), false);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].start_time, 0.0);
        assert_eq!(segs[0].end_time, 12.0);
        assert_eq!(segs[0].confidence, cfg().flat_text_confidence);
    }

    #[test]
    fn test_standardize_empty_transcript_yields_nothing() {
        let transcript = RawTranscript::default();
        let segs = standardize(&transcript, "bn", 12.0, "whisper-1", &cfg(), false);
        assert!(segs.is_empty());
    }

    #[test]
    fn test_standardize_orders_and_clamps() {
        let transcript = RawTranscript {
            text: String::new(),
            segments: vec![
                RawSegment {
                    text: "later".to_string(),
                    start: 5.0,
                    end: 20.0,
                    avg_logprob: Some(-0.1),
                    speaker: None,
                },
                RawSegment {
                    text: "earlier".to_string(),
                    start: 0.0,
                    end: 5.0,
                    avg_logprob: None,
                    speaker: Some(0),
                },
            ],
            language: None,
        };
        let segs = standardize(&transcript, "bn", 15.0, "whisper-1", &cfg(), false);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].text, "earlier");
        assert_eq!(segs[0].speaker_name.as_deref(), Some("Speaker 1"));
        // End clamped to the probed duration.
        assert_eq!(segs[1].end_time, 15.0);
    }

    #[test]
    fn test_fallback_confidence_caps() {
        let transcript = RawTranscript {
            text: String::new(),
            segments: vec![RawSegment {
                text: "a long and very clean passage of transcribed speech here".to_string(),
                start: 0.0,
                end: 5.0,
                avg_logprob: Some(0.0),
                speaker: None,
            }],
            language: None,
        };
        let segs = standardize(&transcript, "bn", 10.0, FALLBACK_MODEL_SOURCE, &cfg(), true);
        assert!(segs[0].confidence <= 0.75);

        let flat = RawTranscript {
            text: "flat only".to_string(),
            segments: vec![],
            language: None,
        };
        let segs = standardize(&flat, "bn", 10.0, FALLBACK_MODEL_SOURCE, &cfg(), true);
        assert_eq!(segs[0].confidence, 0.65);
    }
}
