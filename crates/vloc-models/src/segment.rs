//! Timed transcription segments.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{SegmentId, VideoId};

/// Shared time-range interface for anything laid out on the video
/// timeline (source segments, translated-segment views in subtitle
/// export).
pub trait TimeRange {
    /// Start time in seconds.
    fn start(&self) -> f64;
    /// End time in seconds.
    fn end(&self) -> f64;
    /// Duration in seconds.
    fn duration(&self) -> f64 {
        self.end() - self.start()
    }
}

/// A time-bounded unit of transcribed text.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptionSegment {
    /// Unique segment ID
    pub id: SegmentId,

    /// Owning video
    pub video_id: VideoId,

    /// Language of the text (source language, fixed per video)
    pub language: String,

    /// Transcribed text
    pub text: String,

    /// Start time in seconds
    pub start_time: f64,

    /// End time in seconds (always > start_time)
    pub end_time: f64,

    /// Confidence score (0.0-1.0)
    pub confidence: f64,

    /// Which provider produced this segment
    pub model_source: String,

    /// Speaker index when diarization info is available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<u32>,

    /// Human-readable speaker label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_name: Option<String>,

    /// True for provider output, false once the user has edited the text
    #[serde(default = "default_true")]
    pub is_original: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl TranscriptionSegment {
    /// Whether the time bounds are sane.
    pub fn is_valid(&self) -> bool {
        self.start_time >= 0.0
            && self.end_time > self.start_time
            && (0.0..=1.0).contains(&self.confidence)
    }
}

impl TimeRange for TranscriptionSegment {
    fn start(&self) -> f64 {
        self.start_time
    }

    fn end(&self) -> f64 {
        self.end_time
    }
}

/// Check that segments from one model form an ordered, non-overlapping
/// partition of the timeline.
pub fn is_ordered_partition(segments: &[TranscriptionSegment]) -> bool {
    segments.windows(2).all(|w| {
        w[0].start_time <= w[1].start_time && w[0].end_time <= w[1].start_time + 1e-6
    }) && segments.iter().all(|s| s.is_valid())
}
