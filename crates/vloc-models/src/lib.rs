//! Shared data models for the Vloc localization pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Videos and their processing status state machine
//! - Timed transcription segments
//! - Per-language translations
//! - Dubbing jobs and their lifecycle
//! - Structured pipeline errors persisted on the video record

pub mod dubbing;
pub mod error;
pub mod ids;
pub mod segment;
pub mod status;
pub mod subtitle;
pub mod timestamp;
pub mod translation;
pub mod video;

// Re-export common types
pub use dubbing::{DubbingJob, DubbingStatus};
pub use error::{ErrorCode, VideoError};
pub use ids::{DubbingJobId, SegmentId, TranslationId, VideoId};
pub use segment::{is_ordered_partition, TimeRange, TranscriptionSegment};
pub use status::{PipelineStage, StatusError, VideoStatus};
pub use subtitle::{render_srt, SubtitleEntry};
pub use timestamp::{format_seconds, srt_timestamp};
pub use translation::Translation;
pub use video::{is_platform_url, Video, VideoSource};
