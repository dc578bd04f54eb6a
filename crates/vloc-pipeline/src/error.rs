//! Pipeline error types and their mapping onto the persisted error codes.

use thiserror::Error;

use vloc_media::MediaError;
use vloc_models::{ErrorCode, PipelineStage, SegmentId, TranslationId, VideoError, VideoId};
use vloc_providers::ProviderError;
use vloc_store::StoreError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors surfaced by pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Video {0} not found")]
    VideoNotFound(VideoId),

    #[error("Segment {0} not found")]
    SegmentNotFound(SegmentId),

    #[error("Translation {0} not found")]
    TranslationNotFound(TranslationId),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Source transcription for video {0} is not confirmed")]
    NotConfirmed(VideoId),

    #[error("Stage {stage} timed out after {seconds}s")]
    Timeout { stage: PipelineStage, seconds: u64 },

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Classify into the persisted error code taxonomy.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            PipelineError::VideoNotFound(_)
            | PipelineError::SegmentNotFound(_)
            | PipelineError::TranslationNotFound(_) => ErrorCode::NotFound,
            PipelineError::InvalidState(_) => ErrorCode::InvalidState,
            PipelineError::NotConfirmed(_) => ErrorCode::NotConfirmed,
            PipelineError::Timeout { .. } => ErrorCode::Timeout,
            PipelineError::Media(e) => match e {
                MediaError::UnsupportedFormat(_) => ErrorCode::UnsupportedFormat,
                MediaError::DurationUnavailable(_) => ErrorCode::DurationUnavailable,
                _ => ErrorCode::ExtractionFailed,
            },
            PipelineError::Provider(e) => {
                if e.is_quota() {
                    ErrorCode::ProviderQuotaExceeded
                } else if matches!(e, ProviderError::Timeout { .. }) {
                    ErrorCode::Timeout
                } else {
                    ErrorCode::Internal
                }
            }
            PipelineError::Store(e) => {
                if e.is_not_found() {
                    ErrorCode::NotFound
                } else {
                    ErrorCode::InvalidState
                }
            }
        }
    }

    /// Whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        self.error_code().is_retryable()
    }

    /// Structured error for the video row.
    pub fn to_video_error(&self) -> VideoError {
        VideoError::new(self.error_code(), self.to_string())
    }
}
