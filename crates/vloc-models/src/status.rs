//! Video processing status state machine.
//!
//! Status is a persisted enum with an explicit transition table. Every
//! stage transition goes through [`VideoStatus::transition`], which rejects
//! illegal moves instead of silently overwriting the field.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Video processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Uploaded, no processing started yet
    #[default]
    Pending,
    /// Audio extraction and language detection in progress
    Analyzing,
    /// Extraction done, duration and source language known
    Analyzed,
    /// Pipeline run accepted, transcription about to start
    Processing,
    /// Speech-to-text providers running
    Transcribing,
    /// Transcription persisted, segments available
    Completed,
    /// A stage failed; see the structured error on the video
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Analyzing => "analyzing",
            VideoStatus::Analyzed => "analyzed",
            VideoStatus::Processing => "processing",
            VideoStatus::Transcribing => "transcribing",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        }
    }

    /// Whether this status is terminal (successful end of the linear pipeline).
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, VideoStatus::Completed)
    }

    /// Whether a pipeline run is currently active for this status.
    ///
    /// Starting processing while active must be rejected so the same video
    /// is never transcribed twice concurrently.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            VideoStatus::Analyzing
                | VideoStatus::Analyzed
                | VideoStatus::Processing
                | VideoStatus::Transcribing
        )
    }

    /// Whether the transition `self -> to` is legal.
    ///
    /// The linear path is `pending -> analyzing -> analyzed -> processing ->
    /// transcribing -> completed`. `failed` is reachable from every
    /// non-terminal state, and retry moves `failed -> processing`.
    pub fn can_transition(&self, to: VideoStatus) -> bool {
        use VideoStatus::*;
        match (self, to) {
            (Pending, Analyzing) => true,
            (Analyzing, Analyzed) => true,
            (Analyzed, Processing) => true,
            (Processing, Transcribing) => true,
            (Transcribing, Completed) => true,
            // Re-processing a finished video restarts the analysis leg.
            (Completed, Analyzing) => true,
            (Failed, Processing) | (Failed, Analyzing) => true,
            (from, Failed) => !matches!(from, Completed | Failed),
            _ => false,
        }
    }

    /// Validate and apply a transition.
    pub fn transition(&self, to: VideoStatus) -> Result<VideoStatus, StatusError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(StatusError::IllegalTransition {
                from: *self,
                to,
            })
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pipeline stage identifiers, used for stage result reporting and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Extraction,
    Detection,
    Transcription,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Extraction => "extraction",
            PipelineStage::Detection => "detection",
            PipelineStage::Transcription => "transcription",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors from status transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition { from: VideoStatus, to: VideoStatus },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_path_is_legal() {
        use VideoStatus::*;
        let path = [Pending, Analyzing, Analyzed, Processing, Transcribing, Completed];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_failed_reachable_from_non_terminal() {
        use VideoStatus::*;
        for from in [Pending, Analyzing, Analyzed, Processing, Transcribing] {
            assert!(from.can_transition(Failed));
        }
        assert!(!Completed.can_transition(Failed));
        assert!(!Failed.can_transition(Failed));
    }

    #[test]
    fn test_retry_transition() {
        assert!(VideoStatus::Failed.can_transition(VideoStatus::Processing));
        assert!(!VideoStatus::Pending.can_transition(VideoStatus::Completed));
    }

    #[test]
    fn test_transition_rejects_skip() {
        let err = VideoStatus::Pending
            .transition(VideoStatus::Transcribing)
            .unwrap_err();
        assert!(matches!(err, StatusError::IllegalTransition { .. }));
    }

    #[test]
    fn test_active_statuses() {
        assert!(VideoStatus::Transcribing.is_active());
        assert!(!VideoStatus::Pending.is_active());
        assert!(!VideoStatus::Completed.is_active());
        assert!(!VideoStatus::Failed.is_active());
    }
}
