//! Dubbing job records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{DubbingJobId, VideoId};

/// Dubbing job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum DubbingStatus {
    /// Created locally, not yet accepted by the provider
    #[default]
    Queued,
    /// Provider accepted the job and is rendering
    Processing,
    /// Provider finished; output audio path is set
    Completed,
    /// Provider reported failure; error detail is set
    Failed,
}

impl DubbingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DubbingStatus::Queued => "queued",
            DubbingStatus::Processing => "processing",
            DubbingStatus::Completed => "completed",
            DubbingStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DubbingStatus::Completed | DubbingStatus::Failed)
    }
}

impl fmt::Display for DubbingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One dubbing attempt for one (video, target language) pair.
///
/// Retry never mutates a terminal job; it creates a fresh one, leaving the
/// failed attempt in history for audit.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DubbingJob {
    /// Unique job ID
    pub id: DubbingJobId,

    /// Video being dubbed
    pub video_id: VideoId,

    /// Target language code
    pub target_language: String,

    /// Job status
    #[serde(default)]
    pub status: DubbingStatus,

    /// Number of speakers the provider should render
    pub speaker_count: u32,

    /// Voice ids, index = speaker index
    pub voice_ids: Vec<String>,

    /// Provider-side job identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_job_id: Option<String>,

    /// Output audio path, set on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_path: Option<String>,

    /// Error detail, set on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl DubbingJob {
    pub fn new(
        id: DubbingJobId,
        video_id: VideoId,
        target_language: impl Into<String>,
        speaker_count: u32,
        voice_ids: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            video_id,
            target_language: target_language.into(),
            status: DubbingStatus::Queued,
            speaker_count,
            voice_ids,
            provider_job_id: None,
            output_audio_path: None,
            error_detail: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record provider acceptance.
    pub fn accepted(mut self, provider_job_id: impl Into<String>) -> Self {
        self.provider_job_id = Some(provider_job_id.into());
        self.status = DubbingStatus::Processing;
        self.updated_at = Utc::now();
        self
    }

    /// Record provider completion with the rendered audio path.
    pub fn complete(mut self, output_audio_path: impl Into<String>) -> Self {
        self.status = DubbingStatus::Completed;
        self.output_audio_path = Some(output_audio_path.into());
        self.updated_at = Utc::now();
        self
    }

    /// Record provider failure.
    pub fn fail(mut self, detail: impl Into<String>) -> Self {
        self.status = DubbingStatus::Failed;
        self.error_detail = Some(detail.into());
        self.updated_at = Utc::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let job = DubbingJob::new(DubbingJobId(1), VideoId(9), "en", 2, vec![
            "voice-a".to_string(),
            "voice-b".to_string(),
        ]);
        assert_eq!(job.status, DubbingStatus::Queued);

        let job = job.accepted("prov-123");
        assert_eq!(job.status, DubbingStatus::Processing);
        assert_eq!(job.provider_job_id.as_deref(), Some("prov-123"));

        let job = job.complete("/out/dub_en.mp3");
        assert!(job.status.is_terminal());
        assert_eq!(job.output_audio_path.as_deref(), Some("/out/dub_en.mp3"));
    }

    #[test]
    fn test_failure_keeps_detail() {
        let job = DubbingJob::new(DubbingJobId(2), VideoId(9), "hi", 1, vec![])
            .accepted("prov-456")
            .fail("render error 37");
        assert_eq!(job.status, DubbingStatus::Failed);
        assert_eq!(job.error_detail.as_deref(), Some("render error 37"));
        assert!(job.output_audio_path.is_none());
    }
}
