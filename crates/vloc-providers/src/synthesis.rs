//! Voice-synthesis (dubbing) provider trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ProviderResult;

/// Dubbing job submission parameters.
#[derive(Debug, Clone)]
pub struct DubbingRequest {
    /// Original audio covering the whole video
    pub audio_path: PathBuf,
    /// Language to render
    pub target_language: String,
    /// Voice ids, index = speaker index
    pub voice_ids: Vec<String>,
    /// Number of speakers the provider should separate
    pub speaker_count: u32,
}

/// Provider-reported job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderJobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

/// One poll result for a submitted job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DubbingPoll {
    pub status: ProviderJobStatus,
    /// Rendered audio location, present once completed
    #[serde(default)]
    pub output_url: Option<String>,
    /// Failure detail, present once failed
    #[serde(default)]
    pub error: Option<String>,
}

/// Voice-synthesis capability.
///
/// Dubbing is one long-running provider job over the full original audio,
/// not per-segment synthesis: the provider owns timing continuity.
#[async_trait]
pub trait VoiceSynthesis: Send + Sync {
    /// Stable provider name.
    fn name(&self) -> &str;

    /// Submit a dubbing job; returns the provider's job id immediately.
    async fn submit_dubbing_job(&self, request: &DubbingRequest) -> ProviderResult<String>;

    /// Poll a previously submitted job. Idempotent.
    async fn poll_job(&self, provider_job_id: &str) -> ProviderResult<DubbingPoll>;
}
