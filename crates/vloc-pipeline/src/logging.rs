//! Structured stage logging utilities.

use tracing::{error, info, warn, Span};
use tracing_subscriber::EnvFilter;
use vloc_models::{PipelineStage, VideoId};

/// Initialize tracing for binaries and integration tests.
///
/// Reads `.env` and `RUST_LOG`; safe to call more than once.
pub fn init_tracing() {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Stage logger with consistent contextual fields.
#[derive(Debug, Clone)]
pub struct StageLogger {
    video_id: VideoId,
    stage: PipelineStage,
}

impl StageLogger {
    pub fn new(video_id: VideoId, stage: PipelineStage) -> Self {
        Self { video_id, stage }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            stage = %self.stage,
            "Stage started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            stage = %self.stage,
            "Stage progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            video_id = %self.video_id,
            stage = %self.stage,
            "Stage warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            video_id = %self.video_id,
            stage = %self.stage,
            "Stage error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            stage = %self.stage,
            "Stage completed: {}", message
        );
    }

    /// Create a tracing span for this stage.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "stage",
            video_id = %self.video_id,
            stage = %self.stage
        )
    }
}
