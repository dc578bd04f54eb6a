//! Pipeline coordinator: drives a video through extraction, language
//! detection and transcription, owns every status transition, and fans
//! status changes out to watchers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use vloc_media::ExtractedAudio;
use vloc_models::{PipelineStage, SegmentId, TranscriptionSegment, Video, VideoId, VideoStatus};
use vloc_providers::detect::detect_language;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::StageLogger;
use crate::media::MediaAccess;
use crate::dub::DubbingOrchestrator;
use crate::providers::ProviderSet;
use crate::transcribe::TranscriptionEngine;
use crate::translate::TranslationEngine;

/// Outcome of one pipeline stage, reported back to the coordinator.
#[derive(Debug, Clone)]
pub enum StageOutcome {
    Extracted { duration: f64 },
    Detected { language: String, confidence: f64 },
    Transcribed,
}

/// The pipeline coordinator.
///
/// All status writes go through here so the transition table is enforced
/// in exactly one place and watchers always observe every change.
pub struct VideoPipeline {
    store: vloc_store::Store,
    media: Arc<dyn MediaAccess>,
    providers: ProviderSet,
    config: PipelineConfig,
    watchers: Mutex<HashMap<i64, watch::Sender<VideoStatus>>>,
}

impl VideoPipeline {
    pub fn new(
        store: vloc_store::Store,
        media: Arc<dyn MediaAccess>,
        providers: ProviderSet,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            media,
            providers,
            config,
            watchers: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &vloc_store::Store {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn engine(&self) -> TranscriptionEngine {
        TranscriptionEngine::new(self.store.clone(), self.providers.clone(), self.config.clone())
    }

    /// Translation engine over the same store and providers.
    pub fn translation(&self) -> TranslationEngine {
        TranslationEngine::new(self.store.clone(), self.providers.clone(), self.config.clone())
    }

    /// Dubbing orchestrator over the same store and providers.
    pub fn dubbing(&self) -> DubbingOrchestrator {
        DubbingOrchestrator::new(
            self.store.clone(),
            self.media.clone(),
            self.providers.clone(),
            self.config.clone(),
        )
    }

    async fn get_video(&self, video_id: VideoId) -> PipelineResult<Video> {
        self.store
            .videos()
            .get(video_id)
            .await
            .map_err(|_| PipelineError::VideoNotFound(video_id))
    }

    /// Watch a video's status. The receiver starts at the current status
    /// and sees every subsequent transition.
    pub async fn subscribe(&self, video_id: VideoId) -> PipelineResult<watch::Receiver<VideoStatus>> {
        let video = self.get_video(video_id).await?;
        let mut watchers = self.watchers.lock().await;
        let sender = watchers
            .entry(video_id.as_i64())
            .or_insert_with(|| watch::channel(video.status).0);
        Ok(sender.subscribe())
    }

    async fn notify(&self, video_id: VideoId, status: VideoStatus) {
        let watchers = self.watchers.lock().await;
        if let Some(sender) = watchers.get(&video_id.as_i64()) {
            // send_replace never fails even with no receivers attached.
            sender.send_replace(status);
        }
    }

    async fn transition(&self, video_id: VideoId, to: VideoStatus) -> PipelineResult<Video> {
        let video = self.store.videos().transition(video_id, to).await?;
        self.notify(video_id, to).await;
        Ok(video)
    }

    async fn with_timeout<T, F>(&self, stage: PipelineStage, fut: F) -> PipelineResult<T>
    where
        F: Future<Output = PipelineResult<T>>,
    {
        match tokio::time::timeout(self.config.stage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout {
                stage,
                seconds: self.config.stage_timeout.as_secs(),
            }),
        }
    }

    async fn fail_video(&self, video_id: VideoId, error: &PipelineError) {
        counter!("vloc_pipeline_failures_total").increment(1);
        match self
            .store
            .videos()
            .set_failed(video_id, error.to_video_error())
            .await
        {
            Ok(_) => self.notify(video_id, VideoStatus::Failed).await,
            Err(e) => {
                warn!(video_id = %video_id, error = %e, "Could not persist failure");
            }
        }
    }

    /// Record a stage outcome against the video record.
    ///
    /// On success this persists the stage's data and advances status where
    /// the stage completes a phase. On error the video moves to failed
    /// with the structured error persisted; the failed record is returned
    /// so callers can inspect it.
    pub async fn report_stage_result(
        &self,
        video_id: VideoId,
        stage: PipelineStage,
        result: Result<StageOutcome, PipelineError>,
    ) -> PipelineResult<Video> {
        let logger = StageLogger::new(video_id, stage);
        match result {
            Ok(StageOutcome::Extracted { duration }) => {
                logger.log_completion(&format!("duration {duration:.2}s"));
                Ok(self.store.videos().set_duration(video_id, duration).await?)
            }
            Ok(StageOutcome::Detected {
                language,
                confidence,
            }) => {
                logger.log_completion(&format!("language {language} ({confidence:.2})"));
                let video = self
                    .store
                    .videos()
                    .set_detected_language(video_id, language, confidence)
                    .await?;
                if video.status == VideoStatus::Analyzing {
                    return self.transition(video_id, VideoStatus::Analyzed).await;
                }
                Ok(video)
            }
            Ok(StageOutcome::Transcribed) => {
                logger.log_completion("transcript persisted");
                self.transition(video_id, VideoStatus::Completed).await
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                self.fail_video(video_id, &e).await;
                Ok(self.get_video(video_id).await?)
            }
        }
    }

    /// Kick off processing for a pending video and run it to completion.
    pub async fn process(
        &self,
        video_id: VideoId,
        selected_models: &[String],
    ) -> PipelineResult<Video> {
        self.start_processing(video_id).await?;
        self.run_pipeline(video_id, selected_models).await
    }

    /// Validate and enter the analyzing state. Rejects re-entrant starts.
    pub async fn start_processing(&self, video_id: VideoId) -> PipelineResult<Video> {
        let video = self.get_video(video_id).await?;
        if video.status.is_active() {
            return Err(PipelineError::invalid_state(format!(
                "video {video_id} is already being processed (status {})",
                video.status
            )));
        }
        if video.status == VideoStatus::Completed {
            return Err(PipelineError::invalid_state(format!(
                "video {video_id} is already completed; use reprocess"
            )));
        }
        if video.status == VideoStatus::Failed {
            return Err(PipelineError::invalid_state(format!(
                "video {video_id} has failed; use retry"
            )));
        }
        counter!("vloc_pipeline_runs_total").increment(1);
        self.transition(video_id, VideoStatus::Analyzing).await
    }

    /// Re-run the pipeline for a completed video.
    pub async fn reprocess(
        &self,
        video_id: VideoId,
        selected_models: &[String],
    ) -> PipelineResult<Video> {
        let video = self.get_video(video_id).await?;
        if video.status != VideoStatus::Completed {
            return Err(PipelineError::invalid_state(format!(
                "video {video_id} is not completed (status {})",
                video.status
            )));
        }
        counter!("vloc_pipeline_runs_total").increment(1);
        self.transition(video_id, VideoStatus::Analyzing).await?;
        self.run_pipeline(video_id, selected_models).await
    }

    /// Run extraction, detection and transcription from the analyzing
    /// state. Any stage error lands the video in failed with a structured
    /// error; this method then returns the error to the caller.
    pub async fn run_pipeline(
        &self,
        video_id: VideoId,
        selected_models: &[String],
    ) -> PipelineResult<Video> {
        let video = self.get_video(video_id).await?;

        let audio = match self.extract_stage(&video).await {
            Ok(audio) => audio,
            Err(e) => {
                StageLogger::new(video_id, PipelineStage::Extraction).log_error(&e.to_string());
                self.fail_video(video_id, &e).await;
                return Err(e);
            }
        };
        self.report_stage_result(
            video_id,
            PipelineStage::Extraction,
            Ok(StageOutcome::Extracted {
                duration: audio.duration,
            }),
        )
        .await?;

        // Detection is advisory and never errors.
        let detected = self.detect_stage(&video, &audio).await;
        self.report_stage_result(
            video_id,
            PipelineStage::Detection,
            Ok(StageOutcome::Detected {
                language: detected.code,
                confidence: detected.confidence,
            }),
        )
        .await?;

        self.transition(video_id, VideoStatus::Processing).await?;
        self.transition(video_id, VideoStatus::Transcribing).await?;

        let video = self.get_video(video_id).await?;
        let result = self.transcribe_stage(&video, &audio, selected_models).await;
        audio.cleanup();
        match result {
            Ok(_) => {
                self.report_stage_result(
                    video_id,
                    PipelineStage::Transcription,
                    Ok(StageOutcome::Transcribed),
                )
                .await
            }
            Err(e) => {
                StageLogger::new(video_id, PipelineStage::Transcription).log_error(&e.to_string());
                self.fail_video(video_id, &e).await;
                Err(e)
            }
        }
    }

    async fn extract_stage(&self, video: &Video) -> PipelineResult<ExtractedAudio> {
        let logger = StageLogger::new(video.id, PipelineStage::Extraction);
        logger.log_start("extracting audio");
        self.with_timeout(PipelineStage::Extraction, async {
            Ok(self.media.extract_audio(&video.source).await?)
        })
        .await
    }

    async fn detect_stage(
        &self,
        video: &Video,
        audio: &ExtractedAudio,
    ) -> vloc_providers::DetectedLanguage {
        let logger = StageLogger::new(video.id, PipelineStage::Detection);
        logger.log_start("detecting spoken language");
        let (Some(primary), Some(secondary)) = (
            self.providers.primary_speech(),
            self.providers.detection_secondary(),
        ) else {
            logger.log_warning("no speech providers, assuming default language");
            return vloc_providers::DetectedLanguage {
                code: self.config.default_language.clone(),
                confidence: vloc_providers::DEFAULT_LANGUAGE_CONFIDENCE,
            };
        };
        detect_language(
            &audio.wav_path,
            primary.as_ref(),
            secondary.as_ref(),
            &self.config.default_language,
        )
        .await
    }

    async fn transcribe_stage(
        &self,
        video: &Video,
        audio: &ExtractedAudio,
        selected_models: &[String],
    ) -> PipelineResult<Vec<TranscriptionSegment>> {
        let engine = self.engine();
        self.with_timeout(PipelineStage::Transcription, async {
            engine.run(video, audio, selected_models).await
        })
        .await
    }

    /// Retry a failed video: clear the error, re-extract and re-transcribe.
    /// Status stays in processing until transcription starts, so retry
    /// does not revisit the analysis phase.
    pub async fn retry(
        &self,
        video_id: VideoId,
        selected_models: &[String],
    ) -> PipelineResult<Video> {
        let video = self.get_video(video_id).await?;
        if video.status != VideoStatus::Failed {
            return Err(PipelineError::invalid_state(format!(
                "video {video_id} is not failed (status {}), nothing to retry",
                video.status
            )));
        }
        counter!("vloc_pipeline_retries_total").increment(1);
        let video = self.store.videos().reset_for_retry(video_id).await?;
        self.notify(video_id, VideoStatus::Processing).await;
        info!(video_id = %video_id, "Retrying failed video");

        self.rerun_from_processing(&video, selected_models, false)
            .await
    }

    /// Explicit fallback after a quota failure: retry transcription against
    /// the fallback provider rungs.
    pub async fn transcribe_with_fallback(&self, video_id: VideoId) -> PipelineResult<Video> {
        let video = self.get_video(video_id).await?;
        if video.status != VideoStatus::Failed {
            return Err(PipelineError::invalid_state(format!(
                "fallback transcription requires a failed video (status {})",
                video.status
            )));
        }
        counter!("vloc_pipeline_fallbacks_total").increment(1);
        let video = self.store.videos().reset_for_retry(video_id).await?;
        self.notify(video_id, VideoStatus::Processing).await;
        info!(video_id = %video_id, "Transcribing with fallback providers");

        self.rerun_from_processing(&video, &[], true).await
    }

    async fn rerun_from_processing(
        &self,
        video: &Video,
        selected_models: &[String],
        fallback: bool,
    ) -> PipelineResult<Video> {
        let video_id = video.id;
        let audio = match self.extract_stage(video).await {
            Ok(audio) => audio,
            Err(e) => {
                self.fail_video(video_id, &e).await;
                return Err(e);
            }
        };
        if video.duration.is_none() {
            self.store
                .videos()
                .set_duration(video_id, audio.duration)
                .await?;
        }

        let transition = self.transition(video_id, VideoStatus::Transcribing).await;
        if let Err(e) = transition {
            audio.cleanup();
            return Err(e);
        }

        let engine = self.engine();
        let result = self
            .with_timeout(PipelineStage::Transcription, async {
                if fallback {
                    engine.run_fallback(video, &audio).await
                } else {
                    engine.run(video, &audio, selected_models).await
                }
            })
            .await;
        audio.cleanup();

        match result {
            Ok(_) => self.transition(video_id, VideoStatus::Completed).await,
            Err(e) => {
                self.fail_video(video_id, &e).await;
                Err(e)
            }
        }
    }

    /// Confirm the source-language transcription as accurate.
    ///
    /// Gating step for translation and dubbing. Cached translations are
    /// dropped because they were produced against unconfirmed text.
    pub async fn confirm_source(&self, video_id: VideoId) -> PipelineResult<Video> {
        let video = self.get_video(video_id).await?;
        let segments = self.store.segments().list_for_video(video_id).await;
        if segments.is_empty() {
            return Err(PipelineError::invalid_state(format!(
                "video {video_id} has no segments to confirm"
            )));
        }
        if !video.status.is_terminal_success() {
            return Err(PipelineError::invalid_state(format!(
                "video {video_id} is not completed (status {})",
                video.status
            )));
        }
        let cleared = self.store.translations().clear_for_video(video_id).await;
        if cleared > 0 {
            info!(video_id = %video_id, cleared, "Dropped stale translations on confirmation");
        }
        Ok(self
            .store
            .videos()
            .set_source_confirmed(video_id, true)
            .await?)
    }

    /// Withdraw source confirmation.
    pub async fn unconfirm_source(&self, video_id: VideoId) -> PipelineResult<Video> {
        self.get_video(video_id).await?;
        Ok(self
            .store
            .videos()
            .set_source_confirmed(video_id, false)
            .await?)
    }

    /// Apply a user edit to a segment's text.
    ///
    /// Editing a source-language segment after confirmation withdraws the
    /// confirmation, since downstream artifacts no longer match.
    pub async fn edit_segment(
        &self,
        segment_id: SegmentId,
        text: impl Into<String>,
    ) -> PipelineResult<TranscriptionSegment> {
        let segment = self
            .store
            .segments()
            .update_text(segment_id, text)
            .await
            .map_err(|_| PipelineError::SegmentNotFound(segment_id))?;

        let video = self.get_video(segment.video_id).await?;
        let source_language = video
            .detected_language
            .as_deref()
            .unwrap_or(&self.config.default_language);
        if video.source_confirmed && segment.language == source_language {
            info!(
                video_id = %video.id,
                segment_id = %segment_id,
                "Source segment edited after confirmation, withdrawing it"
            );
            self.store
                .videos()
                .set_source_confirmed(video.id, false)
                .await?;
        }
        Ok(segment)
    }

    /// Current status, for pollers that do not hold a watch receiver.
    pub async fn get_status(&self, video_id: VideoId) -> PipelineResult<VideoStatus> {
        Ok(self.get_video(video_id).await?.status)
    }

    /// Source duration in seconds, probing without a full extraction.
    ///
    /// Answers from the stored record when a pipeline run has already
    /// filled it in; otherwise probes the source and persists the result
    /// so later callers hit the cached value.
    pub async fn probe_duration(&self, video_id: VideoId) -> PipelineResult<f64> {
        let video = self.get_video(video_id).await?;
        if let Some(duration) = video.duration {
            return Ok(duration);
        }
        let duration = self.media.duration(&video.source).await?;
        self.store.videos().set_duration(video_id, duration).await?;
        Ok(duration)
    }
}
