//! Dubbing orchestration: voice assignment, provider job submission and
//! idempotent status polling.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use vloc_models::{DubbingJob, DubbingJobId, DubbingStatus, Video, VideoId};
use vloc_providers::{DubbingRequest, ProviderError, ProviderJobStatus};
use vloc_store::Store;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::media::MediaAccess;
use crate::providers::ProviderSet;

/// Built-in voice ids per language, alternating female/male by speaker
/// position. Languages without a curated set get generated ids in the
/// same alternating shape.
fn builtin_voices(language: &str) -> Vec<String> {
    let curated: &[(&str, [&str; 4])] = &[
        ("en", ["en-nova-f", "en-atlas-m", "en-iris-f", "en-orion-m"]),
        ("hi", ["hi-asha-f", "hi-dev-m", "hi-mira-f", "hi-ravi-m"]),
        ("bn", ["bn-ruma-f", "bn-arko-m", "bn-tisha-f", "bn-nayan-m"]),
        ("es", ["es-lucia-f", "es-mateo-m", "es-sofia-f", "es-diego-m"]),
        ("fr", ["fr-elise-f", "fr-hugo-m", "fr-manon-f", "fr-louis-m"]),
        ("de", ["de-greta-f", "de-felix-m", "de-lena-f", "de-jonas-m"]),
    ];
    if let Some((_, voices)) = curated.iter().find(|(code, _)| *code == language) {
        return voices.iter().map(|v| v.to_string()).collect();
    }
    (0..4)
        .map(|i| {
            let gender = if i % 2 == 0 { "f" } else { "m" };
            format!("{language}-voice{}-{gender}", i + 1)
        })
        .collect()
}

/// Resolve the voice list for a job: caller-provided ids first (excess
/// ignored), defaults filling any remainder.
pub fn resolve_voices(language: &str, speaker_count: u32, provided: Vec<String>) -> Vec<String> {
    let count = speaker_count as usize;
    let mut voices: Vec<String> = provided.into_iter().take(count).collect();
    let defaults = builtin_voices(language);
    let mut next_default = defaults.into_iter().cycle();
    while voices.len() < count {
        // cycle() over a non-empty list never exhausts
        if let Some(v) = next_default.next() {
            voices.push(v);
        }
    }
    voices
}

/// Dubbing orchestrator over the configured synthesis provider.
pub struct DubbingOrchestrator {
    store: Store,
    media: Arc<dyn MediaAccess>,
    providers: ProviderSet,
    config: PipelineConfig,
}

impl DubbingOrchestrator {
    pub fn new(
        store: Store,
        media: Arc<dyn MediaAccess>,
        providers: ProviderSet,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            media,
            providers,
            config,
        }
    }

    async fn confirmed_video(&self, video_id: VideoId) -> PipelineResult<Video> {
        let video = self
            .store
            .videos()
            .get(video_id)
            .await
            .map_err(|_| PipelineError::VideoNotFound(video_id))?;
        if !video.source_confirmed {
            return Err(PipelineError::NotConfirmed(video_id));
        }
        Ok(video)
    }

    /// Speaker count suggested from diarization, at least one.
    pub async fn suggest_speaker_count(&self, video_id: VideoId) -> u32 {
        self.store
            .segments()
            .distinct_speaker_count(video_id)
            .await
            .max(1)
    }

    /// Start a dubbing job for a confirmed video.
    ///
    /// Speaker count defaults to the diarized count; missing voices are
    /// filled from per-language defaults and excess ones dropped. The job
    /// record is created before submission so a failed submit leaves an
    /// auditable failed job.
    pub async fn start_dubbing(
        &self,
        video_id: VideoId,
        target_language: &str,
        speaker_count: Option<u32>,
        voice_ids: Vec<String>,
    ) -> PipelineResult<DubbingJob> {
        let video = self.confirmed_video(video_id).await?;

        let count = match speaker_count {
            Some(0) => {
                return Err(PipelineError::invalid_state(
                    "speaker count must be at least one",
                ))
            }
            Some(n) => n,
            None => self.suggest_speaker_count(video_id).await,
        };
        let voices = resolve_voices(target_language, count, voice_ids);

        let job = self
            .store
            .dubbing_jobs()
            .create(video_id, target_language, count, voices.clone())
            .await?;

        let audio = match self
            .with_timeout(async { Ok(self.media.extract_audio(&video.source).await?) })
            .await
        {
            Ok(audio) => audio,
            Err(e) => {
                let failed = job.fail(format!("audio extraction failed: {e}"));
                self.store.dubbing_jobs().update(failed).await?;
                return Err(e);
            }
        };

        let request = DubbingRequest {
            audio_path: audio.wav_path.clone(),
            target_language: target_language.to_string(),
            voice_ids: voices,
            speaker_count: count,
        };
        let provider = &self.providers.synthesis;
        let submitted: PipelineResult<String> =
            match tokio::time::timeout(self.config.stage_timeout, provider.submit_dubbing_job(&request))
                .await
            {
                Ok(r) => r.map_err(PipelineError::from),
                Err(_) => Err(PipelineError::Provider(ProviderError::Timeout {
                    provider: provider.name().to_string(),
                })),
            };
        audio.cleanup();

        match submitted {
            Ok(provider_job_id) => {
                let accepted = job.accepted(provider_job_id);
                let accepted = self.store.dubbing_jobs().update(accepted).await?;
                counter!("vloc_dubbing_submissions_total").increment(1);
                info!(
                    job_id = %accepted.id,
                    video_id = %video_id,
                    target_language,
                    speakers = count,
                    "Dubbing job submitted"
                );
                Ok(accepted)
            }
            Err(e) => {
                let failed = job.fail(e.to_string());
                self.store.dubbing_jobs().update(failed).await?;
                Err(e)
            }
        }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> PipelineResult<T>
    where
        F: std::future::Future<Output = Result<T, PipelineError>>,
    {
        match tokio::time::timeout(self.config.stage_timeout, fut).await {
            Ok(r) => r,
            Err(_) => Err(PipelineError::Timeout {
                stage: vloc_models::PipelineStage::Extraction,
                seconds: self.config.stage_timeout.as_secs(),
            }),
        }
    }

    /// Poll a job's provider-side state and reconcile the local record.
    ///
    /// Idempotent: a completed job is returned as-is without another
    /// provider call, and a job marked failed locally (say, by an earlier
    /// timeout) is still reconciled to completed when the provider later
    /// reports success.
    pub async fn get_dubbing_status(&self, job_id: DubbingJobId) -> PipelineResult<DubbingJob> {
        let job = self.store.dubbing_jobs().get(job_id).await?;

        if job.status == DubbingStatus::Completed {
            return Ok(job);
        }
        let Some(provider_job_id) = job.provider_job_id.clone() else {
            // Never reached the provider: queued or failed pre-submission.
            return Ok(job);
        };

        let poll = self
            .providers
            .synthesis
            .poll_job(&provider_job_id)
            .await?;
        match poll.status {
            ProviderJobStatus::Completed => {
                let output = poll.output_url.ok_or_else(|| {
                    PipelineError::Provider(ProviderError::parse(
                        self.providers.synthesis.name(),
                        "completed job without an output location",
                    ))
                })?;
                let completed = job.complete(output);
                let completed = self.store.dubbing_jobs().update(completed).await?;
                counter!("vloc_dubbing_completions_total").increment(1);
                info!(job_id = %job_id, "Dubbing job completed");
                Ok(completed)
            }
            ProviderJobStatus::Failed => {
                if job.status == DubbingStatus::Failed {
                    return Ok(job);
                }
                let detail = poll
                    .error
                    .unwrap_or_else(|| "provider reported failure without detail".to_string());
                warn!(job_id = %job_id, detail, "Dubbing job failed at provider");
                let failed = job.fail(detail);
                Ok(self.store.dubbing_jobs().update(failed).await?)
            }
            ProviderJobStatus::Queued | ProviderJobStatus::Processing => Ok(job),
        }
    }

    /// Retry dubbing after a failure. The failed job stays in history; a
    /// fresh job is submitted.
    pub async fn retry_dubbing(&self, job_id: DubbingJobId) -> PipelineResult<DubbingJob> {
        let job = self.store.dubbing_jobs().get(job_id).await?;
        if job.status != DubbingStatus::Failed {
            return Err(PipelineError::invalid_state(format!(
                "dubbing job {job_id} is {} and cannot be retried",
                job.status
            )));
        }
        self.start_dubbing(
            job.video_id,
            &job.target_language,
            Some(job.speaker_count),
            job.voice_ids,
        )
        .await
    }

    /// All dubbing attempts for a video, history included.
    pub async fn list_jobs(&self, video_id: VideoId) -> Vec<DubbingJob> {
        self.store.dubbing_jobs().list_for_video(video_id).await
    }
}
