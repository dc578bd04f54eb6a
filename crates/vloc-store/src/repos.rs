//! Typed repositories for pipeline entities.

use chrono::Utc;
use metrics::counter;
use tracing::info;

use vloc_models::{
    DubbingJob, DubbingJobId, SegmentId, TranscriptionSegment, Translation, TranslationId, Video,
    VideoError, VideoId, VideoSource, VideoStatus,
};

use crate::error::{StoreError, StoreResult};
use crate::store::Store;

/// Input for persisting one standardized segment.
#[derive(Debug, Clone)]
pub struct NewSegment {
    pub language: String,
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
    pub confidence: f64,
    pub model_source: String,
    pub speaker_id: Option<u32>,
    pub speaker_name: Option<String>,
}

/// Repository for video records.
pub struct VideoRepository {
    store: Store,
}

impl VideoRepository {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create a new video record in the pending state.
    pub async fn create(
        &self,
        original_filename: impl Into<String>,
        source: VideoSource,
        file_size: u64,
    ) -> Video {
        let mut inner = self.store.inner.write().await;
        let id = VideoId(inner.alloc_video_id());
        let video = Video::new(id, original_filename, source, file_size);
        inner.videos.insert(id.as_i64(), video.clone());
        counter!("vloc_videos_created_total").increment(1);
        info!(video_id = %id, "Created video record");
        video
    }

    /// Get a video by ID.
    pub async fn get(&self, video_id: VideoId) -> StoreResult<Video> {
        let inner = self.store.inner.read().await;
        inner
            .videos
            .get(&video_id.as_i64())
            .cloned()
            .ok_or_else(|| StoreError::not_found("video", video_id.as_i64()))
    }

    /// List all videos.
    pub async fn list(&self) -> Vec<Video> {
        let inner = self.store.inner.read().await;
        inner.videos.values().cloned().collect()
    }

    /// Atomically apply a status transition, validating it against the
    /// transition table while the write lock is held. This is the
    /// read-then-write the rest of the pipeline relies on.
    pub async fn transition(&self, video_id: VideoId, to: VideoStatus) -> StoreResult<Video> {
        let mut inner = self.store.inner.write().await;
        let video = inner
            .videos
            .get_mut(&video_id.as_i64())
            .ok_or_else(|| StoreError::not_found("video", video_id.as_i64()))?;
        video.status = video.status.transition(to)?;
        video.updated_at = Utc::now();
        counter!("vloc_status_transitions_total").increment(1);
        info!(video_id = %video_id, status = %video.status, "Video status transition");
        Ok(video.clone())
    }

    /// Record the probed duration.
    pub async fn set_duration(&self, video_id: VideoId, duration: f64) -> StoreResult<Video> {
        self.mutate(video_id, |v| {
            v.duration = Some(duration);
        })
        .await
    }

    /// Record the detected source language.
    pub async fn set_detected_language(
        &self,
        video_id: VideoId,
        code: impl Into<String>,
        confidence: f64,
    ) -> StoreResult<Video> {
        let code = code.into();
        self.mutate(video_id, move |v| {
            v.detected_language = Some(code);
            v.detection_confidence = Some(confidence);
        })
        .await
    }

    /// Transition to failed and persist the structured error.
    pub async fn set_failed(&self, video_id: VideoId, error: VideoError) -> StoreResult<Video> {
        let mut inner = self.store.inner.write().await;
        let video = inner
            .videos
            .get_mut(&video_id.as_i64())
            .ok_or_else(|| StoreError::not_found("video", video_id.as_i64()))?;
        video.status = video.status.transition(VideoStatus::Failed)?;
        video.error = Some(error);
        video.updated_at = Utc::now();
        counter!("vloc_videos_failed_total").increment(1);
        info!(video_id = %video_id, error = %video.error.as_ref().map(|e| e.code.as_str()).unwrap_or(""), "Video failed");
        Ok(video.clone())
    }

    /// Retry reset: `failed -> processing`, error fields cleared.
    pub async fn reset_for_retry(&self, video_id: VideoId) -> StoreResult<Video> {
        let mut inner = self.store.inner.write().await;
        let video = inner
            .videos
            .get_mut(&video_id.as_i64())
            .ok_or_else(|| StoreError::not_found("video", video_id.as_i64()))?;
        video.status = video.status.transition(VideoStatus::Processing)?;
        video.error = None;
        video.updated_at = Utc::now();
        info!(video_id = %video_id, "Video reset for retry");
        Ok(video.clone())
    }

    /// Set the source-confirmation flag.
    pub async fn set_source_confirmed(
        &self,
        video_id: VideoId,
        confirmed: bool,
    ) -> StoreResult<Video> {
        self.mutate(video_id, move |v| {
            v.source_confirmed = confirmed;
        })
        .await
    }

    async fn mutate(
        &self,
        video_id: VideoId,
        f: impl FnOnce(&mut Video),
    ) -> StoreResult<Video> {
        let mut inner = self.store.inner.write().await;
        let video = inner
            .videos
            .get_mut(&video_id.as_i64())
            .ok_or_else(|| StoreError::not_found("video", video_id.as_i64()))?;
        f(video);
        video.updated_at = Utc::now();
        Ok(video.clone())
    }
}

/// Repository for transcription segments.
pub struct SegmentRepository {
    store: Store,
}

impl SegmentRepository {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    /// Replace a video's segments wholesale, dropping translations of the
    /// replaced segments. Used for (re-)transcription and model switches.
    pub async fn replace_for_video(
        &self,
        video_id: VideoId,
        new_segments: Vec<NewSegment>,
    ) -> StoreResult<Vec<TranscriptionSegment>> {
        let mut inner = self.store.inner.write().await;
        if !inner.videos.contains_key(&video_id.as_i64()) {
            return Err(StoreError::not_found("video", video_id.as_i64()));
        }

        let old_ids: Vec<i64> = inner
            .segments
            .values()
            .filter(|s| s.video_id == video_id)
            .map(|s| s.id.as_i64())
            .collect();
        for id in &old_ids {
            inner.segments.remove(id);
        }
        inner
            .translations
            .retain(|_, t| !old_ids.contains(&t.segment_id.as_i64()));

        let now = Utc::now();
        let mut created = Vec::with_capacity(new_segments.len());
        for seg in new_segments {
            let id = SegmentId(inner.alloc_segment_id());
            let record = TranscriptionSegment {
                id,
                video_id,
                language: seg.language,
                text: seg.text,
                start_time: seg.start_time,
                end_time: seg.end_time,
                confidence: seg.confidence,
                model_source: seg.model_source,
                speaker_id: seg.speaker_id,
                speaker_name: seg.speaker_name,
                is_original: true,
                created_at: now,
            };
            inner.segments.insert(id.as_i64(), record.clone());
            created.push(record);
        }

        counter!("vloc_segments_persisted_total").increment(created.len() as u64);
        info!(
            video_id = %video_id,
            replaced = old_ids.len(),
            created = created.len(),
            "Replaced video segments"
        );
        Ok(created)
    }

    /// Get a segment by ID.
    pub async fn get(&self, segment_id: SegmentId) -> StoreResult<TranscriptionSegment> {
        let inner = self.store.inner.read().await;
        inner
            .segments
            .get(&segment_id.as_i64())
            .cloned()
            .ok_or_else(|| StoreError::not_found("segment", segment_id.as_i64()))
    }

    /// List a video's segments in start-time order.
    pub async fn list_for_video(&self, video_id: VideoId) -> Vec<TranscriptionSegment> {
        let inner = self.store.inner.read().await;
        let mut segments: Vec<TranscriptionSegment> = inner
            .segments
            .values()
            .filter(|s| s.video_id == video_id)
            .cloned()
            .collect();
        segments.sort_by(|a, b| {
            a.start_time
                .partial_cmp(&b.start_time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        segments
    }

    /// Apply a user edit to a segment's text. Clears `is_original`.
    pub async fn update_text(
        &self,
        segment_id: SegmentId,
        text: impl Into<String>,
    ) -> StoreResult<TranscriptionSegment> {
        let mut inner = self.store.inner.write().await;
        let segment = inner
            .segments
            .get_mut(&segment_id.as_i64())
            .ok_or_else(|| StoreError::not_found("segment", segment_id.as_i64()))?;
        segment.text = text.into();
        segment.is_original = false;
        info!(segment_id = %segment_id, "Segment text edited");
        Ok(segment.clone())
    }

    /// Number of distinct non-null speaker ids across a video's segments.
    pub async fn distinct_speaker_count(&self, video_id: VideoId) -> u32 {
        let inner = self.store.inner.read().await;
        let mut speakers: Vec<u32> = inner
            .segments
            .values()
            .filter(|s| s.video_id == video_id)
            .filter_map(|s| s.speaker_id)
            .collect();
        speakers.sort_unstable();
        speakers.dedup();
        speakers.len() as u32
    }
}

/// Repository for translations, with upsert semantics.
pub struct TranslationRepository {
    store: Store,
}

impl TranslationRepository {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    /// Upsert one translation for a (segment, target language) pair.
    ///
    /// Replaces text/confidence/model in place when a row exists, inserts
    /// otherwise. Never creates a duplicate pair.
    pub async fn upsert(
        &self,
        segment_id: SegmentId,
        target_language: impl Into<String>,
        translated_text: impl Into<String>,
        confidence: f64,
        model: impl Into<String>,
    ) -> StoreResult<Translation> {
        let target_language = target_language.into();
        let mut inner = self.store.inner.write().await;
        if !inner.segments.contains_key(&segment_id.as_i64()) {
            return Err(StoreError::not_found("segment", segment_id.as_i64()));
        }

        let existing_id = inner
            .translations
            .values()
            .find(|t| t.segment_id == segment_id && t.target_language == target_language)
            .map(|t| t.id.as_i64());

        let now = Utc::now();
        let translation = match existing_id {
            Some(id) => {
                let row = inner
                    .translations
                    .get_mut(&id)
                    .ok_or_else(|| StoreError::not_found("translation", id))?;
                row.translated_text = translated_text.into();
                row.confidence = confidence;
                row.model = model.into();
                row.updated_at = now;
                row.clone()
            }
            None => {
                let id = TranslationId(inner.alloc_translation_id());
                let row = Translation {
                    id,
                    segment_id,
                    target_language,
                    translated_text: translated_text.into(),
                    confidence,
                    model: model.into(),
                    created_at: now,
                    updated_at: now,
                };
                inner.translations.insert(id.as_i64(), row.clone());
                row
            }
        };

        counter!("vloc_translations_upserted_total").increment(1);
        Ok(translation)
    }

    /// Get a translation by ID.
    pub async fn get(&self, translation_id: TranslationId) -> StoreResult<Translation> {
        let inner = self.store.inner.read().await;
        inner
            .translations
            .get(&translation_id.as_i64())
            .cloned()
            .ok_or_else(|| StoreError::not_found("translation", translation_id.as_i64()))
    }

    /// List translations for one segment.
    pub async fn list_for_segment(&self, segment_id: SegmentId) -> Vec<Translation> {
        let inner = self.store.inner.read().await;
        inner
            .translations
            .values()
            .filter(|t| t.segment_id == segment_id)
            .cloned()
            .collect()
    }

    /// List a video's translations into one language, in segment
    /// start-time order.
    pub async fn list_for_video(
        &self,
        video_id: VideoId,
        target_language: &str,
    ) -> Vec<Translation> {
        let inner = self.store.inner.read().await;
        let mut rows: Vec<(f64, Translation)> = inner
            .translations
            .values()
            .filter(|t| t.target_language == target_language)
            .filter_map(|t| {
                inner
                    .segments
                    .get(&t.segment_id.as_i64())
                    .filter(|s| s.video_id == video_id)
                    .map(|s| (s.start_time, t.clone()))
            })
            .collect();
        rows.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        rows.into_iter().map(|(_, t)| t).collect()
    }

    /// Apply a manual user edit. A terminal override: nothing invalidates
    /// it except an explicit re-translate.
    pub async fn update_text(
        &self,
        translation_id: TranslationId,
        text: impl Into<String>,
    ) -> StoreResult<Translation> {
        let mut inner = self.store.inner.write().await;
        let row = inner
            .translations
            .get_mut(&translation_id.as_i64())
            .ok_or_else(|| StoreError::not_found("translation", translation_id.as_i64()))?;
        *row = row.clone().apply_user_edit(text);
        Ok(row.clone())
    }

    /// Drop all of a video's cached translations (on source confirmation,
    /// which requires regenerating against the confirmed text).
    pub async fn clear_for_video(&self, video_id: VideoId) -> usize {
        let mut inner = self.store.inner.write().await;
        let segment_ids: Vec<i64> = inner
            .segments
            .values()
            .filter(|s| s.video_id == video_id)
            .map(|s| s.id.as_i64())
            .collect();
        let before = inner.translations.len();
        inner
            .translations
            .retain(|_, t| !segment_ids.contains(&t.segment_id.as_i64()));
        let removed = before - inner.translations.len();
        if removed > 0 {
            info!(video_id = %video_id, removed, "Cleared cached translations");
        }
        removed
    }
}

/// Repository for dubbing jobs.
pub struct DubbingJobRepository {
    store: Store,
}

impl DubbingJobRepository {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create a fresh job in the queued state.
    pub async fn create(
        &self,
        video_id: VideoId,
        target_language: impl Into<String>,
        speaker_count: u32,
        voice_ids: Vec<String>,
    ) -> StoreResult<DubbingJob> {
        let mut inner = self.store.inner.write().await;
        if !inner.videos.contains_key(&video_id.as_i64()) {
            return Err(StoreError::not_found("video", video_id.as_i64()));
        }
        let id = DubbingJobId(inner.alloc_dubbing_id());
        let job = DubbingJob::new(id, video_id, target_language, speaker_count, voice_ids);
        inner.dubbing_jobs.insert(id.as_i64(), job.clone());
        counter!("vloc_dubbing_jobs_created_total").increment(1);
        info!(job_id = %id, video_id = %video_id, "Created dubbing job");
        Ok(job)
    }

    /// Get a job by ID.
    pub async fn get(&self, job_id: DubbingJobId) -> StoreResult<DubbingJob> {
        let inner = self.store.inner.read().await;
        inner
            .dubbing_jobs
            .get(&job_id.as_i64())
            .cloned()
            .ok_or_else(|| StoreError::not_found("dubbing job", job_id.as_i64()))
    }

    /// All jobs for a video, oldest first. Failed attempts stay in history.
    pub async fn list_for_video(&self, video_id: VideoId) -> Vec<DubbingJob> {
        let inner = self.store.inner.read().await;
        inner
            .dubbing_jobs
            .values()
            .filter(|j| j.video_id == video_id)
            .cloned()
            .collect()
    }

    /// Persist an updated job record.
    pub async fn update(&self, job: DubbingJob) -> StoreResult<DubbingJob> {
        let mut inner = self.store.inner.write().await;
        let id = job.id.as_i64();
        if !inner.dubbing_jobs.contains_key(&id) {
            return Err(StoreError::not_found("dubbing job", id));
        }
        inner.dubbing_jobs.insert(id, job.clone());
        Ok(job)
    }
}
