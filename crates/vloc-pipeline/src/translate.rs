//! Translation engine: batched machine translation of confirmed source
//! segments, with per-segment re-translation and user edits.

use metrics::counter;
use tracing::info;

use vloc_models::{SegmentId, Translation, TranslationId, VideoId};
use vloc_providers::ProviderError;
use vloc_store::Store;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::providers::ProviderSet;

/// Translation over the configured machine-translation provider.
pub struct TranslationEngine {
    store: Store,
    providers: ProviderSet,
    config: PipelineConfig,
}

impl TranslationEngine {
    pub fn new(store: Store, providers: ProviderSet, config: PipelineConfig) -> Self {
        Self {
            store,
            providers,
            config,
        }
    }

    async fn source_language(&self, video_id: VideoId) -> PipelineResult<String> {
        let video = self
            .store
            .videos()
            .get(video_id)
            .await
            .map_err(|_| PipelineError::VideoNotFound(video_id))?;
        if !video.source_confirmed {
            return Err(PipelineError::NotConfirmed(video_id));
        }
        Ok(video
            .detected_language
            .unwrap_or_else(|| self.config.default_language.clone()))
    }

    /// Translate all of a video's segments into `target_language`.
    ///
    /// One batched provider call for the whole video; rows are upserted per
    /// (segment, language) pair so re-translation overwrites in place.
    /// `model` narrows to a specific translation model when given; a name
    /// the provider set does not carry is rejected.
    pub async fn translate(
        &self,
        video_id: VideoId,
        target_language: &str,
        model: Option<&str>,
    ) -> PipelineResult<Vec<Translation>> {
        if let Some(requested) = model {
            if requested != self.providers.translation.name() {
                return Err(PipelineError::invalid_state(format!(
                    "unknown translation model {requested}"
                )));
            }
        }
        let source_language = self.source_language(video_id).await?;
        let segments = self.store.segments().list_for_video(video_id).await;
        if segments.is_empty() {
            return Err(PipelineError::invalid_state(format!(
                "video {video_id} has no segments to translate"
            )));
        }

        let provider = &self.providers.translation;
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let translated = provider
            .translate_batch(&texts, &source_language, target_language)
            .await?;
        if translated.len() != segments.len() {
            return Err(PipelineError::Provider(ProviderError::parse(
                provider.name(),
                format!(
                    "batch size mismatch: sent {} texts, got {}",
                    segments.len(),
                    translated.len()
                ),
            )));
        }

        let mut rows = Vec::with_capacity(segments.len());
        for (segment, out) in segments.iter().zip(translated) {
            let row = self
                .store
                .translations()
                .upsert(
                    segment.id,
                    target_language,
                    out.text,
                    out.confidence,
                    provider.name(),
                )
                .await?;
            rows.push(row);
        }

        counter!("vloc_translations_total").increment(rows.len() as u64);
        info!(
            video_id = %video_id,
            target_language,
            rows = rows.len(),
            "Video translated"
        );
        Ok(rows)
    }

    /// Re-translate one segment, overwriting any existing row for the
    /// (segment, language) pair, including a user-edited one.
    pub async fn retranslate_segment(
        &self,
        segment_id: SegmentId,
        target_language: &str,
    ) -> PipelineResult<Translation> {
        let segment = self
            .store
            .segments()
            .get(segment_id)
            .await
            .map_err(|_| PipelineError::SegmentNotFound(segment_id))?;
        let source_language = self.source_language(segment.video_id).await?;

        let provider = &self.providers.translation;
        let texts = vec![segment.text.clone()];
        let mut translated = provider
            .translate_batch(&texts, &source_language, target_language)
            .await?;
        let out = translated.pop().ok_or_else(|| {
            PipelineError::Provider(ProviderError::parse(
                provider.name(),
                "empty batch response for a single text",
            ))
        })?;

        Ok(self
            .store
            .translations()
            .upsert(
                segment_id,
                target_language,
                out.text,
                out.confidence,
                provider.name(),
            )
            .await?)
    }

    /// Apply a manual edit to a translation.
    pub async fn update_translation(
        &self,
        translation_id: TranslationId,
        text: impl Into<String>,
    ) -> PipelineResult<Translation> {
        self.store
            .translations()
            .update_text(translation_id, text)
            .await
            .map_err(|_| PipelineError::TranslationNotFound(translation_id))
    }

    /// All translations for a video in one target language, segment order.
    pub async fn list_for_video(
        &self,
        video_id: VideoId,
        target_language: &str,
    ) -> PipelineResult<Vec<Translation>> {
        self.store
            .videos()
            .get(video_id)
            .await
            .map_err(|_| PipelineError::VideoNotFound(video_id))?;
        Ok(self
            .store
            .translations()
            .list_for_video(video_id, target_language)
            .await)
    }
}
