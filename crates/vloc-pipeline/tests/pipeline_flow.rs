//! End-to-end pipeline flow: processing, status transitions, fallback
//! transcription, retry and failure handling, all against fakes.

mod support;

use std::sync::Arc;

use vloc_models::{is_ordered_partition, ErrorCode, VideoStatus};
use vloc_pipeline::{PipelineConfig, VideoPipeline, FALLBACK_MODEL_SOURCE};
use vloc_providers::RawSegment;
use vloc_store::Store;

use support::{pipeline_with, seed_video, three_segments, FakeSpeech, FakeSynthesis, SpeechBehavior};

#[tokio::test]
async fn test_happy_path_reaches_completed_with_segments() -> anyhow::Result<()> {
    let speech = FakeSpeech::new("whisper-1", "en", SpeechBehavior::Segments(three_segments()));
    let (pipeline, store) = pipeline_with(
        vec![speech.clone()],
        FakeSynthesis::with_polls(vec![]),
        15.0,
    );
    let video_id = seed_video(&store).await;

    let video = pipeline.process(video_id, &[]).await?;

    assert_eq!(video.status, VideoStatus::Completed);
    assert_eq!(video.duration, Some(15.0));
    assert_eq!(video.detected_language.as_deref(), Some("en"));
    assert!(video.detection_confidence.unwrap() > 0.0);

    let segments = store.segments().list_for_video(video_id).await;
    assert_eq!(segments.len(), 3);
    assert!(is_ordered_partition(&segments));
    for s in &segments {
        assert!(s.confidence >= 0.7, "confidence {} too low", s.confidence);
        assert_eq!(s.model_source, "whisper-1");
        assert!(s.is_original);
    }
    assert_eq!(segments[0].speaker_name.as_deref(), Some("Speaker 1"));
    assert_eq!(store.segments().distinct_speaker_count(video_id).await, 2);
    Ok(())
}

#[tokio::test]
async fn test_status_stream_observes_every_transition() {
    let speech = FakeSpeech::new("whisper-1", "en", SpeechBehavior::Segments(three_segments()));
    let (pipeline, store) = pipeline_with(vec![speech], FakeSynthesis::with_polls(vec![]), 15.0);
    let video_id = seed_video(&store).await;

    let mut rx = pipeline.subscribe(video_id).await.unwrap();
    assert_eq!(*rx.borrow(), VideoStatus::Pending);

    pipeline.process(video_id, &[]).await.unwrap();

    // The watch channel keeps only the latest value; after the run it must
    // hold the terminal state.
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), VideoStatus::Completed);
}

#[tokio::test]
async fn test_flat_text_synthesizes_whole_duration_segment() {
    let speech = FakeSpeech::new(
        "whisper-1",
        "en",
        SpeechBehavior::Flat("a transcript with no timing at all".to_string()),
    );
    let (pipeline, store) = pipeline_with(vec![speech], FakeSynthesis::with_polls(vec![]), 20.0);
    let video_id = seed_video(&store).await;

    pipeline.process(video_id, &[]).await.unwrap();

    let segments = store.segments().list_for_video(video_id).await;
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].start_time, 0.0);
    assert_eq!(segments[0].end_time, 20.0);
    assert_eq!(segments[0].confidence, 0.7);
}

#[tokio::test]
async fn test_long_segments_are_split_under_threshold() {
    let long = RawSegment {
        text: "First we set the scene with some context. Then we walk through \
               the main idea step by step. Finally we wrap up with the results, \
               and what comes next for the project."
            .to_string(),
        start: 0.0,
        end: 45.0,
        avg_logprob: Some(-0.1),
        speaker: None,
    };
    let speech = FakeSpeech::new("whisper-1", "en", SpeechBehavior::Segments(vec![long]));
    let (pipeline, store) = pipeline_with(vec![speech], FakeSynthesis::with_polls(vec![]), 45.0);
    let video_id = seed_video(&store).await;

    pipeline.process(video_id, &[]).await.unwrap();

    let segments = store.segments().list_for_video(video_id).await;
    assert!(segments.len() >= 2);
    assert!(is_ordered_partition(&segments));
    assert_eq!(segments[0].start_time, 0.0);
    assert_eq!(segments.last().unwrap().end_time, 45.0);
    for s in &segments {
        assert!(s.end_time - s.start_time <= 30.0 + 1e-9);
    }
}

#[tokio::test]
async fn test_quota_failure_then_explicit_fallback() {
    let primary = FakeSpeech::new("whisper-1", "en", SpeechBehavior::Quota);
    let secondary = FakeSpeech::new("stt-alt", "en", SpeechBehavior::Quota);
    let tertiary = FakeSpeech::new("stt-basic", "en", SpeechBehavior::Segments(three_segments()));
    let (pipeline, store) = pipeline_with(
        vec![primary, secondary.clone(), tertiary.clone()],
        FakeSynthesis::with_polls(vec![]),
        15.0,
    );
    let video_id = seed_video(&store).await;

    // Primary quota error fails the run without touching the fallbacks.
    let err = pipeline.process(video_id, &[]).await.unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::ProviderQuotaExceeded);

    let video = store.videos().get(video_id).await.unwrap();
    assert_eq!(video.status, VideoStatus::Failed);
    let ve = video.error.unwrap();
    assert_eq!(ve.code, ErrorCode::ProviderQuotaExceeded);
    assert!(ve.retryable);

    // Explicit fallback walks the rungs past the quota-limited secondary.
    let video = pipeline.transcribe_with_fallback(video_id).await.unwrap();
    assert_eq!(video.status, VideoStatus::Completed);
    assert!(video.error.is_none());

    let segments = store.segments().list_for_video(video_id).await;
    assert_eq!(segments.len(), 3);
    for s in &segments {
        assert_eq!(s.model_source, FALLBACK_MODEL_SOURCE);
        assert!(s.confidence <= 0.75);
    }
    assert!(tertiary.calls.load(std::sync::atomic::Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_fallback_flat_text_capped_lower() {
    let primary = FakeSpeech::new("whisper-1", "en", SpeechBehavior::Quota);
    let rung = FakeSpeech::new(
        "stt-basic",
        "en",
        SpeechBehavior::Flat("plain text from a basic model".to_string()),
    );
    let (pipeline, store) =
        pipeline_with(vec![primary, rung], FakeSynthesis::with_polls(vec![]), 12.0);
    let video_id = seed_video(&store).await;

    pipeline.process(video_id, &[]).await.unwrap_err();
    pipeline.transcribe_with_fallback(video_id).await.unwrap();

    let segments = store.segments().list_for_video(video_id).await;
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].confidence, 0.65);
    assert_eq!(segments[0].model_source, FALLBACK_MODEL_SOURCE);
}

#[tokio::test]
async fn test_unsupported_format_fails_without_retryable_flag() {
    let speech = FakeSpeech::new("whisper-1", "en", SpeechBehavior::Segments(three_segments()));
    let store = Store::new();
    let pipeline = VideoPipeline::new(
        store.clone(),
        Arc::new(support::BrokenMedia),
        support::provider_set(vec![speech], FakeSynthesis::with_polls(vec![])),
        PipelineConfig::default(),
    );
    let video_id = seed_video(&store).await;

    let err = pipeline.process(video_id, &[]).await.unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::UnsupportedFormat);

    let video = store.videos().get(video_id).await.unwrap();
    assert_eq!(video.status, VideoStatus::Failed);
    assert!(!video.error.unwrap().retryable);
}

#[tokio::test]
async fn test_retry_clears_error_and_completes() {
    let speech = FakeSpeech::new("whisper-1", "en", SpeechBehavior::Segments(three_segments()));
    let (pipeline, store) = pipeline_with(vec![speech], FakeSynthesis::with_polls(vec![]), 15.0);
    let video_id = seed_video(&store).await;

    // Force a failure through the state machine without running a stage.
    store
        .videos()
        .transition(video_id, VideoStatus::Analyzing)
        .await
        .unwrap();
    store
        .videos()
        .set_failed(
            video_id,
            vloc_models::VideoError::new(ErrorCode::Timeout, "transcription timed out"),
        )
        .await
        .unwrap();

    let video = pipeline.retry(video_id, &[]).await.unwrap();
    assert_eq!(video.status, VideoStatus::Completed);
    assert!(video.error.is_none());
    assert_eq!(store.segments().list_for_video(video_id).await.len(), 3);
}

#[tokio::test]
async fn test_reentrant_start_rejected() {
    let speech = FakeSpeech::new("whisper-1", "en", SpeechBehavior::Segments(three_segments()));
    let (pipeline, store) = pipeline_with(vec![speech], FakeSynthesis::with_polls(vec![]), 15.0);
    let video_id = seed_video(&store).await;

    pipeline.start_processing(video_id).await.unwrap();
    let err = pipeline.start_processing(video_id).await.unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::InvalidState);
}

#[tokio::test]
async fn test_completed_video_requires_reprocess() {
    let speech = FakeSpeech::new("whisper-1", "en", SpeechBehavior::Segments(three_segments()));
    let (pipeline, store) = pipeline_with(vec![speech], FakeSynthesis::with_polls(vec![]), 15.0);
    let video_id = seed_video(&store).await;

    pipeline.process(video_id, &[]).await.unwrap();
    let err = pipeline.start_processing(video_id).await.unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::InvalidState);

    let video = pipeline.reprocess(video_id, &[]).await.unwrap();
    assert_eq!(video.status, VideoStatus::Completed);
}

#[tokio::test]
async fn test_retry_rejected_unless_failed() {
    let speech = FakeSpeech::new("whisper-1", "en", SpeechBehavior::Segments(three_segments()));
    let (pipeline, store) = pipeline_with(vec![speech], FakeSynthesis::with_polls(vec![]), 15.0);
    let video_id = seed_video(&store).await;

    let err = pipeline.retry(video_id, &[]).await.unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::InvalidState);
}

#[tokio::test]
async fn test_non_quota_provider_error_fails_run() {
    let speech = FakeSpeech::new("whisper-1", "en", SpeechBehavior::Reject);
    let (pipeline, store) = pipeline_with(vec![speech], FakeSynthesis::with_polls(vec![]), 15.0);
    let video_id = seed_video(&store).await;

    let err = pipeline.process(video_id, &[]).await.unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::Internal);
    let video = store.videos().get(video_id).await.unwrap();
    assert_eq!(video.status, VideoStatus::Failed);
}

#[tokio::test]
async fn test_model_selection_filters_providers() {
    let primary = FakeSpeech::new("whisper-1", "en", SpeechBehavior::Segments(three_segments()));
    let alt = FakeSpeech::new("stt-alt", "en", SpeechBehavior::Segments(three_segments()));
    let (pipeline, store) = pipeline_with(
        vec![primary.clone(), alt.clone()],
        FakeSynthesis::with_polls(vec![]),
        15.0,
    );
    let video_id = seed_video(&store).await;

    pipeline
        .process(video_id, &["stt-alt".to_string()])
        .await
        .unwrap();

    let segments = store.segments().list_for_video(video_id).await;
    assert!(segments.iter().all(|s| s.model_source == "stt-alt"));
}

#[tokio::test]
async fn test_probe_duration_persists_without_processing() {
    let speech = FakeSpeech::new("whisper-1", "en", SpeechBehavior::Segments(three_segments()));
    let (pipeline, store) = pipeline_with(vec![speech], FakeSynthesis::with_polls(vec![]), 15.0);
    let video_id = seed_video(&store).await;

    let duration = pipeline.probe_duration(video_id).await.unwrap();
    assert_eq!(duration, 15.0);

    // The probe fills in the record but starts no pipeline run.
    let video = store.videos().get(video_id).await.unwrap();
    assert_eq!(video.duration, Some(15.0));
    assert_eq!(video.status, VideoStatus::Pending);

    // Second call answers from the stored record.
    assert_eq!(pipeline.probe_duration(video_id).await.unwrap(), 15.0);
}
