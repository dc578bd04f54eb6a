//! Shared fakes for pipeline integration tests: canned media access and
//! providers so the full flow runs without ffmpeg or network.

// Not every test binary uses every fake.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use vloc_media::{ExtractedAudio, MediaError, MediaResult};
use vloc_models::{VideoId, VideoSource};
use vloc_pipeline::{MediaAccess, PipelineConfig, ProviderSet, VideoPipeline};
use vloc_providers::{
    DubbingPoll, DubbingRequest, ProviderError, ProviderResult, RawSegment, RawTranscript,
    SpeechToText, TranscribeOptions, TranslatedText, TranslationProvider, VoiceSynthesis,
};
use vloc_store::Store;

/// Media access that reports a fixed duration and a phantom WAV path.
pub struct FakeMedia {
    pub duration: f64,
}

#[async_trait]
impl MediaAccess for FakeMedia {
    async fn extract_audio(&self, _source: &VideoSource) -> MediaResult<ExtractedAudio> {
        Ok(ExtractedAudio::external(
            PathBuf::from("/tmp/vloc-test-audio.wav"),
            self.duration,
        ))
    }

    async fn duration(&self, _source: &VideoSource) -> MediaResult<f64> {
        Ok(self.duration)
    }
}

/// Media access that always fails extraction.
pub struct BrokenMedia;

#[async_trait]
impl MediaAccess for BrokenMedia {
    async fn extract_audio(&self, _source: &VideoSource) -> MediaResult<ExtractedAudio> {
        Err(MediaError::UnsupportedFormat(
            "no audio stream in source".to_string(),
        ))
    }

    async fn duration(&self, _source: &VideoSource) -> MediaResult<f64> {
        Err(MediaError::DurationUnavailable("broken source".to_string()))
    }
}

/// What a fake speech provider does on each transcribe call.
#[derive(Clone)]
pub enum SpeechBehavior {
    /// Verbose transcript with the given timed segments
    Segments(Vec<RawSegment>),
    /// Flat text only, no timing
    Flat(String),
    /// Quota-class failure
    Quota,
    /// Non-quota rejection
    Reject,
}

pub struct FakeSpeech {
    name: &'static str,
    language: &'static str,
    behavior: SpeechBehavior,
    pub calls: AtomicUsize,
}

impl FakeSpeech {
    pub fn new(name: &'static str, language: &'static str, behavior: SpeechBehavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            language,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SpeechToText for FakeSpeech {
    fn name(&self) -> &str {
        self.name
    }

    async fn transcribe(
        &self,
        _audio_path: &Path,
        _opts: &TranscribeOptions,
    ) -> ProviderResult<RawTranscript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            SpeechBehavior::Segments(segments) => Ok(RawTranscript {
                text: segments
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                segments: segments.clone(),
                language: Some(self.language.to_string()),
            }),
            SpeechBehavior::Flat(text) => Ok(RawTranscript {
                text: text.clone(),
                segments: vec![],
                language: Some(self.language.to_string()),
            }),
            SpeechBehavior::Quota => Err(ProviderError::quota(self.name, "monthly limit reached")),
            SpeechBehavior::Reject => Err(ProviderError::rejected(self.name, "audio too short")),
        }
    }
}

/// Translator that wraps each input as `[lang] text`.
pub struct FakeTranslator;

#[async_trait]
impl TranslationProvider for FakeTranslator {
    fn name(&self) -> &str {
        "mt-fake"
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_language: &str,
        target_language: &str,
    ) -> ProviderResult<Vec<TranslatedText>> {
        Ok(texts
            .iter()
            .map(|t| TranslatedText {
                text: format!("[{target_language}] {t}"),
                confidence: 0.9,
            })
            .collect())
    }
}

/// Synthesis provider driven by a scripted poll schedule.
pub struct FakeSynthesis {
    pub submissions: AtomicUsize,
    fail_submit: bool,
    polls: Mutex<Vec<DubbingPoll>>,
}

impl FakeSynthesis {
    pub fn with_polls(polls: Vec<DubbingPoll>) -> Arc<Self> {
        Arc::new(Self {
            submissions: AtomicUsize::new(0),
            fail_submit: false,
            polls: Mutex::new(polls),
        })
    }

    pub fn failing_submit() -> Arc<Self> {
        Arc::new(Self {
            submissions: AtomicUsize::new(0),
            fail_submit: true,
            polls: Mutex::new(vec![]),
        })
    }
}

#[async_trait]
impl VoiceSynthesis for FakeSynthesis {
    fn name(&self) -> &str {
        "dub-fake"
    }

    async fn submit_dubbing_job(&self, _request: &DubbingRequest) -> ProviderResult<String> {
        let n = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_submit {
            return Err(ProviderError::rejected("dub-fake", "no capacity"));
        }
        Ok(format!("prov-job-{n}"))
    }

    async fn poll_job(&self, _provider_job_id: &str) -> ProviderResult<DubbingPoll> {
        let mut polls = self.polls.lock().unwrap();
        if polls.is_empty() {
            return Ok(DubbingPoll {
                status: vloc_providers::ProviderJobStatus::Processing,
                output_url: None,
                error: None,
            });
        }
        Ok(polls.remove(0))
    }
}

pub fn provider_set(speech: Vec<Arc<FakeSpeech>>, synthesis: Arc<FakeSynthesis>) -> ProviderSet {
    ProviderSet {
        speech: speech
            .into_iter()
            .map(|s| s as Arc<dyn SpeechToText>)
            .collect(),
        translation: Arc::new(FakeTranslator),
        synthesis,
    }
}

/// A pipeline wired entirely to fakes, plus its backing store.
pub fn pipeline_with(
    speech: Vec<Arc<FakeSpeech>>,
    synthesis: Arc<FakeSynthesis>,
    duration: f64,
) -> (VideoPipeline, Store) {
    let store = Store::new();
    let pipeline = VideoPipeline::new(
        store.clone(),
        Arc::new(FakeMedia { duration }),
        provider_set(speech, synthesis),
        PipelineConfig::default(),
    );
    (pipeline, store)
}

pub async fn seed_video(store: &Store) -> VideoId {
    let video = store
        .videos()
        .create(
            "clip.mp4",
            VideoSource::LocalFile {
                path: PathBuf::from("/tmp/clip.mp4"),
            },
            4096,
        )
        .await;
    video.id
}

/// Three clean segments partitioning [0, 15) across two speakers.
pub fn three_segments() -> Vec<RawSegment> {
    vec![
        RawSegment {
            text: "Welcome back to the channel everyone.".to_string(),
            start: 0.0,
            end: 5.0,
            avg_logprob: Some(-0.1),
            speaker: Some(0),
        },
        RawSegment {
            text: "Today we are looking at something new.".to_string(),
            start: 5.0,
            end: 10.0,
            avg_logprob: Some(-0.2),
            speaker: Some(1),
        },
        RawSegment {
            text: "Let us get right into it.".to_string(),
            start: 10.0,
            end: 15.0,
            avg_logprob: Some(-0.15),
            speaker: Some(0),
        },
    ]
}
