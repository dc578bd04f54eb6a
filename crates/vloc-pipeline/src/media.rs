//! Media access seam.
//!
//! The pipeline talks to extraction through this trait so tests can run
//! against a fake without ffmpeg installed.

use async_trait::async_trait;

use vloc_media::{extract_audio, get_duration, ExtractedAudio, MediaResult};
use vloc_models::VideoSource;

/// Extraction and probing capability.
#[async_trait]
pub trait MediaAccess: Send + Sync {
    /// Extract a source's audio as mono 16 kHz PCM.
    async fn extract_audio(&self, source: &VideoSource) -> MediaResult<ExtractedAudio>;

    /// Probe a source's duration in fractional seconds.
    async fn duration(&self, source: &VideoSource) -> MediaResult<f64>;
}

/// The real thing: ffmpeg/ffprobe/yt-dlp via `vloc-media`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegMedia;

#[async_trait]
impl MediaAccess for FfmpegMedia {
    async fn extract_audio(&self, source: &VideoSource) -> MediaResult<ExtractedAudio> {
        extract_audio(source).await
    }

    async fn duration(&self, source: &VideoSource) -> MediaResult<f64> {
        get_duration(source).await
    }
}
