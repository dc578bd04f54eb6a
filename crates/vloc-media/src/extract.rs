//! Audio extraction to normalized mono 16 kHz PCM.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use vloc_models::VideoSource;

use crate::command::FfmpegCommand;
use crate::download::{download_to_temp, platform_duration};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_file;

/// Sample rate of extracted audio.
pub const AUDIO_SAMPLE_RATE: u32 = 16_000;

/// Extracted audio handle.
///
/// Owns the temp directory holding the WAV file and any downloaded
/// intermediates. Dropping it removes everything; [`ExtractedAudio::cleanup`]
/// does the same eagerly with a logged-but-swallowed error path.
#[derive(Debug)]
pub struct ExtractedAudio {
    /// Path to the mono 16 kHz s16le WAV file
    pub wav_path: PathBuf,
    /// Total duration of the source in seconds
    pub duration: f64,
    /// Backing temp directory; removed on drop
    workdir: Option<TempDir>,
}

impl ExtractedAudio {
    /// Wrap an audio file whose lifetime the caller manages; `cleanup`
    /// becomes a no-op.
    pub fn external(wav_path: PathBuf, duration: f64) -> Self {
        Self {
            wav_path,
            duration,
            workdir: None,
        }
    }

    /// Best-effort removal of the temp files. Failure is logged, never
    /// escalated.
    pub fn cleanup(mut self) {
        if let Some(dir) = self.workdir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = %path.display(), error = %e, "Temp audio cleanup failed");
            } else {
                debug!(path = %path.display(), "Temp audio cleaned up");
            }
        }
    }
}

/// Extract a video's audio track as mono 16 kHz PCM WAV.
///
/// Remote sources are downloaded to the temp workdir first. The workdir is
/// removed on every exit path: the returned handle owns it on success, and
/// the `TempDir` drop guard covers the failure paths.
pub async fn extract_audio(source: &VideoSource) -> MediaResult<ExtractedAudio> {
    let workdir = TempDir::with_prefix("vloc-audio-")?;

    let input_path = resolve_input(source, workdir.path()).await?;
    let info = probe_file(&input_path).await?;

    if info.audio_codec.is_none() {
        return Err(MediaError::UnsupportedFormat(format!(
            "no audio stream in {}",
            input_path.display()
        )));
    }

    let wav_path = workdir.path().join("audio.wav");
    FfmpegCommand::new(&input_path, &wav_path)
        .no_video()
        .sample_rate(AUDIO_SAMPLE_RATE)
        .channels(1)
        .audio_codec("pcm_s16le")
        .run()
        .await?;

    // Remove the downloaded intermediate once the WAV exists; the source
    // file can be much larger than the audio.
    if input_path.starts_with(workdir.path()) {
        if let Err(e) = tokio::fs::remove_file(&input_path).await {
            warn!(path = %input_path.display(), error = %e, "Intermediate cleanup failed");
        }
    }

    info!(
        wav = %wav_path.display(),
        duration = info.duration,
        "Audio extraction complete"
    );

    Ok(ExtractedAudio {
        wav_path,
        duration: info.duration,
        workdir: Some(workdir),
    })
}

/// Get a source's duration in fractional seconds.
///
/// Platform URLs are answered from metadata without downloading; local
/// files are probed directly; generic remote URLs are downloaded to a temp
/// location and probed.
pub async fn get_duration(source: &VideoSource) -> MediaResult<f64> {
    match source {
        VideoSource::LocalFile { path } => crate::probe::get_duration(path).await,
        VideoSource::Platform { url } => platform_duration(url).await,
        VideoSource::RemoteUrl { url } => {
            let workdir = TempDir::with_prefix("vloc-probe-")?;
            let path = download_to_temp(url, workdir.path()).await?;
            crate::probe::get_duration(&path).await
        }
    }
}

async fn resolve_input(source: &VideoSource, workdir: &Path) -> MediaResult<PathBuf> {
    match source {
        VideoSource::LocalFile { path } => {
            if !path.exists() {
                return Err(MediaError::FileNotFound(path.clone()));
            }
            Ok(path.clone())
        }
        VideoSource::RemoteUrl { url } | VideoSource::Platform { url } => {
            download_to_temp(url, workdir).await
        }
    }
}
