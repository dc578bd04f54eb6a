//! FFprobe media information.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Probed media file information.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Audio codec, if an audio stream exists
    pub audio_codec: Option<String>,
    /// File size in bytes
    pub size: u64,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
}

/// Probe a media file.
pub async fn probe_file(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("ffprobe failed for {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| MediaError::DurationUnavailable(path.display().to_string()))?;

    let size = probe
        .format
        .size
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let audio_codec = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "audio")
        .and_then(|s| s.codec_name.clone());

    debug!(
        path = %path.display(),
        duration,
        audio_codec = ?audio_codec,
        "Probed media file"
    );

    Ok(MediaInfo {
        duration,
        audio_codec,
        size,
    })
}

/// Get a file's duration in fractional seconds.
pub async fn get_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let info = probe_file(path).await?;
    Ok(info.duration)
}
