//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media extraction and probing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("Duration unavailable for {0}")]
    DurationUnavailable(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        let message = message.into();
        // Decode errors mean the input itself is bad and a retry with the
        // same file cannot succeed.
        if let Some(stderr_text) = stderr.as_deref() {
            if is_unsupported_format_stderr(stderr_text) {
                return Self::UnsupportedFormat(message);
            }
        }
        Self::FfmpegFailed {
            message,
            stderr,
            exit_code,
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Whether this error indicates an undecodable input rather than a
    /// transient tool failure.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, MediaError::UnsupportedFormat(_))
    }
}

/// FFmpeg stderr patterns that indicate an undecodable input.
fn is_unsupported_format_stderr(stderr: &str) -> bool {
    let lowered = stderr.to_lowercase();
    lowered.contains("invalid data found when processing input")
        || lowered.contains("decoder not found")
        || lowered.contains("unknown format")
        || lowered.contains("moov atom not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_classification() {
        let err = MediaError::ffmpeg_failed(
            "decode failed",
            Some("Invalid data found when processing input".to_string()),
            Some(1),
        );
        assert!(err.is_unsupported_format());

        let err = MediaError::ffmpeg_failed(
            "decode failed",
            Some("Connection reset by peer".to_string()),
            Some(1),
        );
        assert!(!err.is_unsupported_format());
    }
}
