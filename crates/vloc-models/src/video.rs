//! Video record and source addressing.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::VideoError;
use crate::ids::VideoId;
use crate::status::VideoStatus;

/// Where the video bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VideoSource {
    /// Already-validated file on local disk
    LocalFile { path: PathBuf },
    /// Generic downloadable URL
    RemoteUrl { url: String },
    /// Recognized streaming-platform URL (yt-dlp territory)
    Platform { url: String },
}

impl VideoSource {
    /// Classify a URL string into `Platform` or `RemoteUrl`.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        if is_platform_url(&url) {
            VideoSource::Platform { url }
        } else {
            VideoSource::RemoteUrl { url }
        }
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, VideoSource::LocalFile { .. })
    }
}

/// Whether a URL belongs to a streaming platform that yt-dlp handles
/// natively and can answer metadata queries for without a download.
pub fn is_platform_url(url: &str) -> bool {
    const PLATFORM_HOSTS: [&str; 6] = [
        "youtube.com",
        "youtu.be",
        "vimeo.com",
        "dailymotion.com",
        "twitch.tv",
        "facebook.com",
    ];
    let lowered = url.to_lowercase();
    PLATFORM_HOSTS.iter().any(|h| {
        lowered.contains(&format!("://{h}/"))
            || lowered.contains(&format!("://www.{h}/"))
            || lowered.contains(&format!("://m.{h}/"))
    })
}

/// Video record, the root of the pipeline's persisted state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Video {
    /// Unique video ID
    pub id: VideoId,

    /// Original filename as uploaded
    pub original_filename: String,

    /// Storage path or source URL
    pub source: VideoSource,

    /// File size in bytes (0 for remote sources until downloaded)
    pub file_size: u64,

    /// Duration in seconds; None until extraction succeeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Detected spoken language code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,

    /// Confidence of the language detection (0.0-1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_confidence: Option<f64>,

    /// Processing status
    #[serde(default)]
    pub status: VideoStatus,

    /// Structured error, set when status is Failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<VideoError>,

    /// User has confirmed the source-language segments as accurate.
    /// Gates translation and dubbing.
    #[serde(default)]
    pub source_confirmed: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Create a new video record in the pending state.
    pub fn new(
        id: VideoId,
        original_filename: impl Into<String>,
        source: VideoSource,
        file_size: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            original_filename: original_filename.into(),
            source,
            file_size,
            duration: None,
            detected_language: None,
            detection_confidence: None,
            status: VideoStatus::Pending,
            error: None,
            source_confirmed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as failed with a structured error.
    pub fn fail(mut self, error: VideoError) -> Self {
        self.status = VideoStatus::Failed;
        self.error = Some(error);
        self.updated_at = Utc::now();
        self
    }

    /// Clear error fields for a retry run.
    pub fn clear_error(mut self) -> Self {
        self.error = None;
        self.updated_at = Utc::now();
        self
    }
}
