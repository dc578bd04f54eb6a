//! Structured error persisted on a failed video.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline error classification.
///
/// The code decides two things downstream: whether the consuming layer
/// offers a retry affordance, and whether the provider fallback ladder may
/// be walked (`ProviderQuotaExceeded` only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Audio/metadata extraction tool errored
    ExtractionFailed,
    /// Duration probing produced nothing parseable
    DurationUnavailable,
    /// Upstream provider rate/quota limit hit
    ProviderQuotaExceeded,
    /// Input media format/codec not decodable
    UnsupportedFormat,
    /// Referenced record does not exist
    NotFound,
    /// State machine precondition unmet
    InvalidState,
    /// Translation/dubbing attempted before source confirmation
    NotConfirmed,
    /// Stage exceeded its wall-clock budget
    Timeout,
    /// Unclassified internal failure
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ExtractionFailed => "extraction_failed",
            ErrorCode::DurationUnavailable => "duration_unavailable",
            ErrorCode::ProviderQuotaExceeded => "provider_quota_exceeded",
            ErrorCode::UnsupportedFormat => "unsupported_format",
            ErrorCode::NotFound => "not_found",
            ErrorCode::InvalidState => "invalid_state",
            ErrorCode::NotConfirmed => "not_confirmed",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Internal => "internal",
        }
    }

    /// Whether a failure with this code is worth retrying as-is.
    ///
    /// `UnsupportedFormat` needs a different input file; the caller-error
    /// codes are not retried at all.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::ExtractionFailed
                | ErrorCode::DurationUnavailable
                | ErrorCode::ProviderQuotaExceeded
                | ErrorCode::Timeout
                | ErrorCode::Internal
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured error stored on the video row when a stage fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoError {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl VideoError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ErrorCode::ExtractionFailed.is_retryable());
        assert!(ErrorCode::Timeout.is_retryable());
        assert!(!ErrorCode::UnsupportedFormat.is_retryable());
        assert!(!ErrorCode::InvalidState.is_retryable());
        assert!(!ErrorCode::NotConfirmed.is_retryable());
    }

    #[test]
    fn test_video_error_carries_flag() {
        let err = VideoError::new(ErrorCode::ProviderQuotaExceeded, "quota exhausted");
        assert!(err.retryable);
        assert_eq!(err.to_string(), "provider_quota_exceeded: quota exhausted");
    }
}
