//! Provider error types.

use thiserror::Error;

/// Result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors from external provider calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Rate/quota limit hit. The only class the fallback ladder acts on.
    #[error("Quota exceeded at {provider}: {message}")]
    QuotaExceeded { provider: String, message: String },

    #[error("Network error talking to {provider}: {message}")]
    Network { provider: String, message: String },

    #[error("Unparseable response from {provider}: {message}")]
    Parse { provider: String, message: String },

    #[error("Provider {provider} rejected the request: {message}")]
    Rejected { provider: String, message: String },

    #[error("Provider {provider} call timed out")]
    Timeout { provider: String },
}

impl ProviderError {
    pub fn quota(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QuotaExceeded {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn parse(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rejected(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this is a quota-class failure.
    pub fn is_quota(&self) -> bool {
        matches!(self, ProviderError::QuotaExceeded { .. })
    }

    /// Provider name the error originated from.
    pub fn provider(&self) -> &str {
        match self {
            ProviderError::QuotaExceeded { provider, .. }
            | ProviderError::Network { provider, .. }
            | ProviderError::Parse { provider, .. }
            | ProviderError::Rejected { provider, .. }
            | ProviderError::Timeout { provider } => provider,
        }
    }

    /// Classify an HTTP status from a provider response.
    pub fn from_status(provider: &str, status: u16, body: String) -> Self {
        match status {
            429 => Self::quota(provider, body),
            402 | 403 if body.to_lowercase().contains("quota") => Self::quota(provider, body),
            400..=499 => Self::rejected(provider, body),
            _ => Self::network(provider, format!("HTTP {status}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(ProviderError::from_status("whisper", 429, "slow down".into()).is_quota());
        assert!(ProviderError::from_status("whisper", 403, "quota exhausted".into()).is_quota());
        assert!(!ProviderError::from_status("whisper", 400, "bad audio".into()).is_quota());
        assert!(matches!(
            ProviderError::from_status("whisper", 500, "oops".into()),
            ProviderError::Network { .. }
        ));
    }

    #[test]
    fn test_provider_accessor() {
        let err = ProviderError::quota("nmt-batch", "limit");
        assert_eq!(err.provider(), "nmt-batch");
    }
}
