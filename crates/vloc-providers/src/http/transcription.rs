//! Whisper-style HTTP speech-to-text client.
//!
//! Uploads audio as multipart and requests `verbose_json` so the response
//! carries per-segment timestamps and average log-probabilities.

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::speech::{RawSegment, RawTranscript, SpeechToText, TranscribeOptions};

/// Default request timeout. Transcribing long audio is slow.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Whisper-style transcription API client.
pub struct HttpSpeechClient {
    name: String,
    endpoint: String,
    model: String,
    api_key: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    segments: Vec<ApiSegment>,
}

#[derive(Debug, Deserialize)]
struct ApiSegment {
    text: String,
    start: f64,
    end: f64,
    #[serde(default)]
    avg_logprob: Option<f64>,
    #[serde(default)]
    speaker: Option<u32>,
}

impl HttpSpeechClient {
    /// Create a new client.
    ///
    /// `name` becomes the `model_source` tag on persisted segments.
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> ProviderResult<Self> {
        let name = name.into();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::network(&name, e.to_string()))?;
        Ok(Self {
            name,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait]
impl SpeechToText for HttpSpeechClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn transcribe(
        &self,
        audio_path: &Path,
        opts: &TranscribeOptions,
    ) -> ProviderResult<RawTranscript> {
        let bytes = tokio::fs::read(audio_path)
            .await
            .map_err(|e| ProviderError::rejected(&self.name, format!("unreadable audio: {e}")))?;

        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        debug!(
            provider = %self.name,
            bytes = bytes.len(),
            file = %file_name,
            "Submitting transcription request"
        );

        let file_part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| ProviderError::rejected(&self.name, e.to_string()))?;

        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone());
        if opts.timestamps {
            form = form
                .text("response_format", "verbose_json")
                .text("timestamp_granularities[]", "segment");
        }
        if let Some(language) = &opts.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        provider: self.name.clone(),
                    }
                } else {
                    ProviderError::network(&self.name, e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(&self.name, status.as_u16(), body));
        }

        let api: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::parse(&self.name, e.to_string()))?;

        info!(
            provider = %self.name,
            segments = api.segments.len(),
            language = ?api.language,
            "Transcription response received"
        );

        Ok(RawTranscript {
            text: api.text,
            language: api.language,
            segments: api
                .segments
                .into_iter()
                .map(|s| RawSegment {
                    text: s.text.trim().to_string(),
                    start: s.start,
                    end: s.end,
                    avg_logprob: s.avg_logprob,
                    speaker: s.speaker,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_response_parsing() {
        let json = r#"{
            "text": "full transcript",
            "language": "bn",
            "segments": [
                {"text": " hello ", "start": 0.0, "end": 2.5, "avg_logprob": -0.15},
                {"text": "world", "start": 2.5, "end": 4.0}
            ]
        }"#;
        let api: ApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(api.segments.len(), 2);
        assert_eq!(api.segments[0].avg_logprob, Some(-0.15));
        assert!(api.segments[1].avg_logprob.is_none());
    }

    #[test]
    fn test_flat_text_response_parsing() {
        let json = r#"{"text": "only text"}"#;
        let api: ApiResponse = serde_json::from_str(json).unwrap();
        assert!(api.segments.is_empty());
    }
}
