//! HTTP voice-synthesis (dubbing) client: submit + poll.

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::synthesis::{DubbingPoll, DubbingRequest, ProviderJobStatus, VoiceSynthesis};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Dubbing API client. Submission uploads the full original audio; the
/// provider renders asynchronously and is polled by job id.
pub struct HttpDubbingClient {
    name: String,
    base_url: String,
    api_key: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    status: String,
    #[serde(default)]
    output_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpDubbingClient {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> ProviderResult<Self> {
        let name = name.into();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::network(&name, e.to_string()))?;
        Ok(Self {
            name,
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        })
    }

    fn parse_status(&self, status: &str) -> ProviderResult<ProviderJobStatus> {
        match status {
            "queued" | "pending" => Ok(ProviderJobStatus::Queued),
            "processing" | "dubbing" | "rendering" => Ok(ProviderJobStatus::Processing),
            "completed" | "dubbed" | "done" => Ok(ProviderJobStatus::Completed),
            "failed" | "error" => Ok(ProviderJobStatus::Failed),
            other => Err(ProviderError::parse(
                &self.name,
                format!("unknown job status '{other}'"),
            )),
        }
    }
}

#[async_trait]
impl VoiceSynthesis for HttpDubbingClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn submit_dubbing_job(&self, request: &DubbingRequest) -> ProviderResult<String> {
        let bytes = tokio::fs::read(&request.audio_path)
            .await
            .map_err(|e| ProviderError::rejected(&self.name, format!("unreadable audio: {e}")))?;

        debug!(
            provider = %self.name,
            target_language = %request.target_language,
            speakers = request.speaker_count,
            bytes = bytes.len(),
            "Submitting dubbing job"
        );

        let file_part = multipart::Part::bytes(bytes)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| ProviderError::rejected(&self.name, e.to_string()))?;

        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("target_lang", request.target_language.clone())
            .text("num_speakers", request.speaker_count.to_string());
        for voice_id in &request.voice_ids {
            form = form.text("voice_ids[]", voice_id.clone());
        }

        let response = self
            .client
            .post(format!("{}/dubbing", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::network(&self.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(&self.name, status.as_u16(), body));
        }

        let submit: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::parse(&self.name, e.to_string()))?;

        info!(
            provider = %self.name,
            provider_job_id = %submit.job_id,
            "Dubbing job accepted"
        );

        Ok(submit.job_id)
    }

    async fn poll_job(&self, provider_job_id: &str) -> ProviderResult<DubbingPoll> {
        let response = self
            .client
            .get(format!("{}/dubbing/{}", self.base_url, provider_job_id))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::network(&self.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(&self.name, status.as_u16(), body));
        }

        let poll: PollResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::parse(&self.name, e.to_string()))?;

        Ok(DubbingPoll {
            status: self.parse_status(&poll.status)?,
            output_url: poll.output_url,
            error: poll.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let client = HttpDubbingClient::new("dub", "https://api.example.com/v1", "key").unwrap();
        assert_eq!(client.parse_status("dubbed").unwrap(), ProviderJobStatus::Completed);
        assert_eq!(client.parse_status("pending").unwrap(), ProviderJobStatus::Queued);
        assert_eq!(client.parse_status("rendering").unwrap(), ProviderJobStatus::Processing);
        assert!(client.parse_status("mystery").is_err());
    }
}
