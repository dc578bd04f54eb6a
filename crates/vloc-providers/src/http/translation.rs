//! Batched HTTP machine-translation client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::translate::{TranslatedText, TranslationProvider};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Confidence recorded when the provider reports none.
const DEFAULT_TRANSLATION_CONFIDENCE: f64 = 0.85;

/// JSON batch-translation API client.
pub struct HttpTranslationClient {
    name: String,
    endpoint: String,
    model: String,
    api_key: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    source_language: &'a str,
    target_language: &'a str,
    texts: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    translations: Vec<ApiTranslation>,
}

#[derive(Debug, Deserialize)]
struct ApiTranslation {
    text: String,
    #[serde(default)]
    confidence: Option<f64>,
}

impl HttpTranslationClient {
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
impl TranslationProvider for HttpTranslationClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> ProviderResult<Vec<TranslatedText>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = %self.name,
            batch = texts.len(),
            source_language,
            target_language,
            "Submitting batch translation"
        );

        let request = ApiRequest {
            model: &self.model,
            source_language,
            target_language,
            texts,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
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

        if api.translations.len() != texts.len() {
            return Err(ProviderError::parse(
                &self.name,
                format!(
                    "batch size mismatch: sent {}, received {}",
                    texts.len(),
                    api.translations.len()
                ),
            ));
        }

        info!(
            provider = %self.name,
            batch = texts.len(),
            target_language,
            "Batch translation complete"
        );

        Ok(api
            .translations
            .into_iter()
            .map(|t| TranslatedText {
                text: t.text,
                confidence: t.confidence.unwrap_or(DEFAULT_TRANSLATION_CONFIDENCE),
            })
            .collect())
    }
}
