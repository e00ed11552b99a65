use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{header, Client};
use url::Url;

use crate::app_config::DeepgramConfig;
use crate::errors::ProviderError;
use crate::providers::{transport_error, MediaInput, SubtitleProvider, TranscriptionProvider};
use crate::sanitizer::SubtitlePayload;
use crate::transcript::AsrResponse;

const PROVIDER_NAME: &str = "Deepgram";

/// Deepgram client for the pre-recorded `/v1/listen` API
#[derive(Debug)]
pub struct Deepgram {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
    /// Model name
    model: String,
}

impl Deepgram {
    /// Create a new Deepgram client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &DeepgramConfig) -> Self {
        Self::new(&config.api_key, &config.endpoint, &config.model, config.timeout_secs)
    }

    /// Full request URL with the transcription options as query parameters
    pub fn listen_url(&self) -> Result<Url, ProviderError> {
        let base = if self.endpoint.is_empty() {
            "https://api.deepgram.com"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        let mut url = Url::parse(&format!("{}/v1/listen", base))
            .map_err(|e| ProviderError::Transport(format!("Invalid Deepgram endpoint {}: {}", base, e)))?;

        url.query_pairs_mut()
            .append_pair("model", &self.model)
            .append_pair("smart_format", "true")
            .append_pair("punctuate", "true")
            .append_pair("numerals", "true")
            .append_pair("paragraphs", "true")
            .append_pair("utterances", "false")
            .append_pair("diarize", "false");

        Ok(url)
    }

    /// Send the media and return the raw JSON body
    async fn listen(&self, media: &MediaInput) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingCredential("DEEPGRAM_API_KEY".to_string()));
        }

        let url = self.listen_url()?;
        debug!("Sending {} bytes of {} to Deepgram", media.bytes.len(), media.content_type);

        let response = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, format!("Token {}", self.api_key))
            .header(header::CONTENT_TYPE, &media.content_type)
            .header(header::ACCEPT, "application/json")
            .body(media.bytes.clone())
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER_NAME, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(PROVIDER_NAME, e))?;

        if !status.is_success() {
            let error = ProviderError::http(PROVIDER_NAME, status.as_u16(), &body);
            error!("{}", error);
            return Err(error);
        }

        Ok(body)
    }
}

#[async_trait]
impl TranscriptionProvider for Deepgram {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn transcribe(&self, media: &MediaInput) -> Result<AsrResponse, ProviderError> {
        let body = self.listen(media).await?;
        AsrResponse::from_json(&body)
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse Deepgram response: {}", e)))
    }
}

#[async_trait]
impl SubtitleProvider for Deepgram {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn transcribe_subtitles(&self, media: &MediaInput) -> Result<SubtitlePayload, ProviderError> {
        let body = self.listen(media).await?;
        Ok(SubtitlePayload::EmbeddedAsr(body.trim().to_string()))
    }
}
