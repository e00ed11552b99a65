use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::app_config::OpenAIConfig;
use crate::errors::ProviderError;
use crate::providers::{transport_error, MediaInput, SubtitleProvider};
use crate::sanitizer::SubtitlePayload;

const PROVIDER_NAME: &str = "OpenAI";

/// OpenAI Whisper client returning SRT transcriptions
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
    /// Model name
    model: String,
}

impl OpenAI {
    /// Create a new OpenAI client
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

    pub fn from_config(config: &OpenAIConfig) -> Self {
        Self::new(&config.api_key, &config.endpoint, &config.model, config.timeout_secs)
    }

    /// Transcription endpoint URL
    pub fn transcriptions_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.openai.com/v1/audio/transcriptions".to_string()
        } else {
            format!("{}/audio/transcriptions", self.endpoint.trim_end_matches('/'))
        }
    }
}

#[async_trait]
impl SubtitleProvider for OpenAI {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn transcribe_subtitles(&self, media: &MediaInput) -> Result<SubtitlePayload, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingCredential("OPENAI_API_KEY".to_string()));
        }

        let file = Part::bytes(media.bytes.to_vec())
            .file_name(media.file_name())
            .mime_str(&media.content_type)
            .map_err(|e| ProviderError::Transport(format!("Invalid media type {}: {}", media.content_type, e)))?;
        let form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "srt")
            .part("file", file);

        debug!("Uploading {} to OpenAI transcription", media.file_name());

        let response = self
            .client
            .post(self.transcriptions_url())
            .bearer_auth(&self.api_key)
            .multipart(form)
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

        Ok(SubtitlePayload::from_text(&body))
    }
}
