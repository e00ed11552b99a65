/*!
 * ASR provider clients.
 *
 * - Deepgram: word-timed JSON for the styled path, and a JSON payload for
 *   the plain fallback path
 * - OpenAI: Whisper transcription returned directly as SRT
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::errors::ProviderError;
use crate::sanitizer::SubtitlePayload;
use crate::transcript::AsrResponse;

pub mod deepgram;
pub mod openai;

/// Media handed to a provider
#[derive(Debug, Clone)]
pub struct MediaInput {
    /// Local path the bytes were read from
    pub path: PathBuf,
    /// Raw file contents
    pub bytes: Bytes,
    /// MIME type sent with the upload
    pub content_type: String,
}

impl MediaInput {
    /// Read a local media file
    pub async fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(path, bytes))
    }

    /// Wrap bytes already in memory
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: impl Into<Bytes>) -> Self {
        let path = path.into();
        let content_type = crate::file_utils::media_content_type(&path).to_string();
        Self {
            path,
            bytes: bytes.into(),
            content_type,
        }
    }

    /// File name used for multipart uploads
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "media.mp4".to_string())
    }
}

/// Provider returning word-timed ASR results for the styled path
#[async_trait]
pub trait TranscriptionProvider: Send + Sync + Debug {
    /// Display name used in logs and errors
    fn name(&self) -> &str;

    /// Transcribe media into a structured ASR response
    async fn transcribe(&self, media: &MediaInput) -> Result<AsrResponse, ProviderError>;
}

/// Provider returning any subtitle payload for the plain fallback path
#[async_trait]
pub trait SubtitleProvider: Send + Sync + Debug {
    /// Display name used in logs and errors
    fn name(&self) -> &str;

    /// Transcribe media into a subtitle payload of any recognized shape
    async fn transcribe_subtitles(&self, media: &MediaInput) -> Result<SubtitlePayload, ProviderError>;
}

/// Map a reqwest failure to a transport error
pub(crate) fn transport_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Transport(format!("{} request timed out: {}", provider, error))
    } else {
        ProviderError::Transport(format!("Failed to send request to {}: {}", provider, error))
    }
}
