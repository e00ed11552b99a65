/*!
 * Error types for the capforge application.
 *
 * Provider clients report `ProviderError`, the caption compiler reports
 * `CaptionError`, and the job worker folds everything into `AppError` before
 * writing a terminal job status.
 */

use thiserror::Error;

/// Maximum number of characters of a provider error body kept in an error
pub const BODY_EXCERPT_CHARS: usize = 200;

/// Errors that can occur when talking to an ASR provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider has no API key configured
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// The provider answered with a non-success HTTP status
    #[error("{provider} error {status}: {body_excerpt}")]
    Http {
        /// Provider display name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Structured error code from the response body, when present
        code: Option<String>,
        /// First characters of the response body
        body_excerpt: String,
    },

    /// The request never produced a response (connection, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response could not be decoded
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Build an HTTP error from a status and a raw body, keeping a short excerpt
    pub fn http(provider: impl Into<String>, status: u16, body: &str) -> Self {
        Self::Http {
            provider: provider.into(),
            status,
            code: structured_error_code(body),
            body_excerpt: excerpt(body, BODY_EXCERPT_CHARS),
        }
    }
}

/// Errors that can occur while compiling a caption track
#[derive(Error, Debug)]
pub enum CaptionError {
    /// Error from the ASR provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The ASR response carries none of the recognized shapes
    #[error("No transcription alternatives returned")]
    NoAlternatives,

    /// The ASR response produced no cues at all
    #[error("Transcript contained no captions")]
    EmptyTranscript,

    /// A subtitle payload could not be normalized to SRT
    #[error("No valid SRT content after sanitization: {0}")]
    SanitizationFailure(String),

    /// The styled document broke one of its own invariants
    #[error("Caption rendering failed: {0}")]
    RenderingFailure(String),

    /// The external transcoder failed
    #[error("Transcode failed: {0}")]
    TranscodeFailure(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from the caption compiler
    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the object store
    #[error("Storage error: {0}")]
    Storage(String),

    /// Error from the job queue
    #[error("Queue error: {0}")]
    Queue(String),

    /// The job record cannot be processed as stored
    #[error("{0}")]
    InvalidJob(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        Self::Caption(CaptionError::Provider(error))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(format!("{:#}", error))
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

/// Truncate `text` to at most `max_chars` characters on a char boundary
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Pull `error.code` (OpenAI) or `err_code` (Deepgram) out of a JSON error body
fn structured_error_code(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["/error/code", "/error/type", "/err_code"]
        .iter()
        .find_map(|pointer| value.pointer(pointer).and_then(|code| code.as_str()))
        .map(|code| code.to_string())
}
