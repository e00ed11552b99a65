/*!
 * Caption pipeline: ASR result in, caption track out.
 *
 * The styled path transcribes with the primary provider, segments the
 * transcript and renders an ASS document. When it fails, the fallback policy
 * decides whether the plain path (secondary provider + sanitizer) runs.
 */

use log::{debug, info};

use crate::app_config::{SecondaryProvider, TranscriptionConfig};
use crate::errors::CaptionError;
use crate::fallback::{FallbackState, ProviderFallbackPolicy};
use crate::providers::deepgram::Deepgram;
use crate::providers::openai::OpenAI;
use crate::providers::{MediaInput, SubtitleProvider, TranscriptionProvider};
use crate::renderer::{render_document, StyleSpec, StyledDocument};
use crate::sanitizer::sanitize;
use crate::segmenter::segment;
use crate::subtitle_processor::CanonicalSrt;
use crate::transcript::AsrResponse;

/// Content type used when storing caption files
pub const CAPTION_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// The caption file handed to the transcoder
#[derive(Debug, Clone, PartialEq)]
pub enum CaptionTrack {
    /// ASS document with karaoke highlighting
    Styled(StyledDocument),
    /// Canonical SRT from the fallback path
    Plain(CanonicalSrt),
}

impl CaptionTrack {
    pub fn is_styled(&self) -> bool {
        matches!(self, Self::Styled(_))
    }

    /// File extension matching the document format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Styled(_) => "ass",
            Self::Plain(_) => "srt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        CAPTION_CONTENT_TYPE
    }

    /// Document text
    pub fn content(&self) -> String {
        match self {
            Self::Styled(doc) => doc.content.clone(),
            Self::Plain(srt) => srt.to_string(),
        }
    }
}

/// Compile an ASR response into a styled document.
///
/// Fails with `NoAlternatives` when the response has no usable shape and with
/// `EmptyTranscript` when it yields no cues.
pub fn compile_styled(response: &AsrResponse, style: &StyleSpec) -> Result<StyledDocument, CaptionError> {
    let alternative = response.first_alternative()?;
    let cues = segment(alternative)?;
    if cues.is_empty() {
        return Err(CaptionError::EmptyTranscript);
    }

    let words = alternative.word_tokens();
    debug!("Rendering {} cues with {} timed words", cues.len(), words.len());
    render_document(&cues, &words, style)
}

/// Primary and secondary providers for one worker
#[derive(Debug)]
pub struct CaptionPipeline {
    primary: Box<dyn TranscriptionProvider>,
    secondary: Option<Box<dyn SubtitleProvider>>,
}

impl CaptionPipeline {
    pub fn new(primary: Box<dyn TranscriptionProvider>, secondary: Option<Box<dyn SubtitleProvider>>) -> Self {
        Self { primary, secondary }
    }

    /// Build providers from configuration; the secondary is left out when
    /// it has no credentials
    pub fn from_config(config: &TranscriptionConfig) -> Self {
        let primary = Box::new(Deepgram::from_config(&config.deepgram));
        let secondary: Option<Box<dyn SubtitleProvider>> = if !config.secondary_available() {
            None
        } else {
            match config.secondary {
                SecondaryProvider::OpenAI => Some(Box::new(OpenAI::from_config(&config.openai))),
                SecondaryProvider::Deepgram => Some(Box::new(Deepgram::from_config(&config.deepgram))),
                SecondaryProvider::None => None,
            }
        };
        Self::new(primary, secondary)
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Produce a caption track for `media`, one attempt per path
    pub async fn compile(&self, media: &MediaInput, style: &StyleSpec) -> Result<CaptionTrack, CaptionError> {
        let mut policy = ProviderFallbackPolicy::new(self.secondary.is_some());

        let error = match self.compile_primary(media, style).await {
            Ok(document) => return Ok(CaptionTrack::Styled(document)),
            Err(error) => error,
        };

        let (FallbackState::Secondary, Some(secondary)) = (policy.on_failure(&error), self.secondary.as_ref()) else {
            return Err(error);
        };

        match self.compile_secondary(secondary.as_ref(), media).await {
            Ok(srt) => Ok(CaptionTrack::Plain(srt)),
            Err(secondary_error) => {
                policy.on_failure(&secondary_error);
                Err(secondary_error)
            }
        }
    }

    async fn compile_primary(&self, media: &MediaInput, style: &StyleSpec) -> Result<StyledDocument, CaptionError> {
        info!("Transcribing {} with {}", media.path.display(), self.primary.name());
        let response = self.primary.transcribe(media).await?;
        compile_styled(&response, style)
    }

    async fn compile_secondary(&self, secondary: &dyn SubtitleProvider, media: &MediaInput) -> Result<CanonicalSrt, CaptionError> {
        info!("Transcribing {} with {} (plain captions)", media.path.display(), secondary.name());
        let payload = secondary.transcribe_subtitles(media).await?;
        sanitize(payload)
    }
}
