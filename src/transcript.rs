/*!
 * ASR result model.
 *
 * The provider response is deserialized into loose `Option`-heavy structs and
 * then resolved into exactly one `AsrShape` in a fixed priority order:
 * sentences, then words, then the flat transcript.
 */

use serde::{Deserialize, Serialize};

use crate::errors::CaptionError;

/// Default length of a sentence whose end time is missing
const MISSING_END_SECS: f64 = 2.0;

/// Top-level ASR response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AsrResponse {
    #[serde(default)]
    pub results: Option<AsrResults>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AsrResults {
    #[serde(default)]
    pub channels: Vec<AsrChannel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AsrChannel {
    #[serde(default)]
    pub alternatives: Vec<AsrAlternative>,
}

/// One recognition hypothesis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AsrAlternative {
    /// Flat transcript text
    #[serde(default)]
    pub transcript: Option<String>,

    /// Word-level spans
    #[serde(default)]
    pub words: Option<Vec<RawWord>>,

    /// Paragraph and sentence structure
    #[serde(default)]
    pub paragraphs: Option<RawParagraphs>,
}

/// Word as reported by the provider, every field optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWord {
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
    #[serde(default)]
    pub word: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawParagraphs {
    #[serde(default)]
    pub paragraphs: Option<Vec<RawParagraph>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawParagraph {
    #[serde(default)]
    pub sentences: Vec<RawSentence>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSentence {
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A timed word with non-empty text
#[derive(Debug, Clone, PartialEq)]
pub struct WordToken {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl WordToken {
    /// Create a token, returning `None` when the trimmed text is empty
    pub fn new(start: f64, end: f64, text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            start,
            end,
            text: text.to_string(),
        })
    }
}

/// A sentence span with its timing resolved
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceSpan {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// The single granularity the segmenter works from
#[derive(Debug, Clone, PartialEq)]
pub enum AsrShape {
    /// Paragraph sentences, one cue each
    Sentences(Vec<SentenceSpan>),
    /// Flat words, grouped into cues
    Words(Vec<WordToken>),
    /// Only a transcript string
    Transcript(String),
}

impl AsrResponse {
    /// Parse a provider JSON body
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// First alternative of the first channel
    pub fn first_alternative(&self) -> Result<&AsrAlternative, CaptionError> {
        self.results
            .as_ref()
            .and_then(|results| results.channels.first())
            .and_then(|channel| channel.alternatives.first())
            .ok_or(CaptionError::NoAlternatives)
    }
}

impl AsrAlternative {
    /// Resolve the alternative into one shape, trying sentences, words, then transcript
    pub fn shape(&self) -> Result<AsrShape, CaptionError> {
        let paragraphs = self
            .paragraphs
            .as_ref()
            .and_then(|p| p.paragraphs.as_ref())
            .filter(|p| !p.is_empty());

        if let Some(paragraphs) = paragraphs {
            let sentences = paragraphs
                .iter()
                .flat_map(|p| p.sentences.iter())
                .filter_map(|s| {
                    let text = s.text.as_deref().unwrap_or_default().trim();
                    if text.is_empty() {
                        return None;
                    }
                    let start = s.start.unwrap_or(0.0);
                    let end = s.end.unwrap_or(start + MISSING_END_SECS);
                    Some(SentenceSpan {
                        start,
                        end,
                        text: text.to_string(),
                    })
                })
                .collect();
            return Ok(AsrShape::Sentences(sentences));
        }

        if self.words.as_ref().is_some_and(|w| !w.is_empty()) {
            return Ok(AsrShape::Words(self.word_tokens()));
        }

        match &self.transcript {
            Some(transcript) => Ok(AsrShape::Transcript(transcript.trim().to_string())),
            None => Err(CaptionError::NoAlternatives),
        }
    }

    /// Every usable word, in source order, for karaoke highlighting
    pub fn word_tokens(&self) -> Vec<WordToken> {
        self.words
            .iter()
            .flatten()
            .filter_map(|w| match (w.start, w.end, w.word.as_deref()) {
                (Some(start), Some(end), Some(text)) => WordToken::new(start, end, text),
                _ => None,
            })
            .collect()
    }
}
