use log::debug;

use crate::errors::CaptionError;
use crate::transcript::{AsrAlternative, AsrShape, WordToken};

// @module: Grouping of ASR output into display cues

/// Gap between two words that always starts a new cue
pub const MAX_GAP_SECS: f64 = 0.6;

/// Longest span a multi-word cue may cover
pub const MAX_CUE_SECS: f64 = 3.0;

/// Most words a single cue may hold
pub const MAX_WORDS_PER_CUE: usize = 12;

/// Shortest cue built from a bare transcript
pub const TRANSCRIPT_MIN_SECS: f64 = 2.0;

/// Reading time per word for a bare transcript
pub const TRANSCRIPT_SECS_PER_WORD: f64 = 0.3;

/// Slack on both ends of a cue when deciding which words belong to it
pub const WORD_WINDOW_TOLERANCE_SECS: f64 = 0.02;

// @struct: One timed caption unit
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    // @field: Start in seconds
    pub start: f64,

    // @field: End in seconds, never before start
    pub end: f64,

    // @field: Display text, non-empty
    pub text: String,
}

impl Cue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end: end.max(start),
            text: text.into(),
        }
    }

    /// Words from `all_words` that sit inside this cue's window.
    ///
    /// Computed from the full word list, not from the tokens that built the
    /// cue, so sentence cues and word-group cues highlight the same way.
    pub fn words_within<'a>(&self, all_words: &'a [WordToken]) -> Vec<&'a WordToken> {
        all_words
            .iter()
            .filter(|w| {
                w.start >= self.start - WORD_WINDOW_TOLERANCE_SECS
                    && w.end <= self.end + WORD_WINDOW_TOLERANCE_SECS
            })
            .collect()
    }
}

/// Build cues from one ASR alternative.
///
/// Fails with `NoAlternatives` only when the alternative has none of the
/// recognized shapes. Empty input yields an empty list.
pub fn segment(alternative: &AsrAlternative) -> Result<Vec<Cue>, CaptionError> {
    let cues = match alternative.shape()? {
        AsrShape::Sentences(sentences) => {
            debug!("Segmenting {} sentences", sentences.len());
            sentences
                .into_iter()
                .map(|s| Cue::new(s.start, s.end, s.text))
                .collect()
        }
        AsrShape::Words(words) => {
            debug!("Segmenting {} words", words.len());
            group_words(&words)
        }
        AsrShape::Transcript(transcript) => transcript_cue(&transcript).into_iter().collect(),
    };

    Ok(cues)
}

/// Group word tokens into cues by gap, span and count
pub fn group_words(words: &[WordToken]) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut group: Vec<&WordToken> = Vec::with_capacity(MAX_WORDS_PER_CUE);

    for word in words {
        if let (Some(first), Some(last)) = (group.first(), group.last()) {
            let gap = word.start - last.end;
            let span = word.end - first.start;
            if gap > MAX_GAP_SECS || span > MAX_CUE_SECS || group.len() >= MAX_WORDS_PER_CUE {
                cues.push(flush_group(&group));
                group.clear();
            }
        }
        group.push(word);
    }

    if !group.is_empty() {
        cues.push(flush_group(&group));
    }

    cues
}

fn flush_group(group: &[&WordToken]) -> Cue {
    let text = group
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    // Callers never pass an empty group
    let start = group.first().map_or(0.0, |w| w.start);
    let end = group.last().map_or(start, |w| w.end);
    Cue::new(start, end, text)
}

fn transcript_cue(transcript: &str) -> Option<Cue> {
    let text = transcript.trim();
    if text.is_empty() {
        return None;
    }
    let word_count = text.split_whitespace().count() as f64;
    let duration = TRANSCRIPT_MIN_SECS.max(word_count * TRANSCRIPT_SECS_PER_WORD);
    Some(Cue::new(0.0, duration, text))
}
