/*!
 * Subtitle payload normalization.
 *
 * Whatever the secondary path hands back (WebVTT with a header and cue
 * settings, a raw ASR JSON document, or SRT) is turned into canonical SRT:
 * sequential indices from 1, `HH:MM:SS,mmm --> HH:MM:SS,mmm` lines, text,
 * and a blank separator after every block.
 */

use log::{debug, info};

use crate::errors::CaptionError;
use crate::segmenter::segment;
use crate::subtitle_processor::{parse_timed_blocks, CanonicalSrt};
use crate::transcript::AsrResponse;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const WEBVTT_SIGNATURE: &str = "WEBVTT";
const WEBVTT_HEADER_KEYS: &[&str] = &["kind:", "language:"];

/// A subtitle payload of one of the recognized shapes
#[derive(Debug, Clone, PartialEq)]
pub enum SubtitlePayload {
    /// Plain SRT, possibly with stray whitespace or numbering
    Canonical(String),
    /// WebVTT with header metadata and cue settings
    Foreign(String),
    /// An ASR JSON document
    EmbeddedAsr(String),
}

impl SubtitlePayload {
    /// Classify raw bytes after BOM stripping and line-break normalization
    pub fn from_bytes(raw: &[u8]) -> Self {
        Self::from_text(&normalize(raw))
    }

    /// Classify already decoded text
    pub fn from_text(text: &str) -> Self {
        let text = normalize_line_breaks(text);
        if text.to_uppercase().starts_with(WEBVTT_SIGNATURE) {
            Self::Foreign(text)
        } else if text.starts_with('{') {
            Self::EmbeddedAsr(text)
        } else {
            Self::Canonical(text)
        }
    }

    /// Short name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Canonical(_) => "srt",
            Self::Foreign(_) => "webvtt",
            Self::EmbeddedAsr(_) => "asr-json",
        }
    }
}

/// Sanitize raw subtitle bytes into canonical SRT
pub fn sanitize_bytes(raw: &[u8]) -> Result<CanonicalSrt, CaptionError> {
    sanitize(SubtitlePayload::from_bytes(raw))
}

/// Sanitize a payload into canonical SRT.
///
/// Fails with `SanitizationFailure` when no cue survives. Running it on its
/// own rendered output returns the same document.
pub fn sanitize(payload: SubtitlePayload) -> Result<CanonicalSrt, CaptionError> {
    debug!("Sanitizing {} payload", payload.kind());

    let srt = match payload {
        SubtitlePayload::Foreign(text) => CanonicalSrt::from_entries(parse_timed_blocks(&strip_webvtt_header(&text))),
        SubtitlePayload::EmbeddedAsr(text) => from_asr_json(&text)?,
        SubtitlePayload::Canonical(text) => CanonicalSrt::from_entries(parse_timed_blocks(&text)),
    };

    if srt.is_empty() {
        return Err(CaptionError::SanitizationFailure(
            "no parsable cue blocks".to_string(),
        ));
    }

    info!("Sanitized subtitle payload into {} cues", srt.len());
    Ok(srt)
}

fn from_asr_json(text: &str) -> Result<CanonicalSrt, CaptionError> {
    let response = AsrResponse::from_json(text)
        .map_err(|e| CaptionError::SanitizationFailure(format!("invalid ASR JSON: {}", e)))?;

    let cues = response
        .first_alternative()
        .and_then(segment)
        .map_err(|e| CaptionError::SanitizationFailure(e.to_string()))?;

    Ok(CanonicalSrt::from_cues(&cues))
}

fn strip_webvtt_header(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim();
            let lower = trimmed.to_lowercase();
            !trimmed.to_uppercase().starts_with(WEBVTT_SIGNATURE)
                && !WEBVTT_HEADER_KEYS.iter().any(|key| lower.starts_with(key))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize(raw: &[u8]) -> String {
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    normalize_line_breaks(&String::from_utf8_lossy(raw))
}

fn normalize_line_breaks(text: &str) -> String {
    text.trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .to_string()
}
