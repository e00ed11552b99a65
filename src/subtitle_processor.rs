use std::fmt;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::segmenter::Cue;
use crate::time_codec::{format_srt_millis, parse_timestamp_millis, seconds_to_millis};

// @module: Plain timed-text entries and block parsing

// @const: Arrow line, timestamps in either SRT or WebVTT notation, cue settings ignored
static ARROW_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:\d+:)?\d{1,2}:\d{2}[,.]\d{1,3})\s*-->\s*((?:\d+:)?\d{1,2}:\d{2}[,.]\d{1,3})(?:\s.*)?$").unwrap()
});

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Sequence number
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text, one or more non-blank lines
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    /// Build an entry from a cue measured in seconds
    pub fn from_cue(seq_num: usize, cue: &Cue) -> Self {
        Self::new(
            seq_num,
            seconds_to_millis(cue.start),
            seconds_to_millis(cue.end),
            cue.text.clone(),
        )
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        format_srt_millis(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        format_srt_millis(self.end_time_ms)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Canonical SRT text together with the entries it was built from
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSrt {
    /// Entries numbered from 1
    pub entries: Vec<SubtitleEntry>,
}

impl CanonicalSrt {
    /// Renumber `entries` sequentially from 1
    pub fn from_entries(mut entries: Vec<SubtitleEntry>) -> Self {
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.seq_num = i + 1;
        }
        Self { entries }
    }

    /// Build from cues, skipping cues whose text is blank
    pub fn from_cues(cues: &[Cue]) -> Self {
        let entries = cues
            .iter()
            .filter(|cue| !cue.text.trim().is_empty())
            .map(|cue| {
                let mut entry = SubtitleEntry::from_cue(0, cue);
                entry.text = normalize_text(&entry.text);
                entry
            })
            .collect();
        Self::from_entries(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for CanonicalSrt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for entry in &self.entries {
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// Parse blank-line separated timed blocks.
///
/// Works for SRT and for WebVTT bodies whose header has already been
/// removed. Lines before the arrow line (indices, cue identifiers) are
/// discarded, cue settings after the end timestamp are dropped, and blocks
/// without an arrow or without text are skipped. Entries keep source order.
pub fn parse_timed_blocks(content: &str) -> Vec<SubtitleEntry> {
    let mut entries = Vec::new();

    for (block_idx, block) in split_blocks(content).into_iter().enumerate() {
        let Some(arrow_pos) = block.iter().position(|line| line.contains("-->")) else {
            debug!("Skipping block {} without timestamps", block_idx + 1);
            continue;
        };

        let Some((start_ms, end_ms)) = parse_arrow_line(block[arrow_pos]) else {
            warn!("Skipping block {} with unparsable timestamps: {}", block_idx + 1, block[arrow_pos]);
            continue;
        };

        if end_ms < start_ms {
            warn!("Skipping block {} ending before it starts", block_idx + 1);
            continue;
        }

        let text = block[arrow_pos + 1..]
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        if text.trim().is_empty() {
            warn!("Skipping empty subtitle block {}", block_idx + 1);
            continue;
        }

        entries.push(SubtitleEntry::new(entries.len() + 1, start_ms, end_ms, text));
    }

    entries
}

/// Parse an arrow line into start and end milliseconds
pub fn parse_arrow_line(line: &str) -> Option<(u64, u64)> {
    let caps = ARROW_LINE_REGEX.captures(line)?;
    let start = parse_timestamp_millis(caps.get(1)?.as_str())?;
    let end = parse_timestamp_millis(caps.get(2)?.as_str())?;
    Some((start, end))
}

fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Drop blank lines inside cue text so it cannot split a block
fn normalize_text(text: &str) -> String {
    // A bare `\r` would survive `lines()` and turn into a break on the next parse
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
