/*!
 * Styled caption track rendering.
 *
 * Produces an Advanced SubStation Alpha document sized for a 1080x1920
 * portrait canvas. Each cue gets a base line with a blur-fade entrance and a
 * highlight line carrying per-word karaoke timing. With the overlay enabled,
 * a large keyword line is added behind the captions.
 */

use std::fmt::Write;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::CaptionError;
use crate::keyword::pick_keyword;
use crate::segmenter::Cue;
use crate::time_codec::to_advanced_timestamp;
use crate::transcript::WordToken;

/// Canvas width declared in the script header
pub const CANVAS_WIDTH: u32 = 1080;

/// Canvas height declared in the script header
pub const CANVAS_HEIGHT: u32 = 1920;

const BASE_STYLE: &str = "CapBase";
const HIGHLIGHT_STYLE: &str = "CapHi";
const OVERLAY_STYLE: &str = "BigOverlay";

const CAPTION_MARGIN_V: u32 = 140;
const OVERLAY_MARGIN_V: u32 = 900;

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
const EVENT_FORMAT: &str = "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

const BASE_TAGS: &str = r"{\an2\blur2\fad(120,80)\t(0,200,\blur0)}";
const KARAOKE_TAGS: &str = r"{\an2\blur0\bord3}";
const SHARPEN_TAGS: &str = r"{\an2\t(0,300,\bord4)}";

/// Line terminator every dialogue text carries
const LINE_BREAK: &str = r"\N";

/// Caption styling requested for one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSpec {
    /// Font family for both caption styles
    pub font_family: String,

    /// Font size in canvas pixels
    pub font_size: u32,

    /// Whether to add the keyword overlay line
    pub overlay: bool,
}

impl StyleSpec {
    pub fn new(font_family: impl Into<String>, font_size: u32, overlay: bool) -> Self {
        Self {
            font_family: font_family.into(),
            font_size,
            overlay,
        }
    }
}

/// A rendered ASS document
#[derive(Debug, Clone, PartialEq)]
pub struct StyledDocument {
    /// Full document text
    pub content: String,

    /// Number of `Dialogue:` lines in `content`
    pub dialogue_lines: usize,
}

/// Render cues into a styled document.
///
/// `words` is the full word list of the transcript; cues with no words inside
/// their window fall back to whole-line highlighting.
pub fn render_document(
    cues: &[Cue],
    words: &[WordToken],
    style: &StyleSpec,
) -> Result<StyledDocument, CaptionError> {
    if !is_valid_font_family(&style.font_family) {
        return Err(CaptionError::RenderingFailure(format!(
            "font family {:?} does not fit a style row",
            style.font_family
        )));
    }

    let mut out = String::new();
    let mut expected = 0usize;

    write_header(&mut out, style);

    for cue in cues {
        let start = to_advanced_timestamp(cue.start);
        let end = to_advanced_timestamp(cue.end);
        let text = flatten(&cue.text);

        dialogue(&mut out, 0, &start, &end, BASE_STYLE, CAPTION_MARGIN_V, &format!("{}{}", BASE_TAGS, text));

        let in_window = cue.words_within(words);
        let highlight = if in_window.is_empty() {
            debug!("No word timing for cue at {}, highlighting whole line", start);
            format!("{}{}", SHARPEN_TAGS, text)
        } else {
            format!("{}{}", KARAOKE_TAGS, karaoke_segments(&in_window))
        };
        dialogue(&mut out, 1, &start, &end, HIGHLIGHT_STYLE, CAPTION_MARGIN_V, &highlight);
        expected += 2;

        if style.overlay {
            let keyword = pick_keyword(&cue.text);
            if !keyword.is_empty() {
                dialogue(&mut out, -1, &start, &end, OVERLAY_STYLE, OVERLAY_MARGIN_V, &keyword.to_uppercase());
                expected += 1;
            }
        }
    }

    let dialogue_lines = out.lines().filter(|l| l.starts_with("Dialogue:")).count();
    if dialogue_lines != expected {
        return Err(CaptionError::RenderingFailure(format!(
            "expected {} dialogue lines, rendered {}",
            expected, dialogue_lines
        )));
    }

    info!("ASS cues: {}", dialogue_lines);

    Ok(StyledDocument {
        content: out,
        dialogue_lines,
    })
}

/// Karaoke duration in centiseconds, never zero
pub fn karaoke_centiseconds(word: &WordToken) -> u64 {
    let cs = ((word.end - word.start) * 100.0).round();
    if cs.is_finite() && cs >= 1.0 { cs as u64 } else { 1 }
}

/// Whether a font family can sit in one column of a `Style:` row
pub fn is_valid_font_family(font_family: &str) -> bool {
    !font_family.trim().is_empty() && !font_family.contains([',', '\r', '\n'])
}

/// Replace override-block delimiters so text cannot open or close a tag
pub fn escape_tag_delimiters(text: &str) -> String {
    text.replace('{', "(").replace('}', ")")
}

fn karaoke_segments(words: &[&WordToken]) -> String {
    words
        .iter()
        .map(|w| format!(r"{{\k{}}}{}", karaoke_centiseconds(w), flatten(&w.text)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn flatten(text: &str) -> String {
    escape_tag_delimiters(&text.replace(['\r', '\n'], " "))
}

fn write_header(out: &mut String, style: &StyleSpec) {
    // Writing to a String cannot fail
    let _ = writeln!(out, "[Script Info]");
    let _ = writeln!(out, "ScriptType: v4.00+");
    let _ = writeln!(out, "PlayResX: {}", CANVAS_WIDTH);
    let _ = writeln!(out, "PlayResY: {}", CANVAS_HEIGHT);
    let _ = writeln!(out, "ScaledBorderAndShadow: yes");
    let _ = writeln!(out);

    let _ = writeln!(out, "[V4+ Styles]");
    let _ = writeln!(out, "{}", STYLE_FORMAT);
    let _ = writeln!(
        out,
        "Style: {},{},{},&H00FFFFFF,&H0026E6FF,&H00202020,&H00000000,-1,0,0,0,100,100,0,0,3,5,0,2,60,60,{},1",
        BASE_STYLE, style.font_family, style.font_size, CAPTION_MARGIN_V
    );
    let _ = writeln!(
        out,
        "Style: {},{},{},&H00FFFFFF,&H0026E6FF,&H00101010,&H00000000,-1,0,0,0,100,100,0,0,1,0,0,2,60,60,{},1",
        HIGHLIGHT_STYLE, style.font_family, style.font_size, CAPTION_MARGIN_V
    );
    if style.overlay {
        let _ = writeln!(
            out,
            "Style: {},Impact,220,&H55FFFFFF,&H000000FF,&H00000000,&H00000000,-1,0,0,0,100,100,0,0,1,0,0,5,30,30,{},1",
            OVERLAY_STYLE, OVERLAY_MARGIN_V
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "[Events]");
    let _ = writeln!(out, "{}", EVENT_FORMAT);
}

fn dialogue(out: &mut String, layer: i32, start: &str, end: &str, style: &str, margin_v: u32, text: &str) {
    let _ = writeln!(
        out,
        "Dialogue: {},{},{},{},,0,0,{},,{}{}",
        layer, start, end, style, margin_v, text, LINE_BREAK
    );
}
