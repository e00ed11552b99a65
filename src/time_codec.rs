use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

// @module: Timestamp formatting for ASS and SRT documents

// @const: Loose timestamp regex, hours optional, comma or dot before the millis
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d{1,}):)?(\d{1,2}):(\d{2})[,.](\d{1,3})$").unwrap()
});

/// Format seconds as an ASS timestamp (`H:MM:SS.CC`, centisecond precision).
///
/// Hours are not padded and not wrapped at 24.
pub fn to_advanced_timestamp(seconds: f64) -> String {
    let cs = (checked_seconds(seconds) * 100.0).round() as u64;
    let h = cs / 360_000;
    let m = (cs % 360_000) / 6_000;
    let s = (cs % 6_000) / 100;
    let c = cs % 100;

    format!("{}:{:02}:{:02}.{:02}", h, m, s, c)
}

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`, millisecond precision)
pub fn to_srt_timestamp(seconds: f64) -> String {
    format_srt_millis(seconds_to_millis(seconds))
}

/// Round seconds to whole milliseconds
pub fn seconds_to_millis(seconds: f64) -> u64 {
    (checked_seconds(seconds) * 1000.0).round() as u64
}

/// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
pub fn format_srt_millis(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Parse an SRT or WebVTT timestamp into milliseconds.
///
/// Accepts `HH:MM:SS,mmm`, `HH:MM:SS.mmm` and the hour-less WebVTT form
/// `MM:SS.mmm`. Returns `None` for anything else.
pub fn parse_timestamp_millis(timestamp: &str) -> Option<u64> {
    let caps = TIMESTAMP_REGEX.captures(timestamp.trim())?;

    let hours: u64 = caps.get(1).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let minutes: u64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: u64 = caps.get(3)?.as_str().parse().ok()?;
    let fraction = caps.get(4)?.as_str();

    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    // "5" after the separator means 500ms, not 5ms
    let millis: u64 = format!("{:0<3}", fraction).parse().ok()?;

    Some(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
}

fn checked_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds >= 0.0 {
        seconds
    } else {
        warn!("Clamping invalid timestamp {} to zero", seconds);
        0.0
    }
}
