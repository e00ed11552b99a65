use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use tokio::process::Command;

use crate::app_config::{StyleConfig, TranscodeConfig};
use crate::errors::CaptionError;
use crate::renderer::StyleSpec;
use crate::worker::Transcoder;

// @module: FFmpeg burn-in of caption files

/// Scale to 1920 high and crop the center to a 1080x1920 portrait frame
const PORTRAIT_FILTER: &str = "scale=-2:1920,crop=1080:1920";

/// FFmpeg-backed transcoder
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    config: TranscodeConfig,
    plain_font_size: u32,
}

impl FfmpegTranscoder {
    pub fn new(config: TranscodeConfig, style: &StyleConfig) -> Self {
        Self {
            config,
            plain_font_size: style.plain_font_size,
        }
    }

    /// Video filter graph for a subtitle file.
    ///
    /// ASS documents carry their own styles; SRT gets a boxed white style
    /// in the job's font forced on.
    pub fn filter_graph(&self, subtitles: &Path, style: &StyleSpec) -> String {
        let path = escape_filter_value(&subtitles.to_string_lossy());
        if is_styled_document(subtitles) {
            format!("{},ass={}", PORTRAIT_FILTER, path)
        } else {
            let force_style = format!(
                "Fontname={},Fontsize={},PrimaryColour=&H00FFFFFF&,OutlineColour=&H00202020&,BorderStyle=3,Outline=4,Shadow=0,MarginV=120",
                style.font_family, self.plain_font_size
            );
            format!(
                "{},subtitles={}:charenc=UTF-8:force_style='{}'",
                PORTRAIT_FILTER, path, force_style
            )
        }
    }

    /// Full ffmpeg argument list
    pub fn build_args(&self, input: &Path, subtitles: &Path, output: &Path, style: &StyleSpec) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-vf".to_string(),
            self.filter_graph(subtitles, style),
            "-c:v".to_string(),
            "h264".to_string(),
            "-preset".to_string(),
            self.config.preset.clone(),
            "-crf".to_string(),
            self.config.crf.to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            self.config.audio_bitrate.clone(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Keep only the lines of ffmpeg's stderr that say what went wrong
    pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
        let noise_prefixes = [
            "ffmpeg version",
            "built with",
            "configuration:",
            "lib",
            "Input #",
            "Metadata:",
            "Duration:",
            "Chapter",
            "Stream #",
            "encoder",
            "handler_name",
            "major_brand",
            "minor_version",
            "compatible_brands",
            "creation_time",
            "Output #",
            "Stream mapping:",
            "Press [q]",
            "frame=",
        ];

        let meaningful: Vec<&str> = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
            .collect();

        if meaningful.is_empty() {
            "unknown ffmpeg error (stderr was empty after filtering)".to_string()
        } else {
            meaningful.join("\n")
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn burn_subtitles(
        &self,
        input: &Path,
        subtitles: &Path,
        output: &Path,
        style: &StyleSpec,
    ) -> Result<(), CaptionError> {
        if !input.exists() {
            return Err(CaptionError::TranscodeFailure(format!("Video file does not exist: {:?}", input)));
        }

        let args = self.build_args(input, subtitles, output, style);
        debug!("{} {}", self.config.ffmpeg_path, args.join(" "));
        info!("Burning {} onto {}", subtitles.display(), input.display());

        let ffmpeg_future = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .kill_on_drop(true)
            .output();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = tokio::select! {
            result = ffmpeg_future => {
                result.map_err(|e| CaptionError::TranscodeFailure(format!("Failed to execute ffmpeg: {}", e)))?
            },
            _ = tokio::time::sleep(timeout_duration) => {
                return Err(CaptionError::TranscodeFailure(format!(
                    "ffmpeg timed out after {} seconds",
                    self.config.timeout_secs
                )));
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let filtered = Self::filter_ffmpeg_stderr(&stderr);
            error!("Burn-in failed: {}", filtered);
            return Err(CaptionError::TranscodeFailure(filtered));
        }

        Ok(())
    }
}

fn is_styled_document(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("ass"))
        .unwrap_or(false)
}

/// Escape the characters that end a value inside an ffmpeg filter graph
fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | ':' | ',' | ';' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
