use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::default::Default;
use std::path::Path;

use crate::renderer::{is_valid_font_family, StyleSpec};

/// Application configuration module
/// This module handles loading, validating and saving configuration settings.
/// Process-wide defaults (font, credentials, polling) live here and are
/// threaded explicitly into the compiler and the worker.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Caption styling defaults
    #[serde(default)]
    pub style: StyleConfig,

    /// ASR provider settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Job loop settings
    #[serde(default)]
    pub worker: WorkerConfig,

    /// FFmpeg burn-in settings
    #[serde(default)]
    pub transcode: TranscodeConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Default caption styling
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StyleConfig {
    /// Font family used when a job does not name one
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Font size of the styled captions
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Whether the keyword overlay is on by default
    #[serde(default)]
    pub overlay: bool,

    /// Font size forced onto plain SRT captions at burn time
    #[serde(default = "default_plain_font_size")]
    pub plain_font_size: u32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_size: default_font_size(),
            overlay: false,
            plain_font_size: default_plain_font_size(),
        }
    }
}

impl StyleConfig {
    /// Resolve a job's style, falling back to these defaults field by field.
    ///
    /// A requested font that cannot sit in a style row (commas, line breaks)
    /// is replaced by the default.
    pub fn resolve(&self, font_family: Option<&str>, overlay: Option<bool>) -> StyleSpec {
        let requested = font_family.map(str::trim).filter(|f| !f.is_empty());
        let font = match requested {
            Some(font) if is_valid_font_family(font) => font,
            Some(font) => {
                warn!("Ignoring unusable font family {:?}, using {}", font, self.font_family);
                &self.font_family
            }
            None => &self.font_family,
        };
        StyleSpec::new(font, self.font_size, overlay.unwrap_or(self.overlay))
    }
}

/// Secondary provider used by the plain-text fallback path
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecondaryProvider {
    // @provider: OpenAI Whisper, SRT output
    #[default]
    OpenAI,
    // @provider: Deepgram, JSON output sanitized to SRT
    Deepgram,
    // @provider: No fallback path
    None,
}

impl std::fmt::Display for SecondaryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::OpenAI => "openai",
            Self::Deepgram => "deepgram",
            Self::None => "none",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for SecondaryProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "deepgram" => Ok(Self::Deepgram),
            "none" => Ok(Self::None),
            _ => Err(anyhow!("Invalid secondary provider: {}", s)),
        }
    }
}

/// ASR provider configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TranscriptionConfig {
    /// Deepgram, used for the styled path
    #[serde(default)]
    pub deepgram: DeepgramConfig,

    /// OpenAI Whisper
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Provider for the plain-text fallback path
    #[serde(default)]
    pub secondary: SecondaryProvider,
}

impl TranscriptionConfig {
    /// Whether the configured secondary provider has what it needs to run
    pub fn secondary_available(&self) -> bool {
        match self.secondary {
            SecondaryProvider::OpenAI => !self.openai.api_key.is_empty(),
            SecondaryProvider::Deepgram => !self.deepgram.api_key.is_empty(),
            SecondaryProvider::None => false,
        }
    }
}

/// Deepgram service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeepgramConfig {
    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_deepgram_endpoint")]
    pub endpoint: String,

    /// Model name (e.g., "nova-2-general")
    #[serde(default = "default_deepgram_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_asr_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DeepgramConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_deepgram_endpoint(),
            model: default_deepgram_model(),
            timeout_secs: default_asr_timeout_secs(),
        }
    }
}

/// OpenAI service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIConfig {
    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL (optional, for Azure OpenAI or self-hosted)
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    /// Model name (e.g., "whisper-1")
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_asr_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_openai_endpoint(),
            model: default_openai_model(),
            timeout_secs: default_asr_timeout_secs(),
        }
    }
}

/// Job loop configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkerConfig {
    /// Seconds to sleep when the queue is empty or after an error
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,

    /// Root directory of the local object store
    #[serde(default = "default_store_root")]
    pub store_root: String,

    /// JSON file holding the job queue
    #[serde(default = "default_queue_path")]
    pub queue_path: String,

    /// Longest error message written to a job
    #[serde(default = "default_error_message_chars")]
    pub error_message_chars: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_seconds: default_poll_seconds(),
            store_root: default_store_root(),
            queue_path: default_queue_path(),
            error_message_chars: default_error_message_chars(),
        }
    }
}

/// FFmpeg configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscodeConfig {
    /// FFmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Kill the encode after this many seconds
    #[serde(default = "default_transcode_timeout_secs")]
    pub timeout_secs: u64,

    /// x264 constant rate factor
    #[serde(default = "default_crf")]
    pub crf: u32,

    /// x264 preset
    #[serde(default = "default_preset")]
    pub preset: String,

    /// AAC bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_transcode_timeout_secs(),
            crf: default_crf(),
            preset: default_preset(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_font_family() -> String {
    "Inter".to_string()
}

fn default_font_size() -> u32 {
    56
}

fn default_plain_font_size() -> u32 {
    64
}

fn default_deepgram_endpoint() -> String {
    "https://api.deepgram.com".to_string()
}

fn default_deepgram_model() -> String {
    "nova-2-general".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "whisper-1".to_string()
}

fn default_asr_timeout_secs() -> u64 {
    180
}

fn default_poll_seconds() -> u64 {
    2
}

fn default_store_root() -> String {
    "videos".to_string()
}

fn default_queue_path() -> String {
    "jobs.json".to_string()
}

fn default_error_message_chars() -> usize {
    250
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_transcode_timeout_secs() -> u64 {
    1800
}

fn default_crf() -> u32 {
    20
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

impl Config {
    /// Load a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save the config as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Apply overrides from environment variables.
    ///
    /// `lookup` returns the value of a variable; the binary passes the process
    /// environment merged with an optional `.env` file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = get("DEEPGRAM_API_KEY") {
            self.transcription.deepgram.api_key = key;
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.transcription.openai.api_key = key;
        }
        if let Some(font) = get("DEFAULT_FONT") {
            self.style.font_family = font;
        }
        if let Some(poll) = get("POLL_SECONDS") {
            self.worker.poll_seconds = poll
                .parse()
                .with_context(|| format!("POLL_SECONDS is not a number: {}", poll))?;
        }
        if let Some(root) = get("CAPFORGE_STORE_ROOT") {
            self.worker.store_root = root;
        }
        if let Some(secondary) = get("CAPFORGE_SECONDARY_PROVIDER") {
            self.transcription.secondary = secondary.parse()?;
        }

        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.style.font_family.trim().is_empty() {
            return Err(anyhow!("Default font family must not be empty"));
        }
        if !is_valid_font_family(&self.style.font_family) {
            return Err(anyhow!("Font family cannot contain commas or line breaks: {:?}", self.style.font_family));
        }
        if self.style.font_size == 0 || self.style.plain_font_size == 0 {
            return Err(anyhow!("Font sizes must be greater than zero"));
        }
        if self.worker.poll_seconds == 0 {
            return Err(anyhow!("Poll interval must be at least one second"));
        }
        if self.transcription.deepgram.timeout_secs == 0 || self.transcription.openai.timeout_secs == 0 {
            return Err(anyhow!("Provider timeouts must be greater than zero"));
        }

        Ok(())
    }
}

/// Read `KEY=VALUE` pairs from a dotenv-style file.
///
/// Comment lines and lines without `=` are ignored. A missing file yields an
/// empty map.
pub fn read_env_file<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>> {
    let path = path.as_ref();
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read env file: {}", path.display()))?;
    for line in content.trim_start_matches('\u{feff}').lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            vars.insert(key.trim().to_string(), value.to_string());
        }
    }

    Ok(vars)
}
