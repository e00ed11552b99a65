// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use capforge::app_config::{self, read_env_file, Config};
use capforge::file_utils::{FileManager, CAPTIONED_VIDEO_SUFFIX};
use capforge::pipeline::{compile_styled, CaptionPipeline};
use capforge::providers::MediaInput;
use capforge::sanitizer::sanitize_bytes;
use capforge::storage::{JsonFileJobQueue, LocalObjectStore};
use capforge::transcoder::FfmpegTranscoder;
use capforge::transcript::AsrResponse;
use capforge::worker::{Transcoder, Worker};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
struct StyleArgs {
    /// Font family for the captions (defaults to the configured font)
    #[arg(long)]
    font: Option<String>,

    /// Show the keyword overlay above the captions
    #[arg(long)]
    overlay: bool,
}

impl StyleArgs {
    fn overlay(&self) -> Option<bool> {
        self.overlay.then_some(true)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render an ASR JSON response into an ASS caption document
    Render {
        /// ASR response JSON file
        #[arg(value_name = "ASR_JSON")]
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Convert an SRT, WebVTT or ASR JSON payload into canonical SRT
    Sanitize {
        /// Subtitle payload file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Transcribe a local video and burn captions into it
    Caption {
        /// Video file to caption
        #[arg(value_name = "VIDEO")]
        input: PathBuf,

        /// Output video (defaults to <stem>-captioned.mp4 next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the caption file next to the input and skip the burn
        #[arg(long)]
        captions_only: bool,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Add a job for a stored video to the local queue
    Enqueue {
        /// Storage key of the video, relative to the store root
        #[arg(value_name = "SOURCE_KEY")]
        source_key: String,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Process queued jobs
    Work {
        /// Stop once the queue is empty
        #[arg(long)]
        once: bool,
    },

    /// Generate shell completions for capforge
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// capforge - burned-in captions for short-form video
#[derive(Parser, Debug)]
#[command(name = "capforge")]
#[command(version = "0.1.0")]
#[command(about = "Caption compiler: ASR transcript in, styled captions out")]
#[command(long_about = "capforge transcribes a video, segments the transcript into short cues and
burns karaoke-style captions into a 1080x1920 video. When the primary ASR
provider runs out of quota it falls back to plain SRT captions.

EXAMPLES:
    capforge render response.json -o captions.ass   # Render a saved Deepgram response
    capforge sanitize whisper.vtt -o captions.srt   # Normalize any subtitle payload
    capforge caption clip.mp4 --overlay             # Caption a local video
    capforge enqueue user/clip.mp4                  # Queue a stored video
    capforge work                                   # Run the job worker
    capforge completions bash > capforge.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file doesn't
    exist, a default one will be created automatically. DEEPGRAM_API_KEY,
    OPENAI_API_KEY, DEFAULT_FONT and POLL_SECONDS override it and may also be
    set in a .env file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Environment file with provider credentials
    #[arg(long, default_value = ".env", global = true)]
    env_file: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation; the level lives in `log::max_level`
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // The level is updated after loading the config
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "capforge", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Render { input, output, style } => run_render(&config, &input, output.as_deref(), &style),
        Commands::Sanitize { input, output } => run_sanitize(&input, output.as_deref()),
        Commands::Caption { input, output, captions_only, style } => {
            run_caption(&config, &input, output, captions_only, &style).await
        }
        Commands::Enqueue { source_key, style } => run_enqueue(&config, &source_key, &style).await,
        Commands::Work { once } => run_worker(&config, once).await,
        Commands::Completions { .. } => Ok(()),
    }
}

/// Load or create the config file, then apply environment overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &cli.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config_path = &cli.config_path;
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config.save(config_path)?;
        config
    };

    // Process environment wins over the env file
    let env_file = read_env_file(&cli.env_file)?;
    config.apply_env(|key| std::env::var(key).ok().or_else(|| env_file.get(key).cloned()))?;

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    Ok(config)
}

fn run_render(config: &Config, input: &Path, output: Option<&Path>, style: &StyleArgs) -> Result<()> {
    let body = FileManager::read_to_string(input)?;
    let response = AsrResponse::from_json(&body)
        .with_context(|| format!("Failed to parse ASR response: {}", input.display()))?;
    let style = config.style.resolve(style.font.as_deref(), style.overlay());

    let document = compile_styled(&response, &style)?;
    write_output(output, &document.content)
}

fn run_sanitize(input: &Path, output: Option<&Path>) -> Result<()> {
    let raw = FileManager::read_bytes(input)?;
    let srt = sanitize_bytes(&raw)?;
    info!("Sanitized {} cues from {}", srt.len(), input.display());
    write_output(output, &srt.to_string())
}

async fn run_caption(
    config: &Config,
    input: &Path,
    output: Option<PathBuf>,
    captions_only: bool,
    style: &StyleArgs,
) -> Result<()> {
    if !FileManager::file_exists(input) {
        return Err(anyhow!("Input file does not exist: {}", input.display()));
    }

    let pipeline = CaptionPipeline::from_config(&config.transcription);
    if !pipeline.has_secondary() {
        info!("No secondary provider configured, plain-caption fallback is off");
    }

    let media = MediaInput::from_path(input).await?;
    let style = config.style.resolve(style.font.as_deref(), style.overlay());
    let track = pipeline.compile(&media, &style).await?;

    let captions_path = FileManager::sibling_path(input, &format!("-captions.{}", track.extension()));
    FileManager::write_to_file(&captions_path, &track.content())?;
    info!("Wrote captions to {}", captions_path.display());

    if captions_only {
        return Ok(());
    }

    let output = output.unwrap_or_else(|| FileManager::sibling_path(input, CAPTIONED_VIDEO_SUFFIX));
    let transcoder = FfmpegTranscoder::new(config.transcode.clone(), &config.style);

    let spinner = ProgressBar::new_spinner();
    let template_result = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(template_result);
    spinner.set_message(format!("Burning captions into {}", output.display()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = transcoder.burn_subtitles(input, &captions_path, &output, &style).await;
    spinner.finish_and_clear();
    result?;

    info!("Wrote captioned video to {}", output.display());
    Ok(())
}

async fn run_enqueue(config: &Config, source_key: &str, style: &StyleArgs) -> Result<()> {
    let queue = JsonFileJobQueue::new(&config.worker.queue_path);
    let job = queue.enqueue(source_key, style.font.clone(), style.overlay()).await?;
    info!("Queued job {} for {}", job.id, source_key);
    println!("{}", job.id);
    Ok(())
}

async fn run_worker(config: &Config, once: bool) -> Result<()> {
    let pipeline = CaptionPipeline::from_config(&config.transcription);
    if !pipeline.has_secondary() {
        warn!("No secondary provider available, quota failures will fail jobs");
    }

    let worker = Worker::new(
        Box::new(JsonFileJobQueue::new(&config.worker.queue_path)),
        Box::new(LocalObjectStore::new(&config.worker.store_root)),
        Box::new(FfmpegTranscoder::new(config.transcode.clone(), &config.style)),
        pipeline,
        config,
    );

    tokio::select! {
        result = worker.run(once) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping worker");
            Ok(())
        }
    }
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            FileManager::write_to_file(path, content)?;
            info!("Wrote {}", path.display());
            Ok(())
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout.write_all(content.as_bytes()).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to flush stdout")
        }
    }
}
