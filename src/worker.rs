/*!
 * Job worker.
 *
 * Pulls one queued job at a time, fetches its source video, compiles a
 * caption track, burns it in and uploads the results. The collaborators are
 * traits so the binary can run against local storage and tests can run
 * against in-memory fakes.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::app_config::{Config, StyleConfig};
use crate::errors::{excerpt, AppError, CaptionError};
use crate::fallback::FailureKind;
use crate::file_utils::{
    derived_key, FileManager, CAPTIONED_VIDEO_SUFFIX, PLAIN_CAPTIONS_SUFFIX, STYLED_CAPTIONS_SUFFIX,
};
use crate::pipeline::{CaptionPipeline, CaptionTrack};
use crate::providers::MediaInput;
use crate::renderer::StyleSpec;

/// Message stored on a job that failed because a provider ran out of quota
pub const QUOTA_EXCEEDED_MESSAGE: &str =
    "AI transcription quota exceeded. Add credits or configure a secondary provider.";

const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Lifecycle status of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Queued,
    Processing,
    Done,
    Error,
}

/// A captioning job as stored in the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,

    /// Storage key of the uploaded video
    #[serde(default)]
    pub source_path: Option<String>,

    #[serde(default)]
    pub status: JobStatus,

    /// Requested font family
    #[serde(default)]
    pub style_font: Option<String>,

    /// Whether the keyword overlay was requested
    #[serde(default)]
    pub style_overlay: Option<bool>,

    /// Storage key of the final artifact
    #[serde(default)]
    pub output_path: Option<String>,

    /// Human-readable failure message
    #[serde(default)]
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_path: Some(source_path.into()),
            status: JobStatus::Queued,
            style_font: None,
            style_overlay: None,
            output_path: None,
            error: None,
            created_at: Utc::now(),
        }
    }
}

/// Fields written with a status change
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub status: JobStatus,
    pub output_path: Option<String>,
    pub error: Option<String>,
}

impl JobUpdate {
    pub fn processing() -> Self {
        Self { status: JobStatus::Processing, output_path: None, error: None }
    }

    pub fn done(output_path: impl Into<String>) -> Self {
        Self { status: JobStatus::Done, output_path: Some(output_path.into()), error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { status: JobStatus::Error, output_path: None, error: Some(message.into()) }
    }
}

/// Source of queued jobs
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Oldest queued job, if any
    async fn next_queued(&self) -> Result<Option<Job>>;

    /// Write a status change to a job
    async fn update_status(&self, id: &str, update: JobUpdate) -> Result<()>;
}

/// Object storage addressed by key
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download `key` into `dest_dir`, returning the local path
    async fn fetch(&self, key: &str, dest_dir: &Path) -> Result<PathBuf>;

    /// Upload a local file under `key`, replacing any existing object
    async fn put(&self, key: &str, local_path: &Path, content_type: &str) -> Result<()>;
}

/// Burns a subtitle file onto a video
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// The filter is chosen from the subtitle file: `.ass` is rendered as a
    /// styled document, anything else as plain SRT in `style`'s font
    async fn burn_subtitles(
        &self,
        input: &Path,
        subtitles: &Path,
        output: &Path,
        style: &StyleSpec,
    ) -> Result<(), CaptionError>;
}

/// What a finished job produced
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    /// Key written as the job's output
    pub output_key: String,
    /// Key of the uploaded caption file
    pub captions_key: String,
    /// Whether the burned video was produced
    pub burned: bool,
    /// Whether the captions are the styled document
    pub styled: bool,
}

/// Processes jobs one at a time
pub struct Worker {
    queue: Box<dyn JobQueue>,
    store: Box<dyn ObjectStore>,
    transcoder: Box<dyn Transcoder>,
    pipeline: CaptionPipeline,
    style: StyleConfig,
    poll_interval: Duration,
    error_message_chars: usize,
}

impl Worker {
    pub fn new(
        queue: Box<dyn JobQueue>,
        store: Box<dyn ObjectStore>,
        transcoder: Box<dyn Transcoder>,
        pipeline: CaptionPipeline,
        config: &Config,
    ) -> Self {
        Self {
            queue,
            store,
            transcoder,
            pipeline,
            style: config.style.clone(),
            poll_interval: Duration::from_secs(config.worker.poll_seconds),
            error_message_chars: config.worker.error_message_chars,
        }
    }

    /// Poll the queue forever, or until it is empty when `once` is set
    pub async fn run(&self, once: bool) -> Result<()> {
        info!("Worker starting, poll interval {}s", self.poll_interval.as_secs());
        loop {
            match self.process_next().await {
                Ok(true) => continue,
                Ok(false) if once => {
                    info!("Queue is empty, stopping");
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => error!("Worker error: {:#}", e),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Process the next queued job; returns `false` when the queue is empty
    pub async fn process_next(&self) -> Result<bool> {
        let Some(job) = self.queue.next_queued().await? else {
            return Ok(false);
        };

        info!("Picked job {} | source_path={}", job.id, job.source_path.as_deref().unwrap_or("<none>"));

        match self.process_job(&job).await {
            Ok(outcome) => info!("Done {} -> {}", job.id, outcome.output_key),
            Err(e) => {
                let message = job_error_message(&e, self.error_message_chars);
                error!("Job {} failed: {}", job.id, e);
                if let Err(update_err) = self.queue.update_status(&job.id, JobUpdate::failed(message)).await {
                    warn!("Could not record failure of job {}: {:#}", job.id, update_err);
                }
            }
        }

        Ok(true)
    }

    /// Run one job end to end and record its final status
    pub async fn process_job(&self, job: &Job) -> Result<JobOutcome, AppError> {
        self.queue
            .update_status(&job.id, JobUpdate::processing())
            .await
            .map_err(|e| AppError::Queue(format!("{:#}", e)))?;

        let source = job
            .source_path
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::InvalidJob("missing source_path".to_string()))?;

        // Every intermediate file lives here and goes away with the job
        let scratch = TempDir::new()?;

        let local_video = self
            .store
            .fetch(source, scratch.path())
            .await
            .map_err(|e| AppError::Storage(format!("{:#}", e)))?;
        info!("   downloaded to {}", local_video.display());

        let media = MediaInput::from_path(&local_video).await?;
        let style = self.style.resolve(job.style_font.as_deref(), job.style_overlay);
        let track = self.pipeline.compile(&media, &style).await?;

        let captions_path = scratch.path().join(format!("captions.{}", track.extension()));
        FileManager::write_to_file(&captions_path, &track.content())?;
        let captions_key = derived_key(source, captions_suffix(&track));

        let captioned_path = scratch.path().join("captioned.mp4");
        let burned = match self
            .transcoder
            .burn_subtitles(&local_video, &captions_path, &captioned_path, &style)
            .await
        {
            Ok(()) => true,
            Err(burn_err) => {
                warn!("   burn failed, uploading captions instead: {}", burn_err);
                false
            }
        };

        let output_key = if burned {
            let video_key = derived_key(source, CAPTIONED_VIDEO_SUFFIX);
            self.upload(&video_key, &captioned_path, VIDEO_CONTENT_TYPE).await?;
            info!("   uploaded captioned video to {}", video_key);
            video_key
        } else {
            captions_key.clone()
        };

        self.upload(&captions_key, &captions_path, track.content_type()).await?;
        info!("   uploaded captions to {}", captions_key);

        self.queue
            .update_status(&job.id, JobUpdate::done(&output_key))
            .await
            .map_err(|e| AppError::Queue(format!("{:#}", e)))?;

        Ok(JobOutcome {
            output_key,
            captions_key,
            burned,
            styled: track.is_styled(),
        })
    }

    async fn upload(&self, key: &str, path: &Path, content_type: &str) -> Result<(), AppError> {
        self.store
            .put(key, path, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("{:#}", e)))
    }
}

fn captions_suffix(track: &CaptionTrack) -> &'static str {
    match track {
        CaptionTrack::Styled(_) => STYLED_CAPTIONS_SUFFIX,
        CaptionTrack::Plain(_) => PLAIN_CAPTIONS_SUFFIX,
    }
}

/// Message stored on a failed job, truncated to `max_chars`
pub fn job_error_message(error: &AppError, max_chars: usize) -> String {
    if let AppError::Caption(caption) = error {
        if FailureKind::classify(caption) == FailureKind::QuotaOrRateLimited {
            return excerpt(QUOTA_EXCEEDED_MESSAGE, max_chars);
        }
    }
    excerpt(&error.to_string(), max_chars)
}
