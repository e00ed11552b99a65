/*!
 * Local implementations of the worker's storage collaborators.
 *
 * `LocalObjectStore` maps keys to files under a root directory and
 * `JsonFileJobQueue` keeps the job table in a single JSON file. Both are
 * enough to run the worker on one machine.
 */

use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use tokio::sync::Mutex;

use crate::file_utils::FileManager;
use crate::worker::{Job, JobQueue, JobStatus, JobUpdate, ObjectStore};

/// Object store backed by a directory
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// Location of `key` under the root; keys may not escape the root
    pub fn object_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.trim().is_empty() || escapes {
            return Err(anyhow!("Invalid storage key: {}", key));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn fetch(&self, key: &str, dest_dir: &Path) -> Result<PathBuf> {
        let source = self.object_path(key)?;
        if !FileManager::file_exists(&source) {
            return Err(anyhow!("Object not found: {}", key));
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| anyhow!("Storage key has no file name: {}", key))?;
        let dest = dest_dir.join(file_name);
        FileManager::copy_file(&source, &dest)?;
        debug!("Fetched {} -> {}", key, dest.display());
        Ok(dest)
    }

    async fn put(&self, key: &str, local_path: &Path, content_type: &str) -> Result<()> {
        let dest = self.object_path(key)?;
        FileManager::copy_file(local_path, &dest)?;
        debug!("Stored {} ({})", key, content_type);
        Ok(())
    }
}

/// Job queue persisted as a JSON array of jobs
#[derive(Debug)]
pub struct JsonFileJobQueue {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl JsonFileJobQueue {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// All jobs; a missing file is an empty queue
    pub fn load(&self) -> Result<Vec<Job>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = FileManager::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse job queue: {}", self.path.display()))
    }

    fn save(&self, jobs: &[Job]) -> Result<()> {
        let json = serde_json::to_string_pretty(jobs).context("Failed to serialize job queue")?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        FileManager::ensure_dir(&dir)?;

        // Write beside the target and rename so readers never see a partial file
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        std::io::Write::write_all(&mut tmp, json.as_bytes()).context("Failed to write job queue")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace job queue: {}", self.path.display()))?;
        Ok(())
    }

    /// Add a queued job for `source_path` and return it
    pub async fn enqueue(&self, source_path: &str, style_font: Option<String>, style_overlay: Option<bool>) -> Result<Job> {
        let _guard = self.lock.lock().await;
        let mut jobs = self.load()?;

        let mut job = Job::new(uuid::Uuid::new_v4().to_string(), source_path);
        job.style_font = style_font;
        job.style_overlay = style_overlay;
        job.created_at = Utc::now();

        jobs.push(job.clone());
        self.save(&jobs)?;
        Ok(job)
    }
}

#[async_trait]
impl JobQueue for JsonFileJobQueue {
    async fn next_queued(&self) -> Result<Option<Job>> {
        let _guard = self.lock.lock().await;
        let jobs = self.load()?;
        Ok(jobs
            .into_iter()
            .filter(|job| job.status == JobStatus::Queued)
            .min_by_key(|job| job.created_at))
    }

    async fn update_status(&self, id: &str, update: JobUpdate) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut jobs = self.load()?;
        let job = jobs
            .iter_mut()
            .find(|job| job.id == id)
            .ok_or_else(|| anyhow!("Job not found: {}", id))?;

        job.status = update.status;
        job.error = update.error;
        if update.output_path.is_some() {
            job.output_path = update.output_path;
        }

        self.save(&jobs)
    }
}
