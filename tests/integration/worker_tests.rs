/*!
 * Integration tests for the job worker against in-memory collaborators
 */

use capforge::app_config::Config;
use capforge::errors::{AppError, CaptionError, ProviderError};
use capforge::pipeline::{CaptionPipeline, CAPTION_CONTENT_TYPE};
use capforge::worker::{job_error_message, Job, JobStatus, Worker, QUOTA_EXCEEDED_MESSAGE};

use crate::common;
use crate::common::mock_providers::{
    InMemoryJobQueue, InMemoryObjectStore, MockErrorType, MockSubtitleProvider, MockTranscoder,
    MockTranscriptionProvider,
};

const SOURCE_KEY: &str = "user-1/clip.mp4";
const WHISPER_SRT: &str = "1\n00:00:00,000 --> 00:00:02,000\nPlain fallback\n";

struct Harness {
    queue: InMemoryJobQueue,
    store: InMemoryObjectStore,
    transcoder: MockTranscoder,
    worker: Worker,
}

fn harness(jobs: Vec<Job>, pipeline: CaptionPipeline, transcoder: MockTranscoder) -> Harness {
    let queue = InMemoryJobQueue::with_jobs(jobs);
    let store = InMemoryObjectStore::default();
    store.insert(SOURCE_KEY, b"fake mp4 bytes", "video/mp4");

    let worker = Worker::new(
        Box::new(queue.clone()),
        Box::new(store.clone()),
        Box::new(transcoder.clone()),
        pipeline,
        &Config::default(),
    );

    Harness { queue, store, transcoder, worker }
}

fn styled_pipeline() -> CaptionPipeline {
    CaptionPipeline::new(
        Box::new(MockTranscriptionProvider::responding(common::TWO_SENTENCE_ASR_JSON)),
        None,
    )
}

#[test]
fn test_processNext_withHealthyJob_shouldUploadVideoAndCaptions() {
    let h = harness(vec![Job::new("job-1", SOURCE_KEY)], styled_pipeline(), MockTranscoder::default());

    let processed = tokio_test::block_on(h.worker.process_next()).unwrap();
    assert!(processed);

    let job = h.queue.job("job-1").unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.output_path.as_deref(), Some("user-1/clip-captioned.mp4"));
    assert_eq!(job.error, None);
    assert_eq!(h.queue.statuses("job-1"), vec![JobStatus::Processing, JobStatus::Done]);

    let (video, video_type) = h.store.get("user-1/clip-captioned.mp4").unwrap();
    assert_eq!(video_type, "video/mp4");
    assert!(String::from_utf8_lossy(&video).starts_with("burned video with:\n[Script Info]"));

    let (_, captions_type) = h.store.get("user-1/clip-captions.ass").unwrap();
    assert_eq!(captions_type, CAPTION_CONTENT_TYPE);

    let burned = h.transcoder.burned.lock().unwrap();
    assert_eq!(burned.len(), 1);
    assert_eq!(burned[0].extension().and_then(|e| e.to_str()), Some("ass"));
}

#[test]
fn test_processJob_withJobStyle_shouldRenderRequestedFontAndOverlay() {
    let mut job = Job::new("job-style", SOURCE_KEY);
    job.style_font = Some("Bebas Neue".to_string());
    job.style_overlay = Some(true);
    let h = harness(vec![job.clone()], styled_pipeline(), MockTranscoder::default());

    let outcome = tokio_test::block_on(h.worker.process_job(&job)).unwrap();
    assert!(outcome.styled);
    assert!(outcome.burned);

    let captions = h.store.get_text(&outcome.captions_key).unwrap();
    assert!(captions.contains("Style: CapBase,Bebas Neue,56,"));
    assert!(captions.contains("BigOverlay,,0,0,900,,HELLO"));
}

#[test]
fn test_processNext_withBurnFailure_shouldFinishWithCaptionsOnly() {
    let h = harness(vec![Job::new("job-2", SOURCE_KEY)], styled_pipeline(), MockTranscoder::failing());

    tokio_test::block_on(h.worker.process_next()).unwrap();

    let job = h.queue.job("job-2").unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.output_path.as_deref(), Some("user-1/clip-captions.ass"));
    assert!(h.store.get("user-1/clip-captioned.mp4").is_none());
    assert!(h.store.get_text("user-1/clip-captions.ass").unwrap().contains("[Events]"));
}

#[test]
fn test_processNext_withQuotaAndSecondary_shouldBurnPlainCaptions() {
    let pipeline = CaptionPipeline::new(
        Box::new(MockTranscriptionProvider::failing(MockErrorType::Quota)),
        Some(Box::new(MockSubtitleProvider::responding(WHISPER_SRT))),
    );
    let h = harness(vec![Job::new("job-3", SOURCE_KEY)], pipeline, MockTranscoder::default());

    tokio_test::block_on(h.worker.process_next()).unwrap();

    let job = h.queue.job("job-3").unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.output_path.as_deref(), Some("user-1/clip-captioned.mp4"));
    assert_eq!(
        h.store.get_text("user-1/clip-transcript.srt").unwrap(),
        "1\n00:00:00,000 --> 00:00:02,000\nPlain fallback\n\n"
    );

    let burned = h.transcoder.burned.lock().unwrap();
    assert_eq!(burned[0].extension().and_then(|e| e.to_str()), Some("srt"));
}

#[test]
fn test_processJob_withQuotaFallbackAndJobFont_shouldBurnInJobFont() {
    let pipeline = CaptionPipeline::new(
        Box::new(MockTranscriptionProvider::failing(MockErrorType::Quota)),
        Some(Box::new(MockSubtitleProvider::responding(WHISPER_SRT))),
    );
    let mut job = Job::new("job-font", SOURCE_KEY);
    job.style_font = Some("Bebas Neue".to_string());
    let h = harness(vec![job.clone()], pipeline, MockTranscoder::default());

    let outcome = tokio_test::block_on(h.worker.process_job(&job)).unwrap();

    assert!(!outcome.styled);
    assert_eq!(h.transcoder.fonts.lock().unwrap().as_slice(), ["Bebas Neue".to_string()]);
}

#[test]
fn test_processNext_withQuotaAndNoSecondary_shouldStoreFriendlyError() {
    let pipeline = CaptionPipeline::new(Box::new(MockTranscriptionProvider::failing(MockErrorType::Quota)), None);
    let h = harness(vec![Job::new("job-4", SOURCE_KEY)], pipeline, MockTranscoder::default());

    tokio_test::block_on(h.worker.process_next()).unwrap();

    let job = h.queue.job("job-4").unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.error.as_deref(), Some(QUOTA_EXCEEDED_MESSAGE));
    assert!(h.transcoder.burned.lock().unwrap().is_empty());
}

#[test]
fn test_processNext_withMissingSourcePath_shouldFailJob() {
    let mut job = Job::new("job-5", SOURCE_KEY);
    job.source_path = None;
    let h = harness(vec![job], styled_pipeline(), MockTranscoder::default());

    tokio_test::block_on(h.worker.process_next()).unwrap();

    let job = h.queue.job("job-5").unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.error.as_deref(), Some("missing source_path"));
    assert_eq!(h.queue.statuses("job-5"), vec![JobStatus::Processing, JobStatus::Error]);
}

#[test]
fn test_processNext_withMissingObject_shouldFailJobWithStorageError() {
    let h = harness(vec![Job::new("job-6", "user-1/gone.mp4")], styled_pipeline(), MockTranscoder::default());

    tokio_test::block_on(h.worker.process_next()).unwrap();

    let job = h.queue.job("job-6").unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert!(job.error.unwrap().starts_with("Storage error"));
}

#[test]
fn test_processNext_withEmptyQueue_shouldReturnFalse() {
    let h = harness(Vec::new(), styled_pipeline(), MockTranscoder::default());
    assert!(!tokio_test::block_on(h.worker.process_next()).unwrap());
}

#[test]
fn test_run_withOnce_shouldDrainQueueInCreationOrder() {
    let first = Job::new("first", SOURCE_KEY);
    let mut second = Job::new("second", SOURCE_KEY);
    second.created_at = first.created_at + chrono::Duration::seconds(1);
    let h = harness(vec![second, first], styled_pipeline(), MockTranscoder::default());

    tokio_test::block_on(h.worker.run(true)).unwrap();

    let order: Vec<String> = h
        .queue
        .updates
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, update)| update.status == JobStatus::Processing)
        .map(|(id, _)| id.clone())
        .collect();
    assert_eq!(order, vec!["first".to_string(), "second".to_string()]);
    assert_eq!(h.queue.job("second").unwrap().status, JobStatus::Done);
}

#[test]
fn test_jobErrorMessage_withLongMessage_shouldTruncate() {
    let error = AppError::Caption(CaptionError::SanitizationFailure("x".repeat(500)));
    let message = job_error_message(&error, 250);
    assert_eq!(message.chars().count(), 250);
    assert!(message.starts_with("Caption error: No valid SRT content"));
}

#[test]
fn test_jobErrorMessage_withRateLimit_shouldUseQuotaMessage() {
    let error = AppError::Caption(CaptionError::Provider(ProviderError::http("Deepgram", 429, "")));
    assert_eq!(job_error_message(&error, 250), QUOTA_EXCEEDED_MESSAGE);
    assert_eq!(job_error_message(&error, 10), "AI transcr");
}
