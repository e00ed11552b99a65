/*!
 * # capforge - caption compiler for short-form video
 *
 * Turns an ASR transcript into burned-in captions.
 *
 * ## Features
 *
 * - Segment word-timed transcripts into short cues
 * - Render an ASS document with per-word karaoke highlighting
 * - Optional keyword overlay per cue
 * - Sanitize SRT, WebVTT and ASR JSON payloads into canonical SRT
 * - Fall back from the styled path to plain captions when the primary
 *   provider is out of quota or returns garbage
 * - Burn captions into a 1080x1920 video with FFmpeg
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `time_codec`: Timestamp formatting and parsing
 * - `transcript`: ASR response model
 * - `segmenter`: Word grouping into cues
 * - `keyword`: Overlay keyword selection
 * - `renderer`: ASS document rendering
 * - `subtitle_processor`: SRT entries and canonical rendering
 * - `sanitizer`: Foreign subtitle payloads to canonical SRT
 * - `fallback`: Provider fallback policy
 * - `pipeline`: Styled and plain compile paths
 * - `providers`: ASR clients:
 *   - `providers::deepgram`: Deepgram API client
 *   - `providers::openai`: OpenAI Whisper client
 * - `worker`: Job processing loop and its collaborator traits
 * - `storage`: Local object store and JSON job queue
 * - `transcoder`: FFmpeg burn-in
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod fallback;
pub mod file_utils;
pub mod keyword;
pub mod pipeline;
pub mod providers;
pub mod renderer;
pub mod sanitizer;
pub mod segmenter;
pub mod storage;
pub mod subtitle_processor;
pub mod time_codec;
pub mod transcoder;
pub mod transcript;
pub mod worker;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, CaptionError, ProviderError};
pub use fallback::{FailureKind, FallbackState, ProviderFallbackPolicy};
pub use pipeline::{compile_styled, CaptionPipeline, CaptionTrack};
pub use renderer::{render_document, StyleSpec, StyledDocument};
pub use sanitizer::{sanitize, SubtitlePayload};
pub use segmenter::{segment, Cue};
pub use subtitle_processor::{CanonicalSrt, SubtitleEntry};
pub use transcript::{AsrResponse, WordToken};
pub use worker::{Job, JobStatus, Worker};
