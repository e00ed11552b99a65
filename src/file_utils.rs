use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

// @module: File and storage-key utilities

/// Suffix of the burned-in video key
pub const CAPTIONED_VIDEO_SUFFIX: &str = "-captioned.mp4";

/// Suffix of a styled caption file key
pub const STYLED_CAPTIONS_SUFFIX: &str = "-captions.ass";

/// Suffix of a plain caption file key
pub const PLAIN_CAPTIONS_SUFFIX: &str = "-transcript.srt";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Read a file to bytes
    pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                Self::ensure_dir(parent)?;
            }
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Copy a file from one location to another, ensuring the target directory exists
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow::anyhow!("Source file does not exist: {:?}", from));
        }

        if let Some(parent) = to.parent() {
            if !parent.as_os_str().is_empty() {
                Self::ensure_dir(parent)?;
            }
        }

        fs::copy(from, to)
            .with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;

        Ok(())
    }

    // @generates: Sibling path with a new suffix, e.g. clip.mp4 -> clip-captioned.mp4
    pub fn sibling_path<P: AsRef<Path>>(input_file: P, suffix: &str) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        input_file.with_file_name(format!("{}{}", stem, suffix))
    }
}

/// Derive a storage key from a source key by replacing its extension with `suffix`.
///
/// `uploads/clip.mp4` becomes `uploads/clip-captioned.mp4`; a key without an
/// extension just gets the suffix appended.
pub fn derived_key(source_key: &str, suffix: &str) -> String {
    let file_start = source_key.rfind('/').map_or(0, |i| i + 1);
    let stem = match source_key[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &source_key[..file_start + dot],
        _ => source_key,
    };
    format!("{}{}", stem, suffix)
}

/// Guess the MIME type of a media file from its extension
pub fn media_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        _ => "audio/mp4",
    }
}
