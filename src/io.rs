// File-level helpers for polyglot assembly.
//
// `assemble_file()` reads a media file, checks it against `MediaLimits`,
// runs the analyzer and the assembler, and writes the combined stream.
// Optionally computes a SHA-256 of the output (feature-gated behind
// `file-io`).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;
use thiserror::Error;

use crate::analysis::Analyzer;
use crate::assemble::{AssembleError, AssembleOptions, Assembler};
use crate::outcome::PatchOutcome;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Largest media file accepted by default (20 MiB).
pub const DEFAULT_MAX_MEDIA_SIZE: u64 = 20 * 1024 * 1024;

/// Suffix added to the media file stem to name the output.
pub const OUTPUT_SUFFIX: &str = "_universal";

/// Extension used when the media file has none.
pub const DEFAULT_EXTENSION: &str = "mp4";

pub const FALLBACK_MIME: &str = "application/octet-stream";

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// Media validation
// ---------------------------------------------------------------------------

/// Limits applied to media before assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaLimits {
    pub max_size: u64,
    /// Reject mime types outside `video/`.
    pub require_video: bool,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_MEDIA_SIZE,
            require_video: true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("not a video file ({0})")]
    NotVideo(String),
    #[error("media is {size} bytes, limit is {max}")]
    TooLarge { size: u64, max: u64 },
}

/// Check a media file's size and mime type against `limits`.
pub fn validate_media(size: u64, mime_type: &str, limits: &MediaLimits) -> Result<(), MediaError> {
    if limits.require_video && !mime_type.starts_with("video/") {
        return Err(MediaError::NotVideo(mime_type.to_string()));
    }
    if size > limits.max_size {
        return Err(MediaError::TooLarge {
            size,
            max: limits.max_size,
        });
    }
    Ok(())
}

/// Guess a media mime type from the file extension.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mp4" | "m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("ogv") => "video/ogg",
        Some("mpeg" | "mpg") => "video/mpeg",
        Some("3gp") => "video/3gpp",
        _ => FALLBACK_MIME,
    }
}

/// Name of the assembled file for `media_path`: `<stem>_universal.<ext>`.
///
/// The output keeps the media's extension so it opens as media by default.
pub fn output_file_name(media_path: &Path) -> String {
    let stem = media_path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_else(|| "output".into());
    let ext = media_path
        .extension()
        .map(|e| e.to_string_lossy())
        .unwrap_or_else(|| DEFAULT_EXTENSION.into());
    format!("{stem}{OUTPUT_SUFFIX}.{ext}")
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `assemble_file()`.
#[derive(Debug, Clone)]
pub struct AssembleStats {
    pub mime_type: String,
    pub media_size: u64,
    pub document_size: u64,
    pub archive_size: u64,
    pub output_size: u64,
    pub document: PatchOutcome,
    pub archive: PatchOutcome,
    /// SHA-256 of the output file (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

/// Options for `assemble_file()`.
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    pub limits: MediaLimits,
    /// Mime type override; guessed from the extension when `None`.
    pub mime_type: Option<String>,
    pub assemble: AssembleOptions,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file-level assembly.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("media rejected: {0}")]
    Media(#[from] MediaError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

// ---------------------------------------------------------------------------
// assemble_file
// ---------------------------------------------------------------------------

/// Assemble `media_path` with the analysis from `analyzer`, writing the
/// polyglot to `output_path`.
///
/// The media size is checked before the file is read.
pub fn assemble_file(
    media_path: &Path,
    analyzer: &dyn Analyzer,
    output_path: &Path,
    opts: &FileOptions,
) -> Result<AssembleStats, IoError> {
    let mime_type = opts
        .mime_type
        .clone()
        .unwrap_or_else(|| guess_mime(media_path).to_string());
    let media_size = std::fs::metadata(media_path)?.len();
    validate_media(media_size, &mime_type, &opts.limits)?;

    let media = std::fs::read(media_path)?;
    let assembly = Assembler::from_options(&opts.assemble).assemble_with(analyzer, &media, &mime_type)?;

    let out = File::create(output_path)?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, out);
    writer.write_all(&assembly.bytes)?;
    writer.flush()?;

    #[cfg(feature = "file-io")]
    let output_sha256 = Some(sha2::Sha256::digest(&assembly.bytes).into());
    #[cfg(not(feature = "file-io"))]
    let output_sha256 = None;

    Ok(AssembleStats {
        mime_type: assembly.mime_type,
        media_size,
        document_size: assembly.layout.document_len as u64,
        archive_size: assembly.layout.archive_len as u64,
        output_size: assembly.bytes.len() as u64,
        document: assembly.document,
        archive: assembly.archive,
        output_sha256,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
