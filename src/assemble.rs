// Polyglot assembler: ties rendering, archiving and offset patching together.
//
// Output layout:
//   [ media | patched document | patched archive ]
//
// The document's offsets are shifted by the media length and the archive's
// by media + patched document length, so each container resolves its
// internal structures at their absolute positions in the combined stream.
// The archive carries the document *as rendered* (offsets from byte 0), so
// the extracted copy stands alone.

use thiserror::Error;

use crate::analysis::{AnalysisError, Analyzer};
use crate::outcome::PatchOutcome;
use crate::pdf::{self, DocumentRenderer, RenderError, ReportRenderer};
use crate::zip::{self, ArchiveBuilder, ArchiveEntry, ArchiveError, DosDateTime, Method, ZipBuilder};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const REPORT_ENTRY: &str = "report.pdf";
pub const TRANSCRIPT_ENTRY: &str = "transcript.txt";
pub const SUMMARY_ENTRY: &str = "summary.md";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the default renderer and archive builder.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Report title.
    pub title: String,
    /// Transcript characters kept in the report; `None` keeps everything.
    pub transcript_limit: Option<usize>,
    /// Compression method for archive entries.
    pub method: Method,
    /// Stamp the report and archive entries with the current date. When
    /// off, output is byte-for-byte reproducible.
    pub timestamp: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            title: pdf::render::DEFAULT_TITLE.to_string(),
            transcript_limit: Some(pdf::render::DEFAULT_TRANSCRIPT_LIMIT),
            method: Method::Stored,
            timestamp: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Byte layout of an assembled stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub media_len: usize,
    pub document_len: usize,
    pub archive_len: usize,
}

impl Layout {
    pub fn document_start(&self) -> usize {
        self.media_len
    }

    pub fn archive_start(&self) -> usize {
        self.media_len + self.document_len
    }

    pub fn total_len(&self) -> usize {
        self.media_len + self.document_len + self.archive_len
    }
}

/// An assembled polyglot stream.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub bytes: Vec<u8>,
    /// Mime type of the media, which is how the stream should be served.
    pub mime_type: String,
    pub layout: Layout,
    pub document: PatchOutcome,
    pub archive: PatchOutcome,
}

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("document rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error("archive building failed: {0}")]
    Archive(#[from] ArchiveError),
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

/// Builds polyglot streams from media plus analysis text.
#[derive(Debug, Clone)]
pub struct Assembler<R = ReportRenderer, B = ZipBuilder> {
    renderer: R,
    builder: B,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::from_options(&AssembleOptions::default())
    }
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(opts: &AssembleOptions) -> Self {
        let mut renderer = ReportRenderer::new(opts.title.clone());
        renderer.transcript_limit = opts.transcript_limit;
        let mut builder = ZipBuilder::new(opts.method);
        if opts.timestamp {
            renderer = renderer.with_generated_today();
            builder.modified = DosDateTime::now();
        }
        Self { renderer, builder }
    }
}

impl<R: DocumentRenderer, B: ArchiveBuilder> Assembler<R, B> {
    pub fn with_parts(renderer: R, builder: B) -> Self {
        Self { renderer, builder }
    }

    /// Assemble `media ++ document ++ archive`.
    ///
    /// Renderer and builder failures propagate. A patcher that cannot find
    /// its structures leaves its container unpatched; the stream is still
    /// produced and the outcome says so.
    pub fn assemble(
        &self,
        media: &[u8],
        mime_type: &str,
        summary: &str,
        transcript: &str,
    ) -> Result<Assembly, AssembleError> {
        let raw_document = self.renderer.render(summary, transcript)?;
        let document = pdf::patch_document(raw_document.clone(), media.len() as u64);

        let raw_archive = self.builder.build(&[
            ArchiveEntry::new(REPORT_ENTRY, &raw_document),
            ArchiveEntry::new(TRANSCRIPT_ENTRY, transcript.as_bytes()),
            ArchiveEntry::new(SUMMARY_ENTRY, summary.as_bytes()),
        ])?;
        let archive_base = (media.len() + document.bytes.len()) as u64;
        let archive = zip::patch_archive(raw_archive, archive_base);

        let layout = Layout {
            media_len: media.len(),
            document_len: document.bytes.len(),
            archive_len: archive.bytes.len(),
        };
        let mut bytes = Vec::with_capacity(layout.total_len());
        bytes.extend_from_slice(media);
        bytes.extend_from_slice(&document.bytes);
        bytes.extend_from_slice(&archive.bytes);

        log::info!(
            "assembled {} bytes: media {}, document {} ({}), archive {} ({})",
            bytes.len(),
            layout.media_len,
            layout.document_len,
            document.outcome,
            layout.archive_len,
            archive.outcome
        );

        Ok(Assembly {
            bytes,
            mime_type: mime_type.to_string(),
            layout,
            document: document.outcome,
            archive: archive.outcome,
        })
    }

    /// Run `analyzer` over the media, then assemble with its summary and
    /// transcript.
    pub fn assemble_with(
        &self,
        analyzer: &dyn Analyzer,
        media: &[u8],
        mime_type: &str,
    ) -> Result<Assembly, AssembleError> {
        let analysis = analyzer.analyze(media, mime_type)?;
        self.assemble(media, mime_type, &analysis.summary, &analysis.transcript)
    }
}

/// Assemble with the default renderer and stored archive entries.
pub fn assemble(
    media: &[u8],
    mime_type: &str,
    summary: &str,
    transcript: &str,
) -> Result<Assembly, AssembleError> {
    Assembler::new().assemble(media, mime_type, summary, transcript)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
