// Baseline report renderer.
//
// Lays out a titled report (summary + transcript) as a PDF 1.3 file with a
// single classic cross-reference subsection. The output is internally
// consistent on its own (offsets counted from byte 0) and carries padding
// after `%%EOF` so `patch_document` can rewrite `startxref` in place.

use std::borrow::Cow;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_TITLE: &str = "Analysis Report";

/// Transcript characters kept in the report before it is cut with `...`.
pub const DEFAULT_TRANSCRIPT_LIMIT: usize = 3000;

/// Bytes of slack after `%%EOF` (a `u64` offset has at most 20 digits).
pub const TRAILER_PADDING: usize = 24;

/// A4 in points.
const A4_WIDTH: f32 = 595.28;
const A4_HEIGHT: f32 = 841.89;
/// 20 mm.
const DEFAULT_MARGIN: f32 = 56.69;

const LINE_HEIGHT_FACTOR: f32 = 1.15;
/// Average Helvetica advance width in em, used for line wrapping.
const AVG_GLYPH_WIDTH: f32 = 0.5;

const TITLE_SIZE: f32 = 22.0;
const HEADING_SIZE: f32 = 14.0;
const NOTE_SIZE: f32 = 10.0;
const SUMMARY_SIZE: f32 = 11.0;
const TRANSCRIPT_SIZE: f32 = 10.0;

const BLACK: f32 = 0.0;
const NOTE_GRAY: f32 = 0.392;
const BODY_GRAY: f32 = 0.235;

// ---------------------------------------------------------------------------
// Renderer seam
// ---------------------------------------------------------------------------

/// Produces a baseline document from analysis text.
pub trait DocumentRenderer {
    fn render(&self, summary: &str, transcript: &str) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid page layout: {0}")]
    Layout(String),
}

// ---------------------------------------------------------------------------
// ReportRenderer
// ---------------------------------------------------------------------------

/// Renders the summary and transcript into a paginated Helvetica report.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    pub title: String,
    /// Date label printed under the title (`Generated: ...`).
    pub generated: Option<String>,
    /// Maximum transcript characters; `None` keeps the whole transcript.
    pub transcript_limit: Option<usize>,
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            generated: None,
            transcript_limit: Some(DEFAULT_TRANSCRIPT_LIMIT),
            page_width: A4_WIDTH,
            page_height: A4_HEIGHT,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl ReportRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Stamp the report with today's local date.
    pub fn with_generated_today(mut self) -> Self {
        self.generated = Some(chrono::Local::now().format("%Y-%m-%d").to_string());
        self
    }

    fn check_layout(&self) -> Result<(), RenderError> {
        let text_width = self.page_width - 2.0 * self.margin;
        if !(text_width >= TITLE_SIZE * AVG_GLYPH_WIDTH) {
            return Err(RenderError::Layout(format!(
                "page width {} leaves no room for text with margin {}",
                self.page_width, self.margin
            )));
        }
        let text_height = self.page_height - 2.0 * self.margin;
        if !(text_height >= TITLE_SIZE * LINE_HEIGHT_FACTOR * 2.0) {
            return Err(RenderError::Layout(format!(
                "page height {} leaves no room for text with margin {}",
                self.page_height, self.margin
            )));
        }
        Ok(())
    }

    fn compose(&self, summary: &str, transcript: &str) -> Vec<Vec<u8>> {
        let mut page = PageComposer::new(self.page_width, self.page_height, self.margin);

        page.paragraph(&self.title, TITLE_SIZE, BLACK);
        if let Some(date) = &self.generated {
            page.gap(4.0);
            page.paragraph(&format!("Generated: {date}"), NOTE_SIZE, NOTE_GRAY);
        }
        page.rule();

        page.gap(12.0);
        page.paragraph("Summary", HEADING_SIZE, BLACK);
        page.gap(4.0);
        page.paragraph(summary, SUMMARY_SIZE, BODY_GRAY);

        page.gap(12.0);
        page.paragraph("Transcript", HEADING_SIZE, BLACK);
        page.gap(4.0);
        let transcript = truncate_chars(transcript, self.transcript_limit);
        page.paragraph(&transcript, TRANSCRIPT_SIZE, BODY_GRAY);

        page.finish()
    }
}

impl DocumentRenderer for ReportRenderer {
    fn render(&self, summary: &str, transcript: &str) -> Result<Vec<u8>, RenderError> {
        self.check_layout()?;
        let pages = self.compose(summary, transcript);
        log::debug!("report: {} page(s)", pages.len());
        Ok(write_document(&self.title, self.page_width, self.page_height, &pages))
    }
}

// ---------------------------------------------------------------------------
// Page composition
// ---------------------------------------------------------------------------

struct PageComposer {
    pages: Vec<Vec<u8>>,
    current: Vec<u8>,
    /// Baseline of the last line, measured from the top edge.
    y: f32,
    width: f32,
    height: f32,
    margin: f32,
}

impl PageComposer {
    fn new(width: f32, height: f32, margin: f32) -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: margin,
            width,
            height,
            margin,
        }
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = self.margin;
    }

    fn advance(&mut self, amount: f32) {
        if self.y + amount > self.height - self.margin {
            self.break_page();
        }
        self.y += amount;
    }

    fn gap(&mut self, amount: f32) {
        // Gaps never open a page on their own.
        self.y = (self.y + amount).min(self.height - self.margin);
    }

    fn rule(&mut self) {
        self.advance(8.0);
        let y = self.height - self.y;
        let ops = format!(
            "0 G 0.57 w {:.2} {y:.2} m {:.2} {y:.2} l S\n",
            self.margin,
            self.width - self.margin
        );
        self.current.extend_from_slice(ops.as_bytes());
    }

    fn paragraph(&mut self, text: &str, size: f32, gray: f32) {
        let max_chars = ((self.width - 2.0 * self.margin) / (size * AVG_GLYPH_WIDTH)) as usize;
        for line in wrap(text, max_chars.max(1)) {
            self.advance(size * LINE_HEIGHT_FACTOR);
            if line.is_empty() {
                continue;
            }
            let head = format!(
                "{gray:.3} g BT /F1 {size} Tf {:.2} {:.2} Td (",
                self.margin,
                self.height - self.y
            );
            self.current.extend_from_slice(head.as_bytes());
            encode_text(&line, &mut self.current);
            self.current.extend_from_slice(b") Tj ET\n");
        }
    }

    fn finish(mut self) -> Vec<Vec<u8>> {
        self.pages.push(self.current);
        self.pages
    }
}

/// Greedy word wrap to `max_chars` characters per line. Explicit line breaks
/// are kept; words longer than a line are split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for para in text.split('\n') {
        let mut line = String::new();
        let mut line_chars = 0;
        for word in para.split_whitespace() {
            let mut word_chars = word.chars().count();
            let mut word = Cow::Borrowed(word);

            while word_chars > max_chars {
                if line_chars > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_chars = 0;
                }
                let split = word
                    .char_indices()
                    .nth(max_chars)
                    .map_or(word.len(), |(i, _)| i);
                lines.push(word[..split].to_string());
                word = Cow::Owned(word[split..].to_string());
                word_chars -= max_chars;
            }
            if word_chars == 0 {
                continue;
            }

            if line_chars > 0 && line_chars + 1 + word_chars > max_chars {
                lines.push(std::mem::take(&mut line));
                line_chars = 0;
            }
            if line_chars > 0 {
                line.push(' ');
                line_chars += 1;
            }
            line.push_str(&word);
            line_chars += word_chars;
        }
        lines.push(line);
    }
    lines
}

fn truncate_chars(text: &str, limit: Option<usize>) -> Cow<'_, str> {
    match limit.and_then(|limit| text.char_indices().nth(limit)) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}

/// Encode text for a literal string under WinAnsiEncoding.
fn encode_text(text: &str, out: &mut Vec<u8>) {
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            '\t' => out.push(b' '),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {}
            c if c.is_ascii() => out.push(c as u8),
            c => out.push(win_ansi(c).unwrap_or(b'?')),
        }
    }
}

fn win_ansi(c: char) -> Option<u8> {
    let code = match c {
        '\u{20ac}' => 0x80,
        '\u{2026}' => 0x85,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        _ => return None,
    };
    Some(code)
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_ID: usize = 3;
const INFO_ID: usize = 4;
const FIRST_PAGE_ID: usize = 5;

fn write_document(title: &str, width: f32, height: f32, pages: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut offsets = Vec::new();

    out.extend_from_slice(b"%PDF-1.3\n%\xe2\xe3\xcf\xd3\n");

    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", FIRST_PAGE_ID + 2 * i))
        .collect();

    let mut object = |out: &mut Vec<u8>, id: usize, body: &[u8]| {
        debug_assert_eq!(offsets.len() + 1, id);
        offsets.push(out.len());
        out.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    };

    object(
        &mut out,
        CATALOG_ID,
        format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>").as_bytes(),
    );
    object(
        &mut out,
        PAGES_ID,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .as_bytes(),
    );
    object(
        &mut out,
        FONT_ID,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    let mut info = b"<< /Producer (polymux) /Title (".to_vec();
    encode_text(title, &mut info);
    info.extend_from_slice(b") >>");
    object(&mut out, INFO_ID, &info);

    for (i, content) in pages.iter().enumerate() {
        let page_id = FIRST_PAGE_ID + 2 * i;
        let content_id = page_id + 1;
        object(
            &mut out,
            page_id,
            format!(
                "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {width:.2} {height:.2}] \
                 /Resources << /Font << /F1 {FONT_ID} 0 R >> >> /Contents {content_id} 0 R >>"
            )
            .as_bytes(),
        );
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(content);
        stream.extend_from_slice(b"\nendstream");
        object(&mut out, content_id, &stream);
    }

    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for off in &offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root {CATALOG_ID} 0 R /Info {INFO_ID} 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            offsets.len() + 1
        )
        .as_bytes(),
    );
    out.resize(out.len() + TRAILER_PADDING, b'\n');
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
