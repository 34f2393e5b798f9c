// Cross-reference table offset patching.
//
// Rewrites every fixed-width offset in a classic `xref` table plus the
// `startxref` pointer so the document stays valid when it is placed at byte
// `added_base` inside a larger stream. The buffer length never changes: the
// trailer must carry enough padding after `%%EOF` for the `startxref` value
// to grow (the baseline renderer guarantees this).
//
// Table layout the patcher expects:
//
//   xref
//   0 N
//   0000000000 65535 f \n
//   OOOOOOOOOO GGGGG n \n   (N - 1 more entries)
//   trailer
//   << ... >>
//   startxref
//   OFFSET
//   %%EOF

use crate::outcome::{Patched, SkipReason};
use crate::scan;

const XREF_TOKEN: &[u8] = b"\nxref";
const FIRST_ENTRY_TOKEN: &[u8] = b"\n0000000000";
const STARTXREF_TOKEN: &[u8] = b"\nstartxref";

/// Written right after the rewritten `startxref` value.
pub const EOF_MARKER: &[u8] = b"\n%%EOF\n";

/// Width of the offset field in a cross-reference entry.
pub const ENTRY_OFFSET_WIDTH: usize = 10;

/// Distance from the start of `startxref` to its value (`"startxref\n"`).
const STARTXREF_VALUE_SKIP: usize = 10;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Shift every object offset and the `startxref` pointer by `added_base`.
///
/// Returns the buffer untouched (with [`PatchOutcome::Skipped`]) when the
/// table, its first entry or the `startxref` keyword cannot be located, when
/// any field fails to parse, or when a write would land past the end of the
/// buffer. No partially patched buffer is ever returned.
///
/// [`PatchOutcome::Skipped`]: crate::outcome::PatchOutcome::Skipped
pub fn patch_document(doc: Vec<u8>, added_base: u64) -> Patched {
    let plan = match plan_edits(&doc, added_base) {
        Ok(plan) => plan,
        Err(reason) => {
            log::warn!("document offsets left unpatched: {reason}");
            return Patched::skipped(doc, reason);
        }
    };

    let mut doc = doc;
    for edit in &plan.edits {
        doc[edit.at..edit.at + edit.bytes.len()].copy_from_slice(&edit.bytes);
    }
    log::debug!(
        "document: shifted {} xref entries and startxref by {added_base}",
        plan.entries
    );
    Patched::applied(doc, plan.entries, plan.entries)
}

/// Render an offset into a cross-reference entry field.
///
/// Always exactly [`ENTRY_OFFSET_WIDTH`] bytes: shorter values are
/// zero-padded on the left, longer ones keep their leading digits.
pub fn render_entry_offset(value: u64) -> [u8; ENTRY_OFFSET_WIDTH] {
    let text = format!("{value:0width$}", width = ENTRY_OFFSET_WIDTH);
    let mut field = [0u8; ENTRY_OFFSET_WIDTH];
    field.copy_from_slice(&text.as_bytes()[..ENTRY_OFFSET_WIDTH]);
    field
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

struct Edit {
    at: usize,
    bytes: Vec<u8>,
}

struct Plan {
    edits: Vec<Edit>,
    entries: usize,
}

fn plan_edits(doc: &[u8], added_base: u64) -> Result<Plan, SkipReason> {
    let xref_start = scan::find(doc, XREF_TOKEN, 0)
        .ok_or(SkipReason::MarkerNotFound("xref keyword"))?
        + 1;
    let first_entry = scan::find(doc, FIRST_ENTRY_TOKEN, xref_start)
        .ok_or(SkipReason::MarkerNotFound("first xref entry"))?
        + 1;
    let startxref = scan::find(doc, STARTXREF_TOKEN, xref_start)
        .ok_or(SkipReason::MarkerNotFound("startxref keyword"))?
        + 1;
    let value_start = startxref + STARTXREF_VALUE_SKIP;
    let value_end = scan::find_byte(doc, b'\n', startxref + STARTXREF_VALUE_SKIP + 1)
        .ok_or(SkipReason::MarkerNotFound("end of startxref value"))?;

    let count = declared_count(&doc[xref_start..first_entry])?;
    // Each entry needs at least a full offset field, which bounds the count.
    let mut edits = Vec::with_capacity(count.min(doc.len() / ENTRY_OFFSET_WIDTH) + 1);

    let mut cursor = first_entry;
    for i in 0..count {
        let field = doc
            .get(cursor..cursor + ENTRY_OFFSET_WIDTH)
            .ok_or(SkipReason::OutOfBounds("xref entry"))?;
        let old = parse_decimal(field).ok_or(SkipReason::InvalidNumber("xref entry"))?;
        let new = old
            .checked_add(added_base)
            .ok_or(SkipReason::Overflow("xref entry"))?;
        edits.push(Edit {
            at: cursor,
            bytes: render_entry_offset(new).to_vec(),
        });

        if i + 1 < count {
            cursor = scan::find_byte(doc, b'\n', cursor + 1)
                .ok_or(SkipReason::OutOfBounds("xref entry"))?
                + 1;
        }
    }

    let value = doc
        .get(value_start..value_end)
        .ok_or(SkipReason::OutOfBounds("startxref value"))?;
    let old = parse_decimal(value).ok_or(SkipReason::InvalidNumber("startxref value"))?;
    let new = old
        .checked_add(added_base)
        .ok_or(SkipReason::Overflow("startxref value"))?;

    let mut trailer = new.to_string().into_bytes();
    trailer.extend_from_slice(EOF_MARKER);
    if value_start + trailer.len() > doc.len() {
        return Err(SkipReason::OutOfBounds("trailer"));
    }
    edits.push(Edit {
        at: value_start,
        bytes: trailer,
    });

    Ok(Plan {
        edits,
        entries: count,
    })
}

/// The object count is the last whitespace-separated token of the table
/// header (`xref\n0 N\n`).
fn declared_count(header: &[u8]) -> Result<usize, SkipReason> {
    let text = std::str::from_utf8(header).map_err(|_| SkipReason::InvalidNumber("xref header"))?;
    text.split_ascii_whitespace()
        .last()
        .and_then(|token| token.parse().ok())
        .ok_or(SkipReason::InvalidNumber("xref header"))
}

/// Parse ASCII decimal digits surrounded by optional whitespace.
fn parse_decimal(field: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(field).ok()?.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
