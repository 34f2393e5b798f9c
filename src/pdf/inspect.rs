// Read-only cross-reference table inspection.
//
// Locates the `startxref` pointer that resolves to an `xref` keyword and
// lists the table's entries. Works on a standalone document and on a
// polyglot stream where the document sits after other data: the pointer is
// an absolute offset into whatever buffer is passed in.

use thiserror::Error;

use crate::scan;

/// A single cross-reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefEntry {
    pub object: u32,
    pub offset: u64,
    pub generation: u16,
    pub in_use: bool,
}

/// A located cross-reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrefTable {
    /// Position of the `startxref` keyword that was followed.
    pub startxref_at: usize,
    /// Value of the `startxref` pointer (position of the `xref` keyword).
    pub table_offset: u64,
    pub entries: Vec<XrefEntry>,
}

impl XrefTable {
    pub fn in_use(&self) -> impl Iterator<Item = &XrefEntry> {
        self.entries.iter().filter(|e| e.in_use)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum XrefError {
    #[error("no startxref pointer resolves to an xref table")]
    NotFound,
    #[error("malformed xref table at byte {at}: {what}")]
    Malformed { at: usize, what: &'static str },
}

/// Find and parse the cross-reference table of the document in `buf`.
///
/// Every `startxref` keyword is considered, last first; the first one whose
/// value points at an `xref` keyword wins. A stream may hold several
/// documents (for example an unpatched copy stored inside an archive), so the
/// last keyword in the buffer is not necessarily the one that resolves.
pub fn read_xref(buf: &[u8]) -> Result<XrefTable, XrefError> {
    let mut candidates = Vec::new();
    let mut from = 0;
    while let Some(pos) = scan::find(buf, b"startxref", from) {
        candidates.push(pos);
        from = pos + 1;
    }

    for &at in candidates.iter().rev() {
        let Some(table_offset) = read_pointer(buf, at) else {
            continue;
        };
        let Ok(start) = usize::try_from(table_offset) else {
            continue;
        };
        if !buf.get(start..).is_some_and(|rest| rest.starts_with(b"xref")) {
            continue;
        }
        let entries = parse_table(buf, start)?;
        return Ok(XrefTable {
            startxref_at: at,
            table_offset,
            entries,
        });
    }
    Err(XrefError::NotFound)
}

fn read_pointer(buf: &[u8], keyword: usize) -> Option<u64> {
    let mut pos = keyword + b"startxref".len();
    while buf.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
        pos += 1;
    }
    let digits = buf[pos..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    std::str::from_utf8(&buf[pos..pos + digits]).ok()?.parse().ok()
}

fn parse_table(buf: &[u8], start: usize) -> Result<Vec<XrefEntry>, XrefError> {
    let mut entries = Vec::new();
    let mut pos = start + 4;

    loop {
        while buf.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
            pos += 1;
        }
        if pos >= buf.len() {
            return Err(XrefError::Malformed {
                at: pos,
                what: "table not terminated by trailer",
            });
        }
        if buf[pos..].starts_with(b"trailer") {
            return Ok(entries);
        }

        let line_end = scan::find_byte(buf, b'\n', pos).unwrap_or(buf.len());
        let line = std::str::from_utf8(&buf[pos..line_end]).map_err(|_| XrefError::Malformed {
            at: pos,
            what: "subsection header is not text",
        })?;
        let mut parts = line.split_ascii_whitespace();
        let (Some(first), Some(count), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(XrefError::Malformed {
                at: pos,
                what: "subsection header",
            });
        };
        let (Ok(first), Ok(count)) = (first.parse::<u32>(), count.parse::<u32>()) else {
            return Err(XrefError::Malformed {
                at: pos,
                what: "subsection header",
            });
        };
        pos = line_end + 1;

        for i in 0..count {
            let entry = parse_entry(buf, pos).ok_or(XrefError::Malformed {
                at: pos,
                what: "entry",
            })?;
            let object = first.checked_add(i).ok_or(XrefError::Malformed {
                at: pos,
                what: "object number",
            })?;
            entries.push(XrefEntry { object, ..entry });
            pos = scan::find_byte(buf, b'\n', pos + 1).map_or(buf.len(), |p| p + 1);
        }
    }
}

fn parse_entry(buf: &[u8], pos: usize) -> Option<XrefEntry> {
    let line = buf.get(pos..pos + 18)?;
    let text = std::str::from_utf8(line).ok()?;
    let offset = text.get(0..10)?.parse().ok()?;
    let generation = text.get(11..16)?.parse().ok()?;
    let in_use = match text.as_bytes()[17] {
        b'n' => true,
        b'f' => false,
        _ => return None,
    };
    Some(XrefEntry {
        object: 0,
        offset,
        generation,
        in_use,
    })
}
