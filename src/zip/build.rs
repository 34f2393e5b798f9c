// Baseline archive writer.
//
// Emits a self-contained Zip32 archive: local header + data for every entry,
// then the central directory, then the EOCD record. Offsets are counted from
// byte 0 of the returned buffer; `patch_archive` shifts them afterwards.
// Sizes are always written up front (no data descriptors).

use std::borrow::Cow;
use std::io::{self, Write};

use chrono::{Datelike, NaiveDateTime, Timelike};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use thiserror::Error;

use super::{CENTRAL_HEADER_SIGNATURE, EOCD_SIGNATURE, LOCAL_HEADER_SIGNATURE, MAX_COMMENT_LEN};

/// "Version needed to extract" / "version made by": 2.0 (deflate), MS-DOS.
const ZIP_VERSION: u16 = 20;
/// General purpose bit 11: name is UTF-8.
const FLAG_UTF8: u16 = 1 << 11;

// ---------------------------------------------------------------------------
// Builder seam
// ---------------------------------------------------------------------------

/// A named archive member.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveEntry<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
}

impl<'a> ArchiveEntry<'a> {
    pub fn new(name: &'a str, data: &'a [u8]) -> Self {
        Self { name, data }
    }
}

/// Packs named entries into a baseline archive.
pub trait ArchiveBuilder {
    fn build(&self, entries: &[ArchiveEntry<'_>]) -> Result<Vec<u8>, ArchiveError>;
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("too many entries for a zip32 archive: {0}")]
    TooManyEntries(usize),
    #[error("entry name is longer than 65535 bytes: {0}...")]
    NameTooLong(String),
    #[error("archive comment is longer than 65535 bytes ({0} bytes)")]
    CommentTooLong(usize),
    #[error("archive exceeds the 4 GiB zip32 limit")]
    TooLarge,
    #[error("deflate failed: {0}")]
    Deflate(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Compression method for archive entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Stored,
    Deflated,
}

impl Method {
    pub fn code(self) -> u16 {
        match self {
            Self::Stored => 0,
            Self::Deflated => 8,
        }
    }
}

/// MS-DOS date and time as stored in ZIP headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub date: u16,
    pub time: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable instant.
    pub const EPOCH: Self = Self {
        date: (1 << 5) | 1,
        time: 0,
    };

    /// Convert a calendar time. Years outside 1980..=2107 clamp to the
    /// nearest representable instant; seconds round down to even.
    pub fn from_naive(dt: NaiveDateTime) -> Self {
        if dt.year() < 1980 {
            return Self::EPOCH;
        }
        if dt.year() > 2107 {
            return Self {
                date: (127 << 9) | (12 << 5) | 31,
                time: (23 << 11) | (59 << 5) | 29,
            };
        }
        let date = (((dt.year() - 1980) as u16) << 9) | ((dt.month() as u16) << 5) | dt.day() as u16;
        let time = ((dt.hour() as u16) << 11) | ((dt.minute() as u16) << 5) | (dt.second() as u16 / 2);
        Self { date, time }
    }

    /// The current local time.
    pub fn now() -> Self {
        Self::from_naive(chrono::Local::now().naive_local())
    }
}

impl Default for DosDateTime {
    fn default() -> Self {
        Self::EPOCH
    }
}

// ---------------------------------------------------------------------------
// ZipBuilder
// ---------------------------------------------------------------------------

/// Writes Zip32 archives.
#[derive(Debug, Clone)]
pub struct ZipBuilder {
    pub method: Method,
    /// Deflate level (0-9), used with [`Method::Deflated`].
    pub level: u32,
    /// Modification time stamped on every entry.
    pub modified: DosDateTime,
    /// Archive comment written after the EOCD record.
    pub comment: Vec<u8>,
}

impl Default for ZipBuilder {
    fn default() -> Self {
        Self {
            method: Method::Stored,
            level: 6,
            modified: DosDateTime::EPOCH,
            comment: Vec::new(),
        }
    }
}

impl ZipBuilder {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Compress `data` with the configured method. Deflated output that is
    /// not smaller than the input is stored instead.
    fn encode<'d>(&self, data: &'d [u8]) -> Result<(Method, Cow<'d, [u8]>), ArchiveError> {
        match self.method {
            Method::Stored => Ok((Method::Stored, Cow::Borrowed(data))),
            Method::Deflated => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(self.level.min(9)));
                encoder.write_all(data)?;
                let packed = encoder.finish()?;
                if packed.len() < data.len() {
                    Ok((Method::Deflated, Cow::Owned(packed)))
                } else {
                    Ok((Method::Stored, Cow::Borrowed(data)))
                }
            }
        }
    }
}

impl ArchiveBuilder for ZipBuilder {
    fn build(&self, entries: &[ArchiveEntry<'_>]) -> Result<Vec<u8>, ArchiveError> {
        if entries.len() > u16::MAX as usize {
            return Err(ArchiveError::TooManyEntries(entries.len()));
        }
        if self.comment.len() > MAX_COMMENT_LEN {
            return Err(ArchiveError::CommentTooLong(self.comment.len()));
        }

        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in entries {
            let name = entry.name.as_bytes();
            if name.len() > u16::MAX as usize {
                return Err(ArchiveError::NameTooLong(entry.name.chars().take(32).collect()));
            }
            let mut crc = flate2::Crc::new();
            crc.update(entry.data);
            let crc = crc.sum();

            let (method, payload) = self.encode(entry.data)?;
            let flags = if entry.name.is_ascii() { 0 } else { FLAG_UTF8 };
            let local_offset = to_u32(out.len())?;
            let compressed = to_u32(payload.len())?;
            let uncompressed = to_u32(entry.data.len())?;

            put_u32(&mut out, LOCAL_HEADER_SIGNATURE);
            put_u16(&mut out, ZIP_VERSION);
            put_u16(&mut out, flags);
            put_u16(&mut out, method.code());
            put_u16(&mut out, self.modified.time);
            put_u16(&mut out, self.modified.date);
            put_u32(&mut out, crc);
            put_u32(&mut out, compressed);
            put_u32(&mut out, uncompressed);
            put_u16(&mut out, name.len() as u16);
            put_u16(&mut out, 0);
            out.extend_from_slice(name);
            out.extend_from_slice(&payload);

            put_u32(&mut central, CENTRAL_HEADER_SIGNATURE);
            put_u16(&mut central, ZIP_VERSION);
            put_u16(&mut central, ZIP_VERSION);
            put_u16(&mut central, flags);
            put_u16(&mut central, method.code());
            put_u16(&mut central, self.modified.time);
            put_u16(&mut central, self.modified.date);
            put_u32(&mut central, crc);
            put_u32(&mut central, compressed);
            put_u32(&mut central, uncompressed);
            put_u16(&mut central, name.len() as u16);
            put_u16(&mut central, 0); // extra
            put_u16(&mut central, 0); // comment
            put_u16(&mut central, 0); // disk number
            put_u16(&mut central, 0); // internal attributes
            put_u32(&mut central, 0); // external attributes
            put_u32(&mut central, local_offset);
            central.extend_from_slice(name);
        }

        let cd_offset = to_u32(out.len())?;
        let cd_size = to_u32(central.len())?;
        out.extend_from_slice(&central);

        let count = entries.len() as u16;
        put_u32(&mut out, EOCD_SIGNATURE);
        put_u16(&mut out, 0);
        put_u16(&mut out, 0);
        put_u16(&mut out, count);
        put_u16(&mut out, count);
        put_u32(&mut out, cd_size);
        put_u32(&mut out, cd_offset);
        put_u16(&mut out, self.comment.len() as u16);
        out.extend_from_slice(&self.comment);

        log::debug!(
            "archive: {} entries, central directory at {cd_offset}, {} bytes",
            entries.len(),
            out.len()
        );
        Ok(out)
    }
}

#[inline]
fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

#[inline]
fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn to_u32(v: usize) -> Result<u32, ArchiveError> {
    u32::try_from(v).map_err(|_| ArchiveError::TooLarge)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::inspect::{read_directory, read_entry};
    use chrono::NaiveDate;

    #[test]
    fn stored_archive_reads_back() {
        let entries = [
            ArchiveEntry::new("report.pdf", b"%PDF-1.3 fake"),
            ArchiveEntry::new("transcript.txt", b"hello world"),
            ArchiveEntry::new("summary.md", b""),
        ];
        let zip = ZipBuilder::default().build(&entries).unwrap();
        assert!(zip.starts_with(b"PK\x03\x04"));

        let dir = read_directory(&zip).unwrap();
        assert_eq!(dir.total_entries, 3);
        assert_eq!(dir.eocd_offset, zip.len() - 22);
        let names: Vec<_> = dir.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["report.pdf", "transcript.txt", "summary.md"]);
        assert_eq!(dir.entries[0].local_header_offset, 0);
        for (entry, expected) in dir.entries.iter().zip(&entries) {
            assert_eq!(entry.method, 0);
            assert_eq!(read_entry(&zip, entry).unwrap(), expected.data);
        }
    }

    #[test]
    fn deflated_entries_inflate() {
        let text = "the same sentence again and again. ".repeat(200);
        let builder = ZipBuilder::new(Method::Deflated);
        let zip = builder
            .build(&[ArchiveEntry::new("transcript.txt", text.as_bytes())])
            .unwrap();
        assert!(zip.len() < text.len());

        let dir = read_directory(&zip).unwrap();
        assert_eq!(dir.entries[0].method, 8);
        assert_eq!(read_entry(&zip, &dir.entries[0]).unwrap(), text.as_bytes());
    }

    #[test]
    fn incompressible_entries_fall_back_to_stored() {
        let builder = ZipBuilder::new(Method::Deflated);
        let zip = builder.build(&[ArchiveEntry::new("a", b"xyz")]).unwrap();
        let dir = read_directory(&zip).unwrap();
        assert_eq!(dir.entries[0].method, 0);
    }

    #[test]
    fn comment_follows_eocd() {
        let builder = ZipBuilder {
            comment: b"made by polymux".to_vec(),
            ..Default::default()
        };
        let zip = builder.build(&[ArchiveEntry::new("a.txt", b"a")]).unwrap();
        assert!(zip.ends_with(b"made by polymux"));
        let dir = read_directory(&zip).unwrap();
        assert_eq!(dir.comment, b"made by polymux");
    }

    #[test]
    fn oversized_comment_is_rejected() {
        let builder = ZipBuilder {
            comment: vec![b'x'; MAX_COMMENT_LEN + 1],
            ..Default::default()
        };
        assert!(matches!(
            builder.build(&[]),
            Err(ArchiveError::CommentTooLong(_))
        ));
    }

    #[test]
    fn utf8_names_set_flag() {
        let zip = ZipBuilder::default()
            .build(&[ArchiveEntry::new("r\u{e9}sum\u{e9}.txt", b"x")])
            .unwrap();
        let flags = u16::from_le_bytes([zip[6], zip[7]]);
        assert_eq!(flags, FLAG_UTF8);
        let dir = read_directory(&zip).unwrap();
        assert_eq!(dir.entries[0].name, "r\u{e9}sum\u{e9}.txt");
    }

    #[test]
    fn dos_time_conversion() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(13, 45, 31)
            .unwrap();
        let dos = DosDateTime::from_naive(dt);
        assert_eq!(dos.date, (44 << 9) | (5 << 5) | 1);
        assert_eq!(dos.time, (13 << 11) | (45 << 5) | 15);

        let old = NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(DosDateTime::from_naive(old), DosDateTime::EPOCH);
    }

    #[test]
    fn empty_archive_is_just_eocd() {
        let zip = ZipBuilder::default().build(&[]).unwrap();
        assert_eq!(zip.len(), 22);
        let dir = read_directory(&zip).unwrap();
        assert!(dir.entries.is_empty());
        assert_eq!(dir.cd_offset, 0);
    }
}
