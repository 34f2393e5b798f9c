// Read-only archive inspection.
//
// Locates the EOCD record from the end of a buffer, walks the central
// directory and reads entry data through the local headers the directory
// points at. Unlike the patcher this is strict: any inconsistency is an
// error, which makes it suitable for checking patched output.

use std::io::{self, Read};

use flate2::read::DeflateDecoder;
use thiserror::Error;

use super::{
    CENTRAL_HEADER_LEN, CENTRAL_HEADER_SIGNATURE, EOCD_LEN, EOCD_SEARCH_WINDOW, EOCD_SIGNATURE,
    LOCAL_HEADER_LEN, LOCAL_HEADER_SIGNATURE, field,
};
use crate::scan::{self, read_u16_le, read_u32_le};

/// A central directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralEntry {
    pub name: String,
    pub method: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    /// Absolute position of the entry's local header, as recorded.
    pub local_header_offset: u32,
    /// Position of this central directory entry within the buffer.
    pub directory_offset: usize,
}

/// The located end of central directory record and its directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipDirectory {
    pub eocd_offset: usize,
    pub cd_offset: u32,
    pub cd_size: u32,
    pub total_entries: u16,
    pub comment: Vec<u8>,
    pub entries: Vec<CentralEntry>,
}

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("end of central directory record not found")]
    EocdNotFound,
    #[error("{what} at byte {at} runs past end of buffer")]
    Truncated { at: usize, what: &'static str },
    #[error("bad {what} signature at byte {at}")]
    BadSignature { at: usize, what: &'static str },
    #[error("entry {name}: unsupported compression method {method}")]
    UnsupportedMethod { name: String, method: u16 },
    #[error("entry {name}: CRC-32 mismatch (expected {expected:08x}, got {actual:08x})")]
    CrcMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },
    #[error("inflate failed: {0}")]
    Inflate(#[from] io::Error),
}

/// Locate the EOCD record and parse every central directory entry.
pub fn read_directory(buf: &[u8]) -> Result<ZipDirectory, InspectError> {
    let eocd = scan::rfind_u32_le(buf, EOCD_SIGNATURE, EOCD_LEN, EOCD_SEARCH_WINDOW)
        .ok_or(InspectError::EocdNotFound)?;
    let truncated = |at, what| InspectError::Truncated { at, what };

    let total_entries = read_u16_le(buf, eocd + field::EOCD_TOTAL_ENTRIES)
        .ok_or(truncated(eocd, "end of central directory"))?;
    let cd_size = read_u32_le(buf, eocd + field::EOCD_CD_SIZE)
        .ok_or(truncated(eocd, "end of central directory"))?;
    let cd_offset = read_u32_le(buf, eocd + field::EOCD_CD_OFFSET)
        .ok_or(truncated(eocd, "end of central directory"))?;
    let comment_len = read_u16_le(buf, eocd + field::EOCD_COMMENT_LEN)
        .ok_or(truncated(eocd, "end of central directory"))? as usize;
    let comment_start = eocd + EOCD_LEN;
    let comment = buf[comment_start..(comment_start + comment_len).min(buf.len())].to_vec();

    let mut entries = Vec::with_capacity(total_entries as usize);
    let mut cursor = cd_offset as usize;
    for _ in 0..total_entries {
        let header = buf
            .get(cursor..)
            .and_then(|rest| rest.get(..CENTRAL_HEADER_LEN))
            .ok_or(truncated(cursor, "central directory entry"))?;
        if read_u32_le(header, 0) != Some(CENTRAL_HEADER_SIGNATURE) {
            return Err(InspectError::BadSignature {
                at: cursor,
                what: "central directory",
            });
        }
        let u16_at = |off| read_u16_le(header, off).unwrap_or(0);
        let u32_at = |off| read_u32_le(header, off).unwrap_or(0);

        let name_len = u16_at(field::CD_NAME_LEN) as usize;
        let extra_len = u16_at(field::CD_EXTRA_LEN) as usize;
        let comment_len = u16_at(field::CD_COMMENT_LEN) as usize;
        let name_start = cursor + CENTRAL_HEADER_LEN;
        let name = buf
            .get(name_start..name_start + name_len)
            .ok_or(truncated(cursor, "central directory entry name"))?;

        entries.push(CentralEntry {
            name: String::from_utf8_lossy(name).into_owned(),
            method: u16_at(field::CD_METHOD),
            crc32: u32_at(field::CD_CRC32),
            compressed_size: u32_at(field::CD_COMPRESSED_SIZE),
            uncompressed_size: u32_at(field::CD_UNCOMPRESSED_SIZE),
            local_header_offset: u32_at(field::CD_LOCAL_OFFSET),
            directory_offset: cursor,
        });
        cursor = name_start + name_len + extra_len + comment_len;
    }

    Ok(ZipDirectory {
        eocd_offset: eocd,
        cd_offset,
        cd_size,
        total_entries,
        comment,
        entries,
    })
}

/// Read and decompress an entry through its local header, verifying CRC-32.
pub fn read_entry(buf: &[u8], entry: &CentralEntry) -> Result<Vec<u8>, InspectError> {
    let at = entry.local_header_offset as usize;
    let header = buf
        .get(at..)
        .and_then(|rest| rest.get(..LOCAL_HEADER_LEN))
        .ok_or(InspectError::Truncated {
            at,
            what: "local header",
        })?;
    if read_u32_le(header, 0) != Some(LOCAL_HEADER_SIGNATURE) {
        return Err(InspectError::BadSignature {
            at,
            what: "local header",
        });
    }
    let name_len = read_u16_le(header, field::LOCAL_NAME_LEN).unwrap_or(0) as usize;
    let extra_len = read_u16_le(header, field::LOCAL_EXTRA_LEN).unwrap_or(0) as usize;
    let data_start = at + LOCAL_HEADER_LEN + name_len + extra_len;
    let data = buf
        .get(data_start..)
        .and_then(|rest| rest.get(..entry.compressed_size as usize))
        .ok_or(InspectError::Truncated {
            at: data_start,
            what: "entry data",
        })?;

    let plain = match entry.method {
        0 => data.to_vec(),
        8 => {
            let mut out = Vec::with_capacity((entry.uncompressed_size as usize).min(data.len() * 4));
            DeflateDecoder::new(data).read_to_end(&mut out)?;
            out
        }
        method => {
            return Err(InspectError::UnsupportedMethod {
                name: entry.name.clone(),
                method,
            });
        }
    };

    let mut crc = flate2::Crc::new();
    crc.update(&plain);
    if crc.sum() != entry.crc32 {
        return Err(InspectError::CrcMismatch {
            name: entry.name.clone(),
            expected: entry.crc32,
            actual: crc.sum(),
        });
    }
    Ok(plain)
}
