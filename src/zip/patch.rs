// Central directory offset patching.
//
// Shifts the central directory offset stored in the EOCD record and the
// local header offset stored in every central directory entry by
// `added_base`, so the archive resolves when it is placed at that byte
// position inside a larger stream. Readers locate the EOCD from the end of
// the stream, so nothing else in the archive needs to move.

use super::{
    CENTRAL_HEADER_LEN, CENTRAL_HEADER_SIGNATURE, EOCD_LEN, EOCD_SEARCH_WINDOW, EOCD_SIGNATURE,
    field,
};
use crate::outcome::{Patched, SkipReason};
use crate::scan;

/// Shift the central directory and local header offsets by `added_base`.
///
/// The directory walk starts at the *original* central directory offset and
/// runs for the entry count the EOCD declares. It stops early at the first
/// entry without a central header signature (or whose fixed header would
/// run past the buffer); entries after that point are left as they were and
/// the outcome reports `patched < declared`.
///
/// Returns the buffer untouched when no EOCD record is found in the tail
/// window, or when any shifted offset would not fit in 32 bits.
pub fn patch_archive(zip: Vec<u8>, added_base: u64) -> Patched {
    let plan = match plan_edits(&zip, added_base) {
        Ok(plan) => plan,
        Err(reason) => {
            log::warn!("archive offsets left unpatched: {reason}");
            return Patched::skipped(zip, reason);
        }
    };

    let mut zip = zip;
    for &(at, value) in &plan.edits {
        zip[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    if plan.patched < plan.declared {
        log::warn!(
            "archive: central directory walk stopped after {} of {} entries",
            plan.patched,
            plan.declared
        );
    } else {
        log::debug!(
            "archive: shifted central directory and {} local header offsets by {added_base}",
            plan.patched
        );
    }
    Patched::applied(zip, plan.declared, plan.patched)
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

struct Plan {
    edits: Vec<(usize, u32)>,
    declared: usize,
    patched: usize,
}

fn plan_edits(zip: &[u8], added_base: u64) -> Result<Plan, SkipReason> {
    let eocd = scan::rfind_u32_le(zip, EOCD_SIGNATURE, EOCD_LEN, EOCD_SEARCH_WINDOW)
        .ok_or(SkipReason::MarkerNotFound("end of central directory"))?;

    let cd_offset = scan::read_u32_le(zip, eocd + field::EOCD_CD_OFFSET)
        .ok_or(SkipReason::OutOfBounds("end of central directory"))?;
    let declared = scan::read_u16_le(zip, eocd + field::EOCD_TOTAL_ENTRIES)
        .ok_or(SkipReason::OutOfBounds("end of central directory"))? as usize;

    let mut edits = Vec::with_capacity(declared + 1);
    edits.push((
        eocd + field::EOCD_CD_OFFSET,
        rebase(cd_offset, added_base).ok_or(SkipReason::Overflow("central directory offset"))?,
    ));

    let mut cursor = cd_offset as usize;
    let mut patched = 0;
    for _ in 0..declared {
        if scan::read_u32_le(zip, cursor) != Some(CENTRAL_HEADER_SIGNATURE)
            || cursor + CENTRAL_HEADER_LEN > zip.len()
        {
            break;
        }

        let local = read_u32(zip, cursor + field::CD_LOCAL_OFFSET);
        edits.push((
            cursor + field::CD_LOCAL_OFFSET,
            rebase(local, added_base).ok_or(SkipReason::Overflow("local header offset"))?,
        ));
        patched += 1;

        let name_len = read_u16(zip, cursor + field::CD_NAME_LEN);
        let extra_len = read_u16(zip, cursor + field::CD_EXTRA_LEN);
        let comment_len = read_u16(zip, cursor + field::CD_COMMENT_LEN);
        cursor += CENTRAL_HEADER_LEN + name_len + extra_len + comment_len;
    }

    Ok(Plan {
        edits,
        declared,
        patched,
    })
}

fn rebase(value: u32, added_base: u64) -> Option<u32> {
    u64::from(value)
        .checked_add(added_base)
        .and_then(|v| u32::try_from(v).ok())
}

// Callers have already checked that the fixed header is in bounds.
fn read_u32(zip: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([zip[at], zip[at + 1], zip[at + 2], zip[at + 3]])
}

fn read_u16(zip: &[u8], at: usize) -> usize {
    u16::from_le_bytes([zip[at], zip[at + 1]]) as usize
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
