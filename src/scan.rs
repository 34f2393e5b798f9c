// Byte-pattern scanning shared by the document and archive patchers.
//
// Exact forward subsequence search, single-byte search, and a bounded
// backward scan for little-endian 4-byte record signatures. All functions
// are pure and never panic on short or empty inputs.

// ---------------------------------------------------------------------------
// Forward search
// ---------------------------------------------------------------------------

/// Find the first occurrence of `needle` in `haystack` starting at or after
/// `from`. Returns the absolute index of the match.
///
/// An empty needle matches at `from` as long as `from <= haystack.len()`.
pub fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(from);
    }
    if needle.len() > haystack.len() - from {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

/// Find the first occurrence of `byte` at or after `from`.
#[inline]
pub fn find_byte(haystack: &[u8], byte: u8, from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .iter()
        .position(|&b| b == byte)
        .map(|pos| pos + from)
}

// ---------------------------------------------------------------------------
// Backward signature search
// ---------------------------------------------------------------------------

/// Scan backward for a little-endian `u32` signature.
///
/// The first candidate is `len - record_len` (a record of `record_len` bytes
/// must fit after the signature); the last candidate is
/// `len - min(len, window)`. Candidates are visited from the end toward the
/// start and the first (i.e. highest) match wins.
pub fn rfind_u32_le(haystack: &[u8], signature: u32, record_len: usize, window: usize) -> Option<usize> {
    let len = haystack.len();
    if len < record_len.max(4) {
        return None;
    }
    let sig = signature.to_le_bytes();
    let first = len - record_len.max(4);
    let last = len - window.min(len);
    if first < last {
        return None;
    }
    (last..=first).rev().find(|&i| haystack[i..i + 4] == sig)
}

// ---------------------------------------------------------------------------
// Little-endian field access
// ---------------------------------------------------------------------------

#[inline]
pub(crate) fn read_u16_le(buf: &[u8], at: usize) -> Option<u16> {
    let b = buf.get(at..at.checked_add(2)?)?;
    Some(u16::from_le_bytes([b[0], b[1]]))
}

#[inline]
pub(crate) fn read_u32_le(buf: &[u8], at: usize) -> Option<u32> {
    let b = buf.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_first_occurrence() {
        let hay = b"abc xref abc xref";
        assert_eq!(find(hay, b"xref", 0), Some(4));
        assert_eq!(find(hay, b"xref", 5), Some(13));
        assert_eq!(find(hay, b"xref", 14), None);
    }

    #[test]
    fn find_at_very_end() {
        let hay = b"....%%EOF";
        assert_eq!(find(hay, b"%%EOF", 0), Some(4));
        assert_eq!(find(hay, b"%%EOF", 4), Some(4));
    }

    #[test]
    fn find_needle_longer_than_rest() {
        assert_eq!(find(b"abc", b"abcd", 0), None);
        assert_eq!(find(b"abcabc", b"abc", 4), None);
    }

    #[test]
    fn find_from_out_of_range() {
        assert_eq!(find(b"abc", b"a", 10), None);
        assert_eq!(find(b"", b"a", 0), None);
    }

    #[test]
    fn find_empty_needle() {
        assert_eq!(find(b"abc", b"", 1), Some(1));
        assert_eq!(find(b"abc", b"", 3), Some(3));
        assert_eq!(find(b"abc", b"", 4), None);
    }

    #[test]
    fn find_byte_line_feeds() {
        let hay = b"one\ntwo\nthree";
        assert_eq!(find_byte(hay, b'\n', 0), Some(3));
        assert_eq!(find_byte(hay, b'\n', 4), Some(7));
        assert_eq!(find_byte(hay, b'\n', 8), None);
        assert_eq!(find_byte(hay, b'\n', 100), None);
    }

    #[test]
    fn rfind_prefers_last_match() {
        let mut hay = vec![0u8; 64];
        hay[8..12].copy_from_slice(&0x0605_4b50u32.to_le_bytes());
        hay[30..34].copy_from_slice(&0x0605_4b50u32.to_le_bytes());
        assert_eq!(rfind_u32_le(&hay, 0x0605_4b50, 22, 1000), Some(30));
    }

    #[test]
    fn rfind_respects_record_len() {
        // Signature too close to the end to hold a 22-byte record.
        let mut hay = vec![0u8; 40];
        hay[30..34].copy_from_slice(&0x0605_4b50u32.to_le_bytes());
        assert_eq!(rfind_u32_le(&hay, 0x0605_4b50, 22, 1000), None);
        hay[18..22].copy_from_slice(&0x0605_4b50u32.to_le_bytes());
        assert_eq!(rfind_u32_le(&hay, 0x0605_4b50, 22, 1000), Some(18));
    }

    #[test]
    fn rfind_respects_window() {
        let mut hay = vec![0u8; 200];
        hay[10..14].copy_from_slice(&0xAABB_CCDDu32.to_le_bytes());
        // Window covers only the last 100 bytes.
        assert_eq!(rfind_u32_le(&hay, 0xAABB_CCDD, 22, 100), None);
        assert_eq!(rfind_u32_le(&hay, 0xAABB_CCDD, 22, 190), Some(10));
    }

    #[test]
    fn rfind_short_inputs() {
        assert_eq!(rfind_u32_le(&[], 1, 22, 100), None);
        assert_eq!(rfind_u32_le(&[0u8; 21], 0, 22, 100), None);
        assert_eq!(rfind_u32_le(&[0u8; 22], 0, 22, 100), Some(0));
    }

    #[test]
    fn le_readers_bounds() {
        let buf = [0x50, 0x4b, 0x05, 0x06, 0x01];
        assert_eq!(read_u32_le(&buf, 0), Some(0x0605_4b50));
        assert_eq!(read_u16_le(&buf, 3), Some(0x0106));
        assert_eq!(read_u32_le(&buf, 2), None);
        assert_eq!(read_u16_le(&buf, usize::MAX), None);
    }
}
