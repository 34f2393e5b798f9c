// ZIP archive support (Zip32 only).
//
// - `patch`   - EOCD + central directory offset patching
// - `build`   - baseline archive writer (stored / deflated entries)
// - `inspect` - read-only directory walker and entry reader

pub mod build;
pub mod inspect;
pub mod patch;

pub use build::{ArchiveBuilder, ArchiveEntry, ArchiveError, DosDateTime, Method, ZipBuilder};
pub use inspect::{CentralEntry, InspectError, ZipDirectory, read_directory, read_entry};
pub use patch::patch_archive;

// ---------------------------------------------------------------------------
// Record signatures
// ---------------------------------------------------------------------------

pub const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
pub const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
pub const EOCD_SIGNATURE: u32 = 0x0605_4b50;

// ---------------------------------------------------------------------------
// Record sizes
// ---------------------------------------------------------------------------

pub const LOCAL_HEADER_LEN: usize = 30;
pub const CENTRAL_HEADER_LEN: usize = 46;
pub const EOCD_LEN: usize = 22;
pub const MAX_COMMENT_LEN: usize = u16::MAX as usize;

/// Tail window searched for the EOCD signature.
pub const EOCD_SEARCH_WINDOW: usize = EOCD_LEN + MAX_COMMENT_LEN;

// ---------------------------------------------------------------------------
// Field positions, relative to the start of their record
// ---------------------------------------------------------------------------

pub(crate) mod field {
    // End of central directory.
    pub const EOCD_TOTAL_ENTRIES: usize = 10;
    pub const EOCD_CD_SIZE: usize = 12;
    pub const EOCD_CD_OFFSET: usize = 16;
    pub const EOCD_COMMENT_LEN: usize = 20;

    // Central directory header.
    pub const CD_METHOD: usize = 10;
    pub const CD_CRC32: usize = 16;
    pub const CD_COMPRESSED_SIZE: usize = 20;
    pub const CD_UNCOMPRESSED_SIZE: usize = 24;
    pub const CD_NAME_LEN: usize = 28;
    pub const CD_EXTRA_LEN: usize = 30;
    pub const CD_COMMENT_LEN: usize = 32;
    pub const CD_LOCAL_OFFSET: usize = 42;

    // Local file header.
    pub const LOCAL_NAME_LEN: usize = 26;
    pub const LOCAL_EXTRA_LEN: usize = 28;
}
