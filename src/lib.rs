//! Polymux: media + PDF + ZIP polyglot assembly in Rust.
//!
//! A polyglot is a media file with a report document and an archive appended
//! to it. Media players read it from the front, PDF readers find the
//! document through its cross-reference table, and ZIP tools find the
//! archive through the end-of-central-directory record at the tail. The
//! appended containers only resolve if their absolute offsets are shifted
//! by the bytes that precede them, which is what this crate does.
//!
//! The crate provides:
//! - Byte-pattern scanning (`scan`)
//! - Offset patchers for the document (`pdf::patch`) and archive (`zip::patch`)
//! - Baseline builders (`pdf::render`, `zip::build`) and read-only
//!   inspectors (`pdf::inspect`, `zip::inspect`)
//! - The assembler (`assemble`) and the analysis model feeding it (`analysis`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use polymux::assemble::assemble;
//! use polymux::zip;
//!
//! let media = std::fs::read("clip.mp4").unwrap();
//! let out = assemble(&media, "video/mp4", "A short summary.", "The transcript.").unwrap();
//! assert_eq!(&out.bytes[..media.len()], &media[..]);
//!
//! let dir = zip::read_directory(&out.bytes).unwrap();
//! assert_eq!(dir.entries[0].name, "report.pdf");
//! ```

pub mod analysis;
pub mod assemble;
pub mod io;
pub mod outcome;
pub mod pdf;
pub mod scan;
pub mod zip;

#[cfg(feature = "cli")]
pub mod cli;

pub use assemble::{AssembleError, AssembleOptions, Assembler, Assembly, Layout};
pub use outcome::{PatchOutcome, Patched, SkipReason};
