// Patch results shared by the document and archive patchers.
//
// A patcher never fails: it either rewrites the offsets it knows about or
// hands the input back untouched together with the reason it stopped.

use std::fmt;

/// Result of running a patcher over an owned buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patched {
    /// The buffer, either rewritten in place or byte-equal to the input.
    pub bytes: Vec<u8>,
    /// What the patcher did.
    pub outcome: PatchOutcome,
}

impl Patched {
    pub(crate) fn applied(bytes: Vec<u8>, declared: usize, patched: usize) -> Self {
        Self {
            bytes,
            outcome: PatchOutcome::Applied { declared, patched },
        }
    }

    pub(crate) fn skipped(bytes: Vec<u8>, reason: SkipReason) -> Self {
        Self {
            bytes,
            outcome: PatchOutcome::Skipped(reason),
        }
    }

    /// Consume the result, keeping only the bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Whether a patch was applied or skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Offsets were rewritten. `declared` is the entry count the structure
    /// announced; `patched` is how many entries were actually rewritten.
    Applied { declared: usize, patched: usize },
    /// The buffer was returned unmodified.
    Skipped(SkipReason),
}

impl PatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Applied, but fewer entries were rewritten than the structure declared.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Applied { declared, patched } if patched < declared)
    }

    /// Short machine-readable label (used for CLI/JSON output).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } if self.is_partial() => "partial",
            Self::Applied { .. } => "applied",
            Self::Skipped(_) => "skipped",
        }
    }
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied { declared, patched } if patched < declared => {
                write!(f, "partial ({patched} of {declared} entries)")
            }
            Self::Applied { patched, .. } => write!(f, "applied ({patched} entries)"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// Why a patcher left its input untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A structural marker (keyword or signature) was not found.
    MarkerNotFound(&'static str),
    /// A numeric field was not valid ASCII decimal.
    InvalidNumber(&'static str),
    /// The structure points outside the buffer.
    OutOfBounds(&'static str),
    /// A rewritten offset does not fit in its field.
    Overflow(&'static str),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkerNotFound(what) => write!(f, "{what} not found"),
            Self::InvalidNumber(what) => write!(f, "invalid number in {what}"),
            Self::OutOfBounds(what) => write!(f, "{what} runs past end of buffer"),
            Self::Overflow(what) => write!(f, "{what} overflows its field"),
        }
    }
}
