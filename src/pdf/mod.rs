// Page-description document support.
//
// - `patch`   - cross-reference table + startxref offset patching
// - `render`  - baseline report renderer (PDF 1.3, classic xref table)
// - `inspect` - read-only xref table locator

pub mod inspect;
pub mod patch;
pub mod render;

pub use inspect::{XrefEntry, XrefError, XrefTable, read_xref};
pub use patch::patch_document;
pub use render::{DocumentRenderer, RenderError, ReportRenderer};
