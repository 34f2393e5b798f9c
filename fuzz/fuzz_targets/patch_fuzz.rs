#![no_main]
use libfuzzer_sys::fuzz_target;
use polymux::{pdf, zip};

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }

    // First eight bytes pick the base offset.
    let (head, body) = data.split_at(8);
    let mut base_bytes = [0u8; 8];
    base_bytes.copy_from_slice(head);
    let base = u64::from_le_bytes(base_bytes);

    // Patchers must never panic, never resize, and hand back the input
    // unchanged whenever they skip.
    let doc = pdf::patch_document(body.to_vec(), base);
    assert_eq!(doc.bytes.len(), body.len());
    if !doc.outcome.is_applied() {
        assert_eq!(doc.bytes, body);
    }

    let archive = zip::patch_archive(body.to_vec(), base);
    assert_eq!(archive.bytes.len(), body.len());
    if !archive.outcome.is_applied() {
        assert_eq!(archive.bytes, body);
    }
});
