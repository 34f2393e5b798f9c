use polymux::pdf::patch::render_entry_offset;
use polymux::pdf::{self, DocumentRenderer, ReportRenderer};
use polymux::scan;
use polymux::zip::{self, ArchiveBuilder, ArchiveEntry, Method, ZipBuilder};
use proptest::prelude::*;

fn naive_find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    (from..=haystack.len().saturating_sub(needle.len()))
        .find(|&i| i + needle.len() <= haystack.len() && &haystack[i..i + needle.len()] == needle)
}

proptest! {
    #[test]
    fn prop_document_patch_is_fail_open(
        doc in proptest::collection::vec(any::<u8>(), 0..2048),
        base in any::<u64>()
    ) {
        let patched = pdf::patch_document(doc.clone(), base);
        prop_assert_eq!(patched.bytes.len(), doc.len());
        if !patched.outcome.is_applied() {
            prop_assert_eq!(patched.bytes, doc);
        }
    }

    #[test]
    fn prop_archive_patch_is_fail_open(
        zip_bytes in proptest::collection::vec(any::<u8>(), 0..2048),
        base in any::<u64>()
    ) {
        let patched = zip::patch_archive(zip_bytes.clone(), base);
        prop_assert_eq!(patched.bytes.len(), zip_bytes.len());
        if !patched.outcome.is_applied() {
            prop_assert_eq!(patched.bytes, zip_bytes);
        }
    }

    #[test]
    fn prop_patched_document_resolves_at_base(
        summary in "[a-zA-Z ]{0,200}",
        transcript in "[a-zA-Z .,]{0,2000}",
        base in 0usize..50_000
    ) {
        let doc = ReportRenderer::default().render(&summary, &transcript).unwrap();
        let patched = pdf::patch_document(doc.clone(), base as u64);
        prop_assert!(patched.outcome.is_applied());

        let mut stream = vec![0u8; base];
        stream.extend_from_slice(&patched.bytes);
        let table = pdf::read_xref(&stream).unwrap();
        let original = pdf::read_xref(&doc).unwrap();
        prop_assert_eq!(table.entries.len(), original.entries.len());
        for (shifted, entry) in table.entries.iter().zip(&original.entries) {
            prop_assert_eq!(shifted.offset, entry.offset + base as u64);
        }
    }

    #[test]
    fn prop_patched_archive_resolves_at_base(
        entries in proptest::collection::vec(
            ("[a-z]{1,12}\\.txt", proptest::collection::vec(any::<u8>(), 0..512)),
            1..6
        ),
        deflate in any::<bool>(),
        base in 0usize..50_000
    ) {
        let builder = ZipBuilder::new(if deflate { Method::Deflated } else { Method::Stored });
        let members: Vec<_> = entries
            .iter()
            .map(|(name, data)| ArchiveEntry::new(name, data))
            .collect();
        let archive = builder.build(&members).unwrap();
        let patched = zip::patch_archive(archive, base as u64);
        prop_assert!(patched.outcome.is_applied());
        prop_assert!(!patched.outcome.is_partial());

        let mut stream = vec![0u8; base];
        stream.extend_from_slice(&patched.bytes);
        let dir = zip::read_directory(&stream).unwrap();
        prop_assert_eq!(dir.entries.len(), entries.len());
        for (entry, (name, data)) in dir.entries.iter().zip(&entries) {
            prop_assert_eq!(&entry.name, name);
            prop_assert_eq!(&zip::read_entry(&stream, entry).unwrap(), data);
        }
    }

    #[test]
    fn prop_entry_offset_is_fixed_width(value in any::<u64>()) {
        let field = render_entry_offset(value);
        prop_assert!(field.iter().all(u8::is_ascii_digit));
        if value < 10_000_000_000 {
            prop_assert_eq!(std::str::from_utf8(&field).unwrap().parse::<u64>().unwrap(), value);
        }
    }

    #[test]
    fn prop_find_matches_naive_search(
        haystack in proptest::collection::vec(0u8..4, 0..256),
        needle in proptest::collection::vec(0u8..4, 1..4),
        from in 0usize..300
    ) {
        let expected = if from > haystack.len() { None } else { naive_find(&haystack, &needle, from) };
        prop_assert_eq!(scan::find(&haystack, &needle, from), expected);
    }
}
