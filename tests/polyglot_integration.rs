use polymux::analysis::{AnalysisResult, Sentiment};
use polymux::assemble::{AssembleOptions, Assembler, Assembly};
use polymux::pdf::{self, DocumentRenderer, ReportRenderer};
use polymux::zip::{self, ArchiveBuilder, ArchiveEntry, Method, ZipBuilder};
use polymux::{PatchOutcome, SkipReason};

fn gen_media(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.push((s >> 33) as u8);
    }
    out
}

fn assembler(method: Method) -> Assembler {
    Assembler::from_options(&AssembleOptions {
        method,
        timestamp: false,
        ..Default::default()
    })
}

fn assert_document_resolves(asm: &Assembly) {
    let table = pdf::read_xref(&asm.bytes).unwrap();
    assert!(table.table_offset as usize >= asm.layout.document_start());
    assert!(asm.bytes[table.table_offset as usize..].starts_with(b"xref"));
    let mut resolved = 0;
    for entry in table.in_use() {
        let at = entry.offset as usize;
        let header = format!("{} 0 obj", entry.object);
        assert!(
            asm.bytes[at..].starts_with(header.as_bytes()),
            "object {} not at {at}",
            entry.object
        );
        resolved += 1;
    }
    assert!(resolved >= 5);
}

fn assert_archive_resolves(asm: &Assembly, summary: &str, transcript: &str) {
    let dir = zip::read_directory(&asm.bytes).unwrap();
    assert_eq!(dir.eocd_offset, asm.bytes.len() - 22);
    assert_eq!(dir.total_entries, 3);
    let names: Vec<_> = dir.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["report.pdf", "transcript.txt", "summary.md"]);
    for entry in &dir.entries {
        let at = entry.local_header_offset as usize;
        assert!(at >= asm.layout.archive_start());
        assert_eq!(&asm.bytes[at..at + 4], b"PK\x03\x04");
    }
    assert_eq!(zip::read_entry(&asm.bytes, &dir.entries[1]).unwrap(), transcript.as_bytes());
    assert_eq!(zip::read_entry(&asm.bytes, &dir.entries[2]).unwrap(), summary.as_bytes());

    // The archived report is the standalone rendering.
    let report = zip::read_entry(&asm.bytes, &dir.entries[0]).unwrap();
    let table = pdf::read_xref(&report).unwrap();
    for entry in table.in_use() {
        let header = format!("{} 0 obj", entry.object);
        assert!(report[entry.offset as usize..].starts_with(header.as_bytes()));
    }
}

#[test]
fn stored_polyglot_resolves_all_three_views() {
    let media = gen_media(64 * 1024, 1);
    let summary = "The team reviewed the roadmap.";
    let transcript = "Okay, let's start. First item is the roadmap.";
    let asm = assembler(Method::Stored)
        .assemble(&media, "video/mp4", summary, transcript)
        .unwrap();

    assert_eq!(&asm.bytes[..media.len()], &media[..]);
    assert_eq!(asm.bytes.len(), asm.layout.total_len());
    assert_eq!(asm.archive, PatchOutcome::Applied { declared: 3, patched: 3 });
    assert_document_resolves(&asm);
    assert_archive_resolves(&asm, summary, transcript);
}

#[test]
fn deflated_polyglot_resolves() {
    let media = gen_media(10_000, 2);
    let summary = "summary ".repeat(100);
    let transcript = "words spoken aloud ".repeat(500);
    let asm = assembler(Method::Deflated)
        .assemble(&media, "video/webm", &summary, &transcript)
        .unwrap();
    assert_document_resolves(&asm);
    assert_archive_resolves(&asm, &summary, &transcript);

    let dir = zip::read_directory(&asm.bytes).unwrap();
    assert_eq!(dir.entries[1].method, 8);
}

#[test]
fn media_with_decoy_signatures() {
    // Media that happens to contain archive and document markers.
    let mut media = gen_media(4096, 3);
    media.extend_from_slice(b"PK\x05\x06\0\0\0\0\x01\0\x01\0");
    media.extend_from_slice(b"\nxref\n0 1\n0000000000 65535 f \nstartxref\n9\n%%EOF\n");
    media.extend_from_slice(&gen_media(4096, 4));

    let asm = assembler(Method::Stored)
        .assemble(&media, "video/mp4", "s", "t")
        .unwrap();
    assert!(asm.document.is_applied());
    assert_archive_resolves(&asm, "s", "t");

    let dir = zip::read_directory(&asm.bytes).unwrap();
    assert!(dir.eocd_offset > asm.layout.archive_start());
}

#[test]
fn long_transcript_is_cut_in_report_only() {
    // 834 six-character words; the 3000-character cut falls right after w0499.
    let transcript: String = (0..834).map(|i| format!("w{i:04} ")).collect();
    let asm = assembler(Method::Stored)
        .assemble(b"media", "video/mp4", "s", &transcript)
        .unwrap();
    let dir = zip::read_directory(&asm.bytes).unwrap();
    let report = zip::read_entry(&asm.bytes, &dir.entries[0]).unwrap();
    let text = String::from_utf8_lossy(&report);
    assert!(text.contains("w0499"));
    assert!(!text.contains("w0500"));
    assert!(text.contains("..."));
    assert_eq!(
        zip::read_entry(&asm.bytes, &dir.entries[1]).unwrap(),
        transcript.as_bytes()
    );
}

#[test]
fn analysis_result_feeds_assembly() {
    let analysis = AnalysisResult {
        transcript: "hello".into(),
        summary: "greeting".into(),
        key_points: vec!["a".into(), "b".into(), "c".into()],
        sentiment: Sentiment::Positive,
    };
    let asm = assembler(Method::Stored)
        .assemble_with(&analysis, &gen_media(100, 5), "video/mp4")
        .unwrap();
    assert_archive_resolves(&asm, "greeting", "hello");
}

#[test]
fn baselines_are_accepted_before_patching() {
    let doc = ReportRenderer::default().render("summary", "transcript").unwrap();
    let table = pdf::read_xref(&doc).unwrap();
    assert!(table.in_use().count() >= 5);

    let zip_bytes = ZipBuilder::default()
        .build(&[ArchiveEntry::new("a.txt", b"alpha")])
        .unwrap();
    let dir = zip::read_directory(&zip_bytes).unwrap();
    assert_eq!(zip::read_entry(&zip_bytes, &dir.entries[0]).unwrap(), b"alpha");
}

#[test]
fn document_scenario_from_offsets() {
    // Table at 200 recording objects at 9, 74, 120 and 179.
    let mut doc = b"%PDF-1.3\n".to_vec();
    doc.resize(199, b' ');
    doc.extend_from_slice(b"\nxref\n0 5\n0000000000 65535 f \n");
    for off in [9u64, 74, 120, 179] {
        doc.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    doc.extend_from_slice(b"trailer\n<< /Size 5 >>\nstartxref\n200\n%%EOF\n");
    doc.extend_from_slice(&[b'\n'; 16]);
    let len = doc.len();

    let patched = pdf::patch_document(doc, 1000);
    assert_eq!(patched.outcome, PatchOutcome::Applied { declared: 5, patched: 5 });
    assert_eq!(patched.bytes.len(), len);
    let text = String::from_utf8_lossy(&patched.bytes);
    for expected in ["0000001000 65535 f", "0000001009", "0000001074", "0000001120", "0000001179"] {
        assert!(text.contains(expected), "missing {expected}");
    }
    assert!(text.contains("startxref\n1200\n%%EOF\n"));
}

#[test]
fn unpatchable_inputs_come_back_unchanged() {
    let doc = b"%PDF-1.7 with a cross-reference stream only".to_vec();
    let patched = pdf::patch_document(doc.clone(), 1000);
    assert_eq!(patched.bytes, doc);
    assert!(matches!(patched.outcome, PatchOutcome::Skipped(SkipReason::MarkerNotFound(_))));

    let zip_bytes = b"PK\x03\x04 but no directory".to_vec();
    let patched = zip::patch_archive(zip_bytes.clone(), 1000);
    assert_eq!(patched.bytes, zip_bytes);
    assert!(!patched.outcome.is_applied());
}
