#![no_main]
use libfuzzer_sys::fuzz_target;
use polymux::analysis::AnalysisResult;
use polymux::{pdf, zip};

fuzz_target!(|data: &[u8]| {
    // Inspectors must only return errors on malformed input.
    let _ = pdf::read_xref(data);
    if let Ok(dir) = zip::read_directory(data) {
        for entry in dir.entries.iter().take(16) {
            let _ = zip::read_entry(data, entry);
        }
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = AnalysisResult::from_json(text);
    }
});
