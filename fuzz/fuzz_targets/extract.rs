#![no_main]

use conformkit::StubGenerator;
use conformkit::syntax::{CaptureMode, DedupePolicy, ScanOptions, scanner};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Extraction is total over text; only valid UTF-8 reaches it.
    if let Ok(s) = std::str::from_utf8(data) {
        let options = ScanOptions::new()
            .with_capture(CaptureMode::Block)
            .with_dedupe(DedupePolicy::OrdinalSuffix);
        let decls = scanner::scan(s, &options);
        let out = StubGenerator::default().generate(s, &options);
        assert!(out.matches("assert False\n").count() >= decls.len());
        assert!(!out.contains('\r'));
    }
});
