//! Golden snapshot tests for stub generation
//!
//! These tests render pytest stub modules from `.tcl` inputs and compare the output against stored snapshots.
//! Stub names are matched against hand-written ports, so any change here must be reviewed.
//!
//! Run with: `cargo test --test stub_snapshot_tests`
//! Review changes: `cargo insta review`

use conformkit::StubGenerator;
use conformkit::syntax::{CaptureMode, DedupePolicy, ScanOptions, is_legal_identifier, scanner};
use std::fs;

/// Load a test file from the stub_fixtures directory
fn load_fixture(name: &str) -> String {
    let path = format!("tests/stub_fixtures/{}.tcl", name);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read fixture: {}", path))
}

fn generate(source: &str, options: &ScanOptions) -> String {
    StubGenerator::default().generate(source, options)
}

#[test]
fn test_incr_line_capture() {
    let stubs = generate(&load_fixture("incr"), &ScanOptions::default());
    insta::assert_snapshot!("incr_line", stubs);
}

#[test]
fn test_incr_block_capture() {
    let options = ScanOptions::new().with_capture(CaptureMode::Block);
    let stubs = generate(&load_fixture("incr"), &options);
    insta::assert_snapshot!("incr_block", stubs);
}

#[test]
fn test_keyspace_dedupe() {
    let options = ScanOptions::new().with_dedupe(DedupePolicy::OrdinalSuffix);
    let stubs = generate(&load_fixture("keyspace"), &options);
    insta::assert_snapshot!("keyspace_dedupe", stubs);
}

/// Tcl variable interpolation survives derivation verbatim. The resulting names are not Python identifiers;
/// they are kept byte-stable and only warned about, so such modules need hand-porting before they import.
#[test]
fn test_zset_interpolated_names() {
    let source = load_fixture("zset");
    let stubs = generate(&source, &ScanOptions::default());
    insta::assert_snapshot!("zset_interpolated", stubs);

    let illegal: Vec<String> = scanner::scan(&source, &ScanOptions::default())
        .into_iter()
        .map(|d| d.identifier)
        .filter(|ident| !is_legal_identifier(ident))
        .collect();
    assert_eq!(illegal, vec!["zscore_$encoding", "zset_basic_zadd_and_score_update_$encoding"]);
}
