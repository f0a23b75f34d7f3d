//! Tag filter composition for the vendor test runner.
//!
//! A tag filter is a space-separated list of labels; a leading `-` excludes. Whatever the caller asks for, the
//! baseline exclusions are appended: they name capabilities a candidate server cannot provide yet.

use std::path::{Path, PathBuf};

/// Capabilities excluded from every run: debug introspection, externally-managed instances, cluster mode,
/// replication, max-memory configuration and slow cases.
pub const BASELINE_EXCLUSIONS: [&str; 6] = [
    "-needs:debug",
    "-external:skip",
    "-cluster",
    "-repl",
    "-needs:config-maxmemory",
    "-slow",
];

/// Suffix of persisted container logs.
pub const LOG_SUFFIX: &str = ".docker.log";

/// Append the baseline exclusions to caller tags and trim the result.
pub fn compose_tags(tags: &str) -> String {
    format!("{} {}", tags, BASELINE_EXCLUSIONS.join(" "))
        .trim()
        .to_string()
}

/// Deterministic log file name for a caller tag set: `<tags>.docker.log`.
///
/// Empty tags map to `all`; whitespace and path separators become `_` so the key stays one file name.
/// The mapping is not injective: `a b`, `a/b` and `a_b` share a log file, and the latest run overwrites it.
pub fn log_file_name(tags: &str) -> String {
    let key: String = tags
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let key = if key.is_empty() { "all".to_string() } else { key };
    format!("{key}{LOG_SUFFIX}")
}

/// Full log path under a log directory.
pub fn log_path(log_dir: &Path, tags: &str) -> PathBuf {
    log_dir.join(log_file_name(tags))
}
