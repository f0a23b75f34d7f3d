//! Line-oriented extraction of test declarations from Tcl test-suite sources.
//!
//! This crate is dependency-light and has no notion of the output test framework: it turns DSL text into an
//! ordered list of [`TestDeclaration`]s, each carrying a derived identifier. Rendering stubs is the job of the
//! `conformkit` backend.
//!
//! ## Notes
//! - Recognition is a prefix check on the trimmed line (`test ...`). The Tcl grammar is deliberately not parsed.
//! - Extraction is total over text: unmatched lines are skipped and nothing in here can fail except reading.
//!
//! ## Examples
//! ```rust
//! use conformkit_syntax::{scanner, ScanOptions};
//!
//! let src = "start_server {} {\n    test {INCR against non existing key} {\n        assert 1\n    }\n}\n";
//! let decls = scanner::scan(src, &ScanOptions::default());
//! assert_eq!(decls.len(), 1);
//! assert_eq!(decls[0].identifier, "incr_against_non_existing_key");
//! ```

pub mod naming;
pub mod scanner;

pub use naming::{DedupePolicy, IdentifierRegistry, derive_identifier, function_name, is_legal_identifier};
pub use scanner::{CaptureMode, ScanOptions, TestDeclaration};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while extracting declarations.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot read DSL source '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read a DSL file and scan it for test declarations.
///
/// ## Errors
/// - [`ExtractError::Read`] when the file cannot be opened or is not valid UTF-8.
pub fn extract_file(path: &Path, options: &ScanOptions) -> Result<Vec<TestDeclaration>, ExtractError> {
    let source = fs::read_to_string(path).map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let decls = scanner::scan(&source, options);
    tracing::debug!(path = %path.display(), declarations = decls.len(), "scanned DSL source");
    Ok(decls)
}
