//! Declaration scanner for Tcl test sources.
//!
//! One pass over the lines of a file. A line whose trimmed text starts with `test` is a declaration; everything
//! else is skipped. Optionally the brace-balanced block that follows a declaration is captured as reference text.

use crate::naming::{self, DedupePolicy, IdentifierRegistry, TEST_KEYWORD};

/// How much source text is kept as reference for each declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    /// Only the declaration line itself.
    #[default]
    Line,
    /// The declaration line plus following lines until its braces balance.
    Block,
}

/// Options for [`scan`].
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub capture: CaptureMode,
    pub dedupe: DedupePolicy,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capture(mut self, capture: CaptureMode) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_dedupe(mut self, dedupe: DedupePolicy) -> Self {
        self.dedupe = dedupe;
        self
    }
}

/// A recognized test declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDeclaration {
    /// 1-based line number of the declaration.
    pub line: usize,
    /// Declaration line with surrounding whitespace stripped.
    pub text: String,
    /// Identifier derived from `text` (after dedupe, if enabled).
    pub identifier: String,
    /// Verbatim reference lines, starting with the declaration.
    pub reference: Vec<String>,
    /// Whether `identifier` collided with an earlier declaration in the same source.
    pub collided: bool,
}

/// Check whether a line declares a test case.
pub fn is_declaration(line: &str) -> bool {
    line.trim().starts_with(TEST_KEYWORD)
}

/// Scan DSL source text for test declarations, in source order.
pub fn scan(source: &str, options: &ScanOptions) -> Vec<TestDeclaration> {
    let lines = split_lines(source);
    let mut registry = IdentifierRegistry::new(options.dedupe);
    let mut decls = Vec::new();

    for (idx, raw) in lines.iter().enumerate() {
        let text = raw.trim();
        if !text.starts_with(TEST_KEYWORD) {
            continue;
        }

        let (identifier, collided) = registry.register(naming::derive_identifier(text));
        if collided {
            tracing::warn!(
                line = idx + 1,
                identifier = %identifier,
                "test declaration name collides with an earlier declaration"
            );
        }

        let reference = match options.capture {
            CaptureMode::Line => vec![text.to_string()],
            CaptureMode::Block => capture_block(&lines[idx..]),
        };

        decls.push(TestDeclaration {
            line: idx + 1,
            text: text.to_string(),
            identifier,
            reference,
            collided,
        });
    }

    decls
}

/// Split source on `\n`, `\r\n` and a lone `\r`.
///
/// A bare carriage return ends a line for the Python tokenizer, so it must end one here too: otherwise it would
/// leak into a derived name or cut a reference comment in two.
pub fn split_lines(source: &str) -> Vec<&str> {
    let bytes = source.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&source[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&source[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push(&source[start..]);
    }

    lines
}

/// Collect lines from the declaration until the braces it opens are closed.
///
/// The declaration line is trimmed; later lines keep their indentation (trailing whitespace is dropped). An
/// unterminated block runs to the end of input.
fn capture_block(lines: &[&str]) -> Vec<String> {
    let Some((first, rest)) = lines.split_first() else {
        return Vec::new();
    };

    let mut captured = vec![first.trim().to_string()];
    let mut depth = brace_delta(first);

    for line in rest {
        if depth <= 0 {
            break;
        }
        captured.push(line.trim_end().to_string());
        depth += brace_delta(line);
    }

    captured
}

/// Net brace depth change of a line, ignoring backslash-escaped characters.
fn brace_delta(line: &str) -> i64 {
    let mut delta = 0;
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '{' => delta += 1,
            '}' => delta -= 1,
            _ => {}
        }
    }
    delta
}
