//! Python code emitter - builds pytest source text with proper indentation.

/// A buffer for building Python source code with 4-space indentation.
#[derive(Debug)]
pub struct PyEmitter {
    buffer: String,
    indent_level: usize,
    indent_str: &'static str,
}

impl Default for PyEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl PyEmitter {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
            indent_str: "    ",
        }
    }

    /// Get the generated code
    pub fn finish(self) -> String {
        self.buffer
    }

    /// Get current buffer as string slice
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Write a line with current indentation
    pub fn line(&mut self, s: &str) {
        self.write_indent();
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// Write a `#` comment line; empty text yields a bare `#`.
    ///
    /// Line terminators, vertical tab, form feed and NUL are replaced by spaces so the comment stays on one
    /// physical line and the module still tokenizes.
    pub fn comment(&mut self, text: &str) {
        if text.is_empty() {
            self.line("#");
        } else {
            let text = text.replace(['\r', '\n', '\x0b', '\x0c', '\0'], " ");
            self.line(&format!("# {}", text));
        }
    }

    /// Write a blank line
    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    /// Write indentation only
    pub fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.buffer.push_str(self.indent_str);
        }
    }

    /// Increase indent level
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    /// Decrease indent level
    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// Write a suite: `header:` followed by an indented body
    pub fn suite<F>(&mut self, header: &str, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.line(&format!("{}:", header));
        self.indent();
        f(self);
        self.dedent();
    }
}

/// Escape text for a double-quoted Python string literal.
pub fn py_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
