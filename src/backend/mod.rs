//! Stub generation backend
//!
//! Turns scanned test declarations into pytest source text.
//!
//! The pipeline is:
//! 1. `conformkit_syntax::scanner` → ordered `TestDeclaration`s
//! 2. `StubGenerator` → one xfail stub per declaration, under a fixed two-line header
//! 3. `SuiteGenerator` → one `test_<stem>.py` per vendor `.tcl` file (batch mode)
//!
//! ## Module Organization
//!
//! - `py_emitter.rs` - Low-level Python code string builder
//! - `stubgen.rs` - Stub rendering and style
//! - `suite.rs` - Vendor tree discovery and module writing

pub mod py_emitter;
pub mod stubgen;
pub mod suite;

pub use stubgen::{HEADER_LINES, StubGenerator, StubStyle, TestStub};
pub use suite::{GenerateError, GeneratedModule, SuiteGenerator, TYPE_TESTS_SUBPATH};
