#![forbid(unsafe_code)]
//! conformkit: Tcl test-suite stub generation and containerized conformance runs
//!
//! Two independent halves:
//!
//! - **Extraction** (`conformkit_syntax` + [`backend`]): scan a vendor `.tcl` test file for `test` declarations
//!   and emit one expected-to-fail pytest stub per declaration.
//! - **Conformance** ([`runner`]): build the suite image, run the vendor runner in a container against a live
//!   instance, persist `<tags>.docker.log`, and report the exit status.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod backend;
pub mod cli;
pub mod runner;
pub mod version;

pub use conformkit_syntax as syntax;

pub use backend::{StubGenerator, StubStyle, SuiteGenerator};
pub use runner::{ConformanceRequest, ConformanceVariant, RunOutcome, RunnerConfig, RunnerError, run_conformance};
