//! CLI module for conformkit
//!
//! ## Commands
//!
//! - `extract <file>` - Print pytest stubs for one Tcl test file
//! - `generate` - Write stub modules for every file under `<root>/tests/unit/type`
//! - `conform` - Run the vendor suite in a container against a live instance
//! - `tags` - Show the composed tag filter and log file for a variant
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::runner::ConformanceVariant;
use crate::runner::config::{DEFAULT_IMAGE, DEFAULT_RUNNER, DEFAULT_SERVER_BIN};
use crate::version::CONFORMKIT_VERSION;
use conformkit_syntax::{CaptureMode, DedupePolicy, ScanOptions};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// Generic failure, and a conformance run that exited non-zero
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The run never produced a verdict (preflight, build, start, retrieval)
    pub const SETUP_FAILURE: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Tcl test-suite stub generator and containerized conformance runner
#[derive(Parser, Debug)]
#[command(name = "conformkit")]
#[command(version = CONFORMKIT_VERSION)]
#[command(about = "Tcl test-suite stub generator and containerized conformance runner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// How much DSL text each stub keeps as reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CaptureArg {
    /// The declaration line only
    Line,
    /// The declaration and its brace-balanced body
    Block,
}

/// Options shared by `extract` and `generate`
#[derive(Args, Debug, Clone)]
pub struct StubArgs {
    /// Reference text kept inside each stub
    #[arg(long, value_enum, default_value = "line")]
    pub capture: CaptureArg,
    /// Append _2, _3, ... to colliding names instead of emitting duplicates
    #[arg(long)]
    pub dedupe: bool,
    /// Reason on the xfail marker
    #[arg(long, value_name = "TEXT", default_value = "not implemented")]
    pub xfail_reason: String,
    /// Name of the client fixture parameter
    #[arg(long, value_name = "NAME", default_value = "r")]
    pub fixture: String,
}

impl StubArgs {
    pub fn scan_options(&self) -> ScanOptions {
        let capture = match self.capture {
            CaptureArg::Line => CaptureMode::Line,
            CaptureArg::Block => CaptureMode::Block,
        };
        let dedupe = if self.dedupe {
            DedupePolicy::OrdinalSuffix
        } else {
            DedupePolicy::Keep
        };
        ScanOptions::new().with_capture(capture).with_dedupe(dedupe)
    }
}

/// Tag selection shared by `conform` and `tags`
#[derive(Args, Debug, Clone)]
pub struct TagArgs {
    /// Named tag preset
    #[arg(long, value_name = "NAME", conflicts_with = "tags")]
    pub variant: Option<ConformanceVariant>,
    /// Raw tag expression (space-separated, `-` excludes)
    #[arg(long, value_name = "EXPR", allow_hyphen_values = true)]
    pub tags: Option<String>,
}

impl TagArgs {
    /// Caller tags before baseline exclusions.
    pub fn caller_tags(&self) -> String {
        match (&self.variant, &self.tags) {
            (Some(variant), _) => variant.tags().to_string(),
            (None, Some(tags)) => tags.clone(),
            (None, None) => String::new(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print pytest stubs for one Tcl test file
    Extract {
        /// Tcl source file
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        stub: StubArgs,
    },

    /// Generate stub modules for <root>/tests/unit/type
    Generate {
        /// Vendor source tree root
        #[arg(long, value_name = "DIR", env = "VENDOR_ROOT")]
        root: PathBuf,
        /// Output directory (existing modules are overwritten)
        #[arg(long, value_name = "DIR", default_value = "generated")]
        out: PathBuf,
        #[command(flatten)]
        stub: StubArgs,
    },

    /// Run the vendor suite in a container against a live instance
    Conform {
        #[command(flatten)]
        tags: TagArgs,
        /// Instance host as seen from this machine
        #[arg(long, env = "CONFORM_HOST", default_value = "127.0.0.1")]
        host: String,
        /// Instance port
        #[arg(long, env = "CONFORM_PORT", default_value_t = 6379)]
        port: u16,
        /// Image tag to build and run
        #[arg(long, env = "CONFORM_IMAGE", default_value = DEFAULT_IMAGE)]
        image: String,
        /// Build context directory
        #[arg(long, value_name = "DIR", default_value = ".")]
        context: PathBuf,
        /// Vendor runner entry point inside the image
        #[arg(long, default_value = DEFAULT_RUNNER)]
        runner: String,
        /// Directory receiving <tags>.docker.log
        #[arg(long, value_name = "DIR", default_value = ".")]
        log_dir: PathBuf,
        /// Give up waiting on the container after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Spawn the server instead of connecting to a running one
        #[arg(long)]
        managed: bool,
        /// Server binary for --managed
        #[arg(long, value_name = "PATH", default_value = DEFAULT_SERVER_BIN, requires = "managed")]
        server_bin: PathBuf,
        /// Extra argument for the managed server (repeatable)
        #[arg(long = "server-arg", value_name = "ARG", allow_hyphen_values = true, requires = "managed")]
        server_args: Vec<String>,
        /// Container engine executable
        #[arg(long, value_name = "PATH", default_value = "docker")]
        docker: PathBuf,
        /// Write a JSON summary of the run
        #[arg(long, value_name = "FILE")]
        summary: Option<PathBuf>,
        /// Extra arguments passed verbatim to the vendor runner
        #[arg(last = true, value_name = "ARGS")]
        extra: Vec<String>,
    },

    /// Show the composed tag filter and log file for a tag selection
    Tags {
        #[command(flatten)]
        tags: TagArgs,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Extract { file, stub } => commands::extract(&file, &stub),
        Command::Generate { root, out, stub } => commands::generate(&root, &out, &stub),
        Command::Conform {
            tags,
            host,
            port,
            image,
            context,
            runner,
            log_dir,
            timeout_secs,
            managed,
            server_bin,
            server_args,
            docker,
            summary,
            extra,
        } => {
            let mut config = crate::runner::RunnerConfig::new()
                .with_image(image)
                .with_context(context)
                .with_runner(runner)
                .with_log_dir(log_dir)
                .with_timeout(timeout_secs.map(std::time::Duration::from_secs));
            if managed {
                config = config.with_instance(crate::runner::InstanceMode::managed_with_args(server_bin, server_args));
            }
            let request = crate::runner::ConformanceRequest::new(tags.caller_tags()).with_extra_args(extra);
            let endpoint = crate::runner::Endpoint::new(host, port);
            commands::conform(&docker, &endpoint, &request, &config, summary.as_deref())
        }
        Command::Tags { tags } => commands::show_tags(&tags.caller_tags()),
    }
}

// ============================================================================
// Tests
// ============================================================================
