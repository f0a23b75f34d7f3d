//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::backend::{StubGenerator, StubStyle, SuiteGenerator};
use crate::runner::{
    self, ConformanceRequest, DockerCli, Endpoint, RunnerConfig, RunnerError, report, server, tags,
};

use super::{CliError, CliResult, ExitCode, StubArgs};

/// Maximum source file size (16 MB)
///
/// Vendor test files are a few hundred KB at most; anything larger is not a test file.
const MAX_SOURCE_SIZE: u64 = 16 * 1024 * 1024;

/// Read source file contents.
///
/// ## Errors
///
/// Returns an error if:
/// - The file cannot be read (I/O error)
/// - The file exceeds `MAX_SOURCE_SIZE`
pub fn read_source(file_path: &Path) -> CliResult<String> {
    let metadata = fs::metadata(file_path)
        .map_err(|e| CliError::failure(format!("Cannot access file '{}': {}", file_path.display(), e)))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::failure(format!(
            "Source file '{}' is too large ({} bytes, max {} bytes)",
            file_path.display(),
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }

    fs::read_to_string(file_path)
        .map_err(|e| CliError::failure(format!("Error reading file '{}': {}", file_path.display(), e)))
}

fn stub_generator(args: &StubArgs) -> StubGenerator {
    StubGenerator::new(
        StubStyle::new()
            .with_xfail_reason(args.xfail_reason.clone())
            .with_fixture(args.fixture.clone()),
    )
}

/// Print stubs for one DSL file to stdout.
pub fn extract(file: &Path, args: &StubArgs) -> CliResult<ExitCode> {
    let source = read_source(file)?;
    let output = stub_generator(args).generate(&source, &args.scan_options());

    let mut stdout = io::stdout().lock();
    let written = stdout.write_all(output.as_bytes()).and_then(|_| stdout.flush());
    written.map_err(|e| CliError::failure(format!("Error writing output: {}", e)))?;

    Ok(ExitCode::SUCCESS)
}

/// Generate one module per `.tcl` file under `<root>/tests/unit/type`.
pub fn generate(root: &Path, out: &Path, args: &StubArgs) -> CliResult<ExitCode> {
    let suite = SuiteGenerator::new(out, stub_generator(args), args.scan_options());
    let modules = suite
        .generate_from_root(root)
        .map_err(|e| CliError::failure(format!("Error: {}", e)))?;

    for module in &modules {
        println!("{} ({} stubs)", module.output.display(), module.stubs);
    }
    Ok(ExitCode::SUCCESS)
}

/// Print the composed tag filter and the log file it maps to.
pub fn show_tags(caller_tags: &str) -> CliResult<ExitCode> {
    println!("{}", tags::compose_tags(caller_tags));
    println!("{}", tags::log_file_name(caller_tags));
    Ok(ExitCode::SUCCESS)
}

/// Run one conformance cycle.
pub fn conform(
    docker: &Path,
    endpoint: &Endpoint,
    request: &ConformanceRequest,
    config: &RunnerConfig,
    summary_path: Option<&Path>,
) -> CliResult<ExitCode> {
    let engine = DockerCli::new(docker);
    let mut instance = server::open_instance(endpoint, config).map_err(runner_error)?;

    let outcome = runner::run_conformance(&engine, &mut instance, request, config).map_err(runner_error)?;

    if let Some(path) = summary_path {
        report::write_summary_json(path, &report::RunSummary::from(&outcome))
            .map_err(|e| CliError::failure(format!("Error: {}", e)))?;
    }

    if outcome.passed() {
        println!("conformance passed ({})", outcome.log_path.display());
    }
    outcome.ensure_passed().map_err(runner_error)?;
    Ok(ExitCode::SUCCESS)
}

/// Render a runner error through miette and pick the exit code for its category.
fn runner_error(err: RunnerError) -> CliError {
    let code = if err.is_setup() {
        ExitCode::SETUP_FAILURE
    } else {
        ExitCode::FAILURE
    };
    CliError::new(format!("{:?}", miette::Report::new(err)), code)
}
