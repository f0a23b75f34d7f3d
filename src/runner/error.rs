//! Runner error type.
//!
//! Two user-visible categories: setup failures (the run never produced a verdict) and conformance failures
//! (the vendor suite ran and exited non-zero). [`RunnerError::is_setup`] tells them apart.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use super::client::ClientError;

#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error("database instance is not responding: {0}")]
    #[diagnostic(code(conformkit::preflight), help("check --host/--port, or use --managed to start a server"))]
    Preflight(String),

    #[error(transparent)]
    #[diagnostic(code(conformkit::client))]
    Client(#[from] ClientError),

    #[error("failed to start managed server: {0}")]
    #[diagnostic(code(conformkit::server), help("is the server binary on PATH? see --server-bin"))]
    Server(String),

    #[error("failed to spawn '{program}': {source}")]
    #[diagnostic(code(conformkit::spawn), help("is the container engine installed and on PATH?"))]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("image build for '{image}' failed (exit status {status:?}): {stderr}")]
    #[diagnostic(code(conformkit::build))]
    BuildFailed {
        image: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("container failed to start: {0}")]
    #[diagnostic(code(conformkit::start))]
    StartFailed(String),

    #[error("container engine error: {0}")]
    #[diagnostic(code(conformkit::engine))]
    Engine(String),

    #[error("container {id} did not finish within {timeout:?}")]
    #[diagnostic(code(conformkit::timeout), help("raise --timeout-secs or omit it to wait indefinitely"))]
    Timeout { id: String, timeout: Duration },

    #[error("cannot write log '{}': {source}", .path.display())]
    #[diagnostic(code(conformkit::log))]
    LogWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("conformance run exited with status {status}; see {}", .log_path.display())]
    #[diagnostic(code(conformkit::conformance), help("the container log is the primary diagnostic"))]
    ConformanceFailed { status: i64, log_path: PathBuf },
}

impl RunnerError {
    /// Whether this error happened before a verdict existed.
    pub fn is_setup(&self) -> bool {
        !matches!(self, RunnerError::ConformanceFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert!(RunnerError::StartFailed("boom".into()).is_setup());
        let failed = RunnerError::ConformanceFailed {
            status: 1,
            log_path: PathBuf::from("string.docker.log"),
        };
        assert!(!failed.is_setup());
        assert_eq!(
            failed.to_string(),
            "conformance run exited with status 1; see string.docker.log"
        );
    }
}
