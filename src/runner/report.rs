//! Machine-readable run summaries for CI artifacts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RunOutcome;

/// Schema version of [`RunSummary`].
pub const SUMMARY_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub container_id: String,
    pub tags: String,
    pub command: Vec<String>,
    pub exit_status: i64,
    pub passed: bool,
    pub log_path: String,
    pub log_bytes: usize,
    pub elapsed_ms: u64,
}

impl From<&RunOutcome> for RunSummary {
    fn from(outcome: &RunOutcome) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION,
            container_id: outcome.container_id.clone(),
            tags: outcome.tags.clone(),
            command: outcome.command.clone(),
            exit_status: outcome.exit_status,
            passed: outcome.passed(),
            log_path: outcome.log_path.display().to_string(),
            log_bytes: outcome.log_bytes,
            elapsed_ms: u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot serialize run summary: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cannot write summary '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Write a summary as pretty JSON.
pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}
