//! Containerized conformance runner
//!
//! One run is: preflight the live instance, build the suite image, start the vendor runner in a detached
//! container pointed at the instance, wait, persist the container log as `<tags>.docker.log`, remove the
//! container. The verdict is the container's exit status.
//!
//! ## Modules
//!
//! - `client` - `CommandClient` capability and the RESP client
//! - `config` - `RunnerConfig` and `InstanceMode`
//! - `docker` - `docker` CLI engine
//! - `engine` - engine/handle traits and the removal guard
//! - `error` - `RunnerError`
//! - `report` - JSON run summaries
//! - `server` - external/managed instance acquisition
//! - `tags` - tag filter composition and log naming
//! - `variants` - named tag presets

pub mod client;
pub mod config;
pub mod docker;
pub mod engine;
pub mod error;
pub mod report;
pub mod server;
pub mod tags;
pub mod variants;

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub use client::{CommandClient, Endpoint, LiveInstance, Reply, RespClient};
pub use config::{InstanceMode, RunnerConfig};
pub use docker::DockerCli;
pub use engine::{ContainerEngine, ContainerGuard, ContainerHandle, ContainerSpec};
pub use error::RunnerError;
pub use variants::ConformanceVariant;

/// Hostname under which the container reaches the machine running the instance.
pub const CONTAINER_HOST_ALIAS: &str = "host.docker.internal";

/// Hosts file entry that makes [`CONTAINER_HOST_ALIAS`] resolve on Linux engines too.
pub const HOST_GATEWAY_ENTRY: &str = "host.docker.internal:host-gateway";

/// What to run: caller tags and passthrough arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConformanceRequest {
    pub tags: String,
    pub extra_args: Vec<String>,
}

impl ConformanceRequest {
    pub fn new(tags: impl Into<String>) -> Self {
        Self {
            tags: tags.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn for_variant(variant: ConformanceVariant) -> Self {
        Self::new(variant.tags())
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

/// A finished run: the container exited and its log was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub container_id: String,
    /// Composed tag filter passed to the vendor runner
    pub tags: String,
    pub command: Vec<String>,
    pub exit_status: i64,
    pub log_path: PathBuf,
    pub log_bytes: usize,
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        self.exit_status == 0
    }

    /// Turn a non-zero status into [`RunnerError::ConformanceFailed`].
    pub fn ensure_passed(self) -> Result<RunOutcome, RunnerError> {
        if self.passed() {
            Ok(self)
        } else {
            Err(RunnerError::ConformanceFailed {
                status: self.exit_status,
                log_path: self.log_path,
            })
        }
    }
}

/// Map loopback hosts to the alias reachable from inside a container.
pub fn container_host(host: &str) -> &str {
    match host {
        "localhost" | "127.0.0.1" | "::1" | "[::1]" | "0.0.0.0" => CONTAINER_HOST_ALIAS,
        other => other,
    }
}

/// Build the vendor runner command line.
pub fn vendor_command(runner: &str, endpoint: &Endpoint, tags: &str, extra_args: &[String]) -> Vec<String> {
    let mut command = vec![
        runner.to_string(),
        "--host".to_string(),
        container_host(&endpoint.host).to_string(),
        "--port".to_string(),
        endpoint.port.to_string(),
        "--verbose".to_string(),
        "--dump-logs".to_string(),
        "--tags".to_string(),
        tags.to_string(),
    ];
    command.extend(extra_args.iter().cloned());
    command
}

/// Render a command for logs, quoting the tag expression the way a shell would need it.
pub fn render_command_line(command: &[String]) -> String {
    let mut rendered = Vec::with_capacity(command.len());
    let mut quote_next = false;
    for arg in command {
        if quote_next || arg.is_empty() || arg.contains(char::is_whitespace) {
            rendered.push(format!("\"{}\"", arg));
        } else {
            rendered.push(arg.clone());
        }
        quote_next = arg == "--tags";
    }
    rendered.join(" ")
}

/// Drive one conformance run.
///
/// Returns `Ok` whenever the container ran to completion, whatever its status; use
/// [`RunOutcome::ensure_passed`] to turn a failing status into an error. Setup problems (preflight, build,
/// start) and retrieval problems are errors. The container is removed on every path once started.
pub fn run_conformance<E, I>(
    engine: &E,
    instance: &mut I,
    request: &ConformanceRequest,
    config: &RunnerConfig,
) -> Result<RunOutcome, RunnerError>
where
    E: ContainerEngine,
    I: LiveInstance + ?Sized,
{
    let endpoint = instance.endpoint();
    server::ping(instance)?;
    tracing::debug!(%endpoint, "instance answered PING");

    engine.build_image(&config.context, &config.image)?;

    let tags = tags::compose_tags(&request.tags);
    let command = vendor_command(&config.runner, &endpoint, &tags, &request.extra_args);
    tracing::info!(tags = %tags, command = %render_command_line(&command), "starting conformance container");

    let spec = ContainerSpec {
        image: config.image.clone(),
        command: command.clone(),
        extra_hosts: vec![HOST_GATEWAY_ENTRY.to_string()],
    };

    let started_at = Instant::now();
    let mut container = ContainerGuard::new(engine.run_detached(&spec)?);

    // Logs are collected even when the wait failed so a timed-out run still leaves evidence.
    let status = container.wait(config.timeout);
    let logs = container.logs();
    let log_path = tags::log_path(&config.log_dir, &request.tags);

    let log_bytes = match &logs {
        Ok(bytes) => {
            persist_log(&log_path, bytes)?;
            bytes.len()
        }
        Err(e) => {
            tracing::warn!(container = %container.id(), error = %e, "could not retrieve container logs");
            0
        }
    };

    let exit_status = status?;
    logs?;

    let outcome = RunOutcome {
        container_id: container.id().to_string(),
        tags,
        command,
        exit_status,
        log_path,
        log_bytes,
        elapsed: started_at.elapsed(),
    };

    tracing::info!(
        container = %outcome.container_id,
        status = outcome.exit_status,
        log = %outcome.log_path.display(),
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "conformance container finished"
    );
    Ok(outcome)
}

fn persist_log(path: &std::path::Path, bytes: &[u8]) -> Result<(), RunnerError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| RunnerError::LogWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    fs::write(path, bytes).map_err(|source| RunnerError::LogWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_host_rewrites_loopback() {
        assert_eq!(container_host("localhost"), CONTAINER_HOST_ALIAS);
        assert_eq!(container_host("127.0.0.1"), CONTAINER_HOST_ALIAS);
        assert_eq!(container_host("db.internal"), "db.internal");
    }

    #[test]
    fn test_vendor_command_layout() {
        let command = vendor_command(
            "./runtest",
            &Endpoint::new("localhost", 6390),
            "string -slow",
            &["--clients".to_string(), "1".to_string()],
        );
        assert_eq!(
            command,
            vec![
                "./runtest",
                "--host",
                "host.docker.internal",
                "--port",
                "6390",
                "--verbose",
                "--dump-logs",
                "--tags",
                "string -slow",
                "--clients",
                "1",
            ]
        );
    }

    #[test]
    fn test_render_command_line_quotes_tags() {
        let command = vendor_command("./runtest", &Endpoint::new("db", 1), "-slow", &[]);
        assert_eq!(
            render_command_line(&command),
            "./runtest --host db --port 1 --verbose --dump-logs --tags \"-slow\""
        );
    }

    #[test]
    fn test_ensure_passed() {
        let outcome = RunOutcome {
            container_id: "c".into(),
            tags: "-slow".into(),
            command: Vec::new(),
            exit_status: 2,
            log_path: PathBuf::from("all.docker.log"),
            log_bytes: 0,
            elapsed: Duration::ZERO,
        };
        assert!(!outcome.passed());
        let err = outcome.ensure_passed().unwrap_err();
        assert!(matches!(err, RunnerError::ConformanceFailed { status: 2, .. }));
    }
}
