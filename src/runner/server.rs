//! Instance acquisition: connect to an external server or spawn a managed one.

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::client::{ClientError, CommandClient, Endpoint, LiveInstance, Reply, RespClient};
use super::config::{InstanceMode, RunnerConfig};
use super::error::RunnerError;

const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Listen on every interface with protected mode off: the suite container dials in through the engine's host
/// gateway, not loopback.
pub const CONTAINER_REACHABLE_ARGS: [&str; 4] = ["--bind", "0.0.0.0", "--protected-mode", "no"];

/// Arguments for a managed server: port, reachability from the container, then caller extras.
pub fn managed_server_args(port: u16, extra_args: &[String]) -> Vec<String> {
    let mut args = vec!["--port".to_string(), port.to_string()];
    args.extend(CONTAINER_REACHABLE_ARGS.iter().map(|a| a.to_string()));
    args.extend(extra_args.iter().cloned());
    args
}

/// A server process owned for the duration of a run; killed on drop.
pub struct ManagedServer {
    child: Child,
    client: RespClient,
}

impl ManagedServer {
    /// Spawn `server_bin` with [`managed_server_args`] and wait until it answers PING.
    pub fn start(
        server_bin: &Path,
        server_args: &[String],
        endpoint: &Endpoint,
        startup_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, RunnerError> {
        let mut child = Command::new(server_bin)
            .args(managed_server_args(endpoint.port, server_args))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| RunnerError::Server(format!("{}: {e}", server_bin.display())))?;
        tracing::info!(pid = child.id(), server = %server_bin.display(), %endpoint, "spawned managed server");

        let started_at = Instant::now();
        loop {
            if let Ok(Some(status)) = child.try_wait() {
                return Err(RunnerError::Server(format!("server exited early with {status}")));
            }

            match RespClient::connect(endpoint, connect_timeout) {
                Ok(mut client) => {
                    if ping(&mut client).is_ok() {
                        tracing::info!(elapsed_ms = started_at.elapsed().as_millis() as u64, "managed server ready");
                        return Ok(Self { child, client });
                    }
                }
                Err(e) => tracing::trace!(error = %e, "managed server not accepting connections yet"),
            }

            if started_at.elapsed() >= startup_timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunnerError::Server(format!(
                    "no PING reply within {startup_timeout:?}"
                )));
            }
            thread::sleep(STARTUP_POLL_INTERVAL);
        }
    }
}

impl CommandClient for ManagedServer {
    fn execute(&mut self, args: &[&str]) -> Result<Reply, ClientError> {
        self.client.execute(args)
    }
}

impl LiveInstance for ManagedServer {
    fn endpoint(&self) -> Endpoint {
        self.client.endpoint()
    }
}

impl Drop for ManagedServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        tracing::debug!(pid = self.child.id(), "stopped managed server");
    }
}

/// The instance a run is pointed at.
pub enum Instance {
    External(RespClient),
    Managed(ManagedServer),
}

impl CommandClient for Instance {
    fn execute(&mut self, args: &[&str]) -> Result<Reply, ClientError> {
        match self {
            Instance::External(client) => client.execute(args),
            Instance::Managed(server) => server.execute(args),
        }
    }
}

impl LiveInstance for Instance {
    fn endpoint(&self) -> Endpoint {
        match self {
            Instance::External(client) => client.endpoint(),
            Instance::Managed(server) => server.endpoint(),
        }
    }
}

/// Acquire the instance described by `config.instance`.
pub fn open_instance(endpoint: &Endpoint, config: &RunnerConfig) -> Result<Instance, RunnerError> {
    match &config.instance {
        InstanceMode::External => {
            let client = RespClient::connect(endpoint, config.connect_timeout)?;
            Ok(Instance::External(client))
        }
        InstanceMode::Managed { server_bin, server_args } => {
            let server = ManagedServer::start(
                server_bin,
                server_args,
                endpoint,
                config.startup_timeout,
                config.connect_timeout,
            )?;
            Ok(Instance::Managed(server))
        }
    }
}

/// Check that an instance answers `PING` with `PONG`.
pub fn ping<C: CommandClient + ?Sized>(client: &mut C) -> Result<(), RunnerError> {
    let reply = client.execute(&["PING"])?;
    if reply.is_pong() {
        Ok(())
    } else {
        Err(RunnerError::Preflight(format!("unexpected PING reply {reply:?}")))
    }
}
