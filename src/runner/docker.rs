//! `docker` CLI implementation of the container engine traits.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::engine::{ContainerEngine, ContainerHandle, ContainerSpec};
use super::error::RunnerError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Container engine backed by the `docker` command line.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: PathBuf,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        Command::new(&self.program)
    }

    fn output(&self, cmd: &mut Command) -> Result<Output, RunnerError> {
        cmd.output().map_err(|source| RunnerError::Spawn {
            program: self.program.display().to_string(),
            source,
        })
    }
}

/// Arguments for `docker run` (after the program name).
pub fn run_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec!["run".to_string(), "-d".to_string()];
    for host in &spec.extra_hosts {
        args.push("--add-host".to_string());
        args.push(host.clone());
    }
    args.push(spec.image.clone());
    args.extend(spec.command.iter().cloned());
    args
}

impl ContainerEngine for DockerCli {
    type Handle = DockerContainer;

    fn build_image(&self, context: &Path, tag: &str) -> Result<(), RunnerError> {
        tracing::info!(image = tag, context = %context.display(), "building image");
        let output = self.output(self.command().arg("build").arg("-t").arg(tag).arg(context))?;
        if !output.status.success() {
            return Err(RunnerError::BuildFailed {
                image: tag.to_string(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn run_detached(&self, spec: &ContainerSpec) -> Result<DockerContainer, RunnerError> {
        let output = self.output(self.command().args(run_args(spec)))?;
        if !output.status.success() {
            return Err(RunnerError::StartFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            return Err(RunnerError::StartFailed("engine returned no container id".into()));
        }
        tracing::info!(container = %id, image = %spec.image, "started container");
        Ok(DockerContainer {
            docker: self.clone(),
            id,
        })
    }
}

/// A container started by [`DockerCli`].
#[derive(Debug)]
pub struct DockerContainer {
    docker: DockerCli,
    id: String,
}

impl DockerContainer {
    fn wait_bounded(&self, timeout: Duration) -> Result<Output, RunnerError> {
        let mut child = self
            .docker
            .command()
            .arg("wait")
            .arg(&self.id)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: self.docker.program.display().to_string(),
                source,
            })?;

        let started_at = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(_)) => {
                    return child
                        .wait_with_output()
                        .map_err(|e| RunnerError::Engine(format!("wait on {} failed: {e}", self.id)));
                }
                Ok(None) => {
                    if started_at.elapsed() >= timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(RunnerError::Timeout {
                            id: self.id.clone(),
                            timeout,
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(RunnerError::Engine(format!("wait on {} failed: {e}", self.id)));
                }
            }
        }
    }
}

impl ContainerHandle for DockerContainer {
    fn id(&self) -> &str {
        &self.id
    }

    fn wait(&mut self, timeout: Option<Duration>) -> Result<i64, RunnerError> {
        let output = match timeout {
            Some(timeout) => self.wait_bounded(timeout)?,
            None => self.docker.output(self.docker.command().arg("wait").arg(&self.id))?,
        };
        if !output.status.success() {
            return Err(RunnerError::Engine(format!(
                "docker wait {}: {}",
                self.id,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_status(&String::from_utf8_lossy(&output.stdout))
    }

    fn logs(&mut self) -> Result<Vec<u8>, RunnerError> {
        let output = self.docker.output(self.docker.command().arg("logs").arg(&self.id))?;
        if !output.status.success() {
            return Err(RunnerError::Engine(format!(
                "docker logs {}: {}",
                self.id,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        // The engine splits the container's streams; stdout first, then stderr.
        let mut bytes = output.stdout;
        bytes.extend_from_slice(&output.stderr);
        Ok(bytes)
    }

    fn remove(&mut self) -> Result<(), RunnerError> {
        let output = self.docker.output(self.docker.command().args(["rm", "-f"]).arg(&self.id))?;
        if !output.status.success() {
            return Err(RunnerError::Engine(format!(
                "docker rm {}: {}",
                self.id,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Parse the status printed by `docker wait`.
fn parse_status(stdout: &str) -> Result<i64, RunnerError> {
    let trimmed = stdout.trim();
    trimmed
        .lines()
        .last()
        .unwrap_or("")
        .trim()
        .parse()
        .map_err(|_| RunnerError::Engine(format!("unexpected exit status output {trimmed:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args() {
        let spec = ContainerSpec {
            image: "suite:latest".into(),
            command: vec!["./runtest".into(), "--host".into(), "host.docker.internal".into()],
            extra_hosts: vec!["host.docker.internal:host-gateway".into()],
        };
        assert_eq!(
            run_args(&spec),
            vec![
                "run",
                "-d",
                "--add-host",
                "host.docker.internal:host-gateway",
                "suite:latest",
                "./runtest",
                "--host",
                "host.docker.internal",
            ]
        );
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("0\n").unwrap(), 0);
        assert_eq!(parse_status("137").unwrap(), 137);
        assert!(parse_status("").is_err());
        assert!(parse_status("oops").is_err());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let docker = DockerCli::new("/nonexistent/conformkit-docker");
        let err = docker.build_image(Path::new("."), "x").unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
        assert!(err.is_setup());
    }
}
