//! Conformance runner configuration
//!
//! Everything a run needs is carried here and passed down explicitly; nothing is read from the environment
//! once the CLI has built this value.

use std::path::PathBuf;
use std::time::Duration;

/// Default image tag for the conformance build.
pub const DEFAULT_IMAGE: &str = "conformkit-suite:latest";
/// Default entry point of the vendor runner inside the image.
pub const DEFAULT_RUNNER: &str = "./runtest";
/// Default server binary for managed instances.
pub const DEFAULT_SERVER_BIN: &str = "redis-server";

/// Who owns the database instance under test.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InstanceMode {
    /// Already running; conformkit only connects.
    #[default]
    External,
    /// Spawned by conformkit for the duration of the run.
    Managed {
        server_bin: PathBuf,
        /// Appended after the port and bind arguments
        server_args: Vec<String>,
    },
}

impl InstanceMode {
    pub fn managed(server_bin: impl Into<PathBuf>) -> Self {
        Self::managed_with_args(server_bin, Vec::new())
    }

    pub fn managed_with_args(server_bin: impl Into<PathBuf>, server_args: Vec<String>) -> Self {
        InstanceMode::Managed {
            server_bin: server_bin.into(),
            server_args,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, InstanceMode::External)
    }
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Image tag to build and run
    pub image: String,
    /// Build context directory
    pub context: PathBuf,
    /// Vendor runner entry point inside the container
    pub runner: String,
    /// Directory receiving `<tags>.docker.log`
    pub log_dir: PathBuf,
    /// Bounded wait on the container; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Client connect/read timeout for preflight and managed startup
    pub connect_timeout: Duration,
    /// How long a managed server may take to answer PING
    pub startup_timeout: Duration,
    /// Ownership of the instance under test
    pub instance: InstanceMode,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            context: PathBuf::from("."),
            runner: DEFAULT_RUNNER.to_string(),
            log_dir: PathBuf::from("."),
            timeout: None,
            connect_timeout: Duration::from_secs(5),
            startup_timeout: Duration::from_secs(10),
            instance: InstanceMode::External,
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<PathBuf>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = runner.into();
        self
    }

    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_instance(mut self, instance: InstanceMode) -> Self {
        self.instance = instance;
        self
    }
}
