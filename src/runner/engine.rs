//! Container engine I/O boundary
//!
//! The runner talks to the container engine through two traits:
//! - [`ContainerEngine`] builds images and starts detached containers
//! - [`ContainerHandle`] waits on, reads logs from, and removes one container
//!
//! [`ContainerGuard`] owns a handle and removes the container when dropped, so removal happens on every exit
//! path of a run, including early returns and panics.

use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::time::Duration;

use super::error::RunnerError;

/// What to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    /// Command and arguments run inside the container
    pub command: Vec<String>,
    /// `name:address` entries added to the container's hosts file
    pub extra_hosts: Vec<String>,
}

pub trait ContainerEngine {
    type Handle: ContainerHandle;

    /// Build `tag` from a local build context.
    fn build_image(&self, context: &Path, tag: &str) -> Result<(), RunnerError>;

    /// Start a detached container.
    fn run_detached(&self, spec: &ContainerSpec) -> Result<Self::Handle, RunnerError>;
}

pub trait ContainerHandle {
    fn id(&self) -> &str;

    /// Block until the container exits and return its status.
    fn wait(&mut self, timeout: Option<Duration>) -> Result<i64, RunnerError>;

    /// Full log stream of the container.
    fn logs(&mut self) -> Result<Vec<u8>, RunnerError>;

    /// Remove the container, stopping it if needed.
    fn remove(&mut self) -> Result<(), RunnerError>;
}

/// Scoped ownership of a running container.
pub struct ContainerGuard<H: ContainerHandle> {
    handle: H,
}

impl<H: ContainerHandle> ContainerGuard<H> {
    pub fn new(handle: H) -> Self {
        Self { handle }
    }
}

impl<H: ContainerHandle> Deref for ContainerGuard<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H: ContainerHandle> DerefMut for ContainerGuard<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.handle
    }
}

impl<H: ContainerHandle> Drop for ContainerGuard<H> {
    fn drop(&mut self) {
        match self.handle.remove() {
            Ok(()) => tracing::debug!(container = %self.handle.id(), "removed container"),
            Err(e) => tracing::warn!(container = %self.handle.id(), error = %e, "failed to remove container"),
        }
    }
}
