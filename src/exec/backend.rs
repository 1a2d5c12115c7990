// src/exec/backend.rs

//! Pluggable container runtime abstraction.
//!
//! Workers and the fleet registry talk to a `ContainerRuntime` instead of
//! the docker client directly. This makes it easy to swap in a fake runtime
//! in tests while keeping the production implementation in [`super::docker`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::errors::RuntimeError;
use crate::fleet::WorkerSpec;

use super::logs::LogStream;

/// Boxed future returned by every runtime operation.
pub type RuntimeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RuntimeError>> + Send + 'a>>;

/// Opaque container identifier handed out by the runtime on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerHandle(String);

impl ContainerHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 7 characters of the id, the way docker prints them.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(7) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait abstracting the container daemon.
///
/// Production code uses [`super::DockerCli`]; tests provide their own
/// implementation that keeps containers in memory.
///
/// Implementations are shared between all workers (`Arc<dyn ContainerRuntime>`)
/// and must tolerate concurrent calls.
pub trait ContainerRuntime: Send + Sync {
    /// Check that the daemon is reachable before anything is created.
    fn ping(&self) -> RuntimeFuture<'_, ()>;

    /// Create (but don't start) a container for the given worker.
    fn create<'a>(&'a self, spec: &'a WorkerSpec) -> RuntimeFuture<'a, ContainerHandle>;

    /// Start a created container.
    fn start<'a>(&'a self, handle: &'a ContainerHandle) -> RuntimeFuture<'a, ()>;

    /// Follow the combined stdout+stderr of a container, without timestamps.
    ///
    /// The returned stream ends when the container's process exits.
    fn logs<'a>(&'a self, handle: &'a ContainerHandle) -> RuntimeFuture<'a, LogStream>;

    /// Force-remove a container (killing it if running) with its volumes.
    ///
    /// Must return [`RuntimeError::NotFound`] when the container is already
    /// gone, so callers can treat repeated removal as benign.
    fn force_remove<'a>(&'a self, handle: &'a ContainerHandle) -> RuntimeFuture<'a, ()>;
}
