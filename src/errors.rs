// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TwsError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid target URL '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("TLS error: {0}")]
    TlsError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors reported by a [`crate::exec::ContainerRuntime`].
///
/// These never abort a run; workers and the registry log them and move on.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The container is gone already. Benign during cleanup.
    #[error("no such container: {0}")]
    NotFound(String),

    #[error("`docker {op}` failed ({status}): {stderr}")]
    CommandFailed {
        op: &'static str,
        status: String,
        stderr: String,
    },

    #[error("could not launch the docker client: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("IO error while talking to the container runtime: {0}")]
    Io(#[from] std::io::Error),

    /// The output stream of a container could not be attached.
    #[error("log stream for container {0} is not available")]
    StreamClosed(String),
}

impl RuntimeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::NotFound(_))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TwsError>;
