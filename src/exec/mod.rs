// src/exec/mod.rs

//! Container execution layer.
//!
//! This module is how tws reaches the container daemon.
//!
//! - [`backend`] provides the `ContainerRuntime` trait and `ContainerHandle`.
//!   The fleet only ever talks to that trait, so tests can replace the
//!   daemon with an in-memory fake.
//! - [`docker`] is the production `DockerCli` implementation, which shells
//!   out to the `docker` client.
//! - [`logs`] holds `LogStream`, the chunked output of a followed container.

pub mod backend;
pub mod docker;
pub mod logs;

pub use backend::{ContainerHandle, ContainerRuntime, RuntimeFuture};
pub use docker::DockerCli;
pub use logs::{LogSender, LogStream};
