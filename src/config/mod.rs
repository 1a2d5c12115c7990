// src/config/mod.rs

//! Configuration loading and validation for tws.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the validated `FleetConfig` (`model.rs`).
//! - Load a config file from disk and layer CLI flags on top (`loader.rs`).
//! - Validate values and apply defaults (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_from_path, resolve, split_list};
pub use model::{
    BenchSection, DockerConnection, DockerSection, FleetConfig, FleetSection, RawConfigFile,
    TlsIdentity,
};
pub use validate::parse_target;
