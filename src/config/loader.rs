// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::cli::CliArgs;
use crate::config::model::{FleetConfig, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** apply defaults
/// or validate anything. Use [`resolve`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Build the run configuration from the command line.
///
/// - Reads `--config` if given, otherwise starts from an empty file.
/// - Layers every flag that was passed on top of the file values.
/// - Validates and applies defaults (see `validate.rs`).
pub fn resolve(args: &CliArgs) -> Result<FleetConfig> {
    let mut raw = match args.config {
        Some(ref path) => load_from_path(path)?,
        None => RawConfigFile::default(),
    };
    raw.apply_cli(args);
    FleetConfig::try_from(raw)
}

impl RawConfigFile {
    /// Overwrite file values with the ones given on the command line.
    ///
    /// `-H` and `-C` take `;`-separated lists; when any are passed they
    /// replace the file's list instead of extending it.
    pub fn apply_cli(&mut self, args: &CliArgs) {
        let fleet = &mut self.fleet;
        overlay(&mut fleet.containers, args.containers);
        overlay(&mut fleet.image, args.image.clone());
        overlay(&mut fleet.name_prefix, args.name_prefix.clone());

        let docker = &mut self.docker;
        overlay(&mut docker.host, args.docker_host.clone());
        overlay(&mut docker.tlscert, args.tlscert.clone());
        overlay(&mut docker.tlskey, args.tlskey.clone());
        overlay(&mut docker.tlscacert, args.tlscacert.clone());

        let bench = &mut self.bench;
        overlay(&mut bench.target, args.target.clone());
        overlay(&mut bench.concurrency, args.concurrency);
        overlay(&mut bench.requests, args.requests);
        overlay(&mut bench.method, args.method.clone());
        overlay(&mut bench.protocol, args.protocol.clone());
        overlay(&mut bench.timeout, args.timeout);
        overlay(&mut bench.timelimit, args.timelimit);
        overlay(&mut bench.verbosity, args.verbosity);
        overlay(&mut bench.auth, args.auth.clone());
        overlay(&mut bench.proxy_auth, args.proxy_auth.clone());
        overlay(&mut bench.content_type, args.content_type.clone());

        if !args.headers.is_empty() {
            bench.headers = split_list(&args.headers);
        }
        if !args.cookies.is_empty() {
            bench.cookies = split_list(&args.cookies);
        }
    }
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Split every value on `;`, keeping order and dropping empty pieces.
pub fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(';'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
