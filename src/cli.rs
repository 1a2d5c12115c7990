// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every option that also exists in the config file is an `Option` so the
//! config layer can tell "not given" apart from "given with the default
//! value". Defaults live in [`crate::config::model`].

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

pub const BANNER: &str = r#" _
| |___      _____
| __\ \ /\ / / __|
| |_ \ V  V /\__ \
 \__| \_/\_/ |___/
 Tupperware with Spears (A DDoS Production)"#;

/// Command-line arguments for `tws`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tws",
    version,
    about = "Throw ApacheBench spears at a target from a fleet of throwaway containers.",
    before_help = BANNER,
    override_usage = "tws [options] [http[s]://]hostname[:port]/path",
    long_about = None
)]
pub struct CliArgs {
    /// Target URL to throw spears at.
    ///
    /// May also be given as `bench.target` in the config file.
    #[arg(value_name = "URL")]
    pub target: Option<String>,

    /// Number of containers (tupperware) to attack with [default: 16].
    #[arg(long = "nc", value_name = "COUNT")]
    pub containers: Option<usize>,

    /// Number of multiple requests to perform at a time [default: 100].
    #[arg(short = 'c', long, value_name = "N")]
    pub concurrency: Option<u32>,

    /// Number of requests to perform for the benchmarking session [default: 10000].
    #[arg(short = 'n', long, value_name = "N")]
    pub requests: Option<u64>,

    /// Auth credentials, `username:password`.
    #[arg(short = 'A', long, value_name = "USER:PASS")]
    pub auth: Option<String>,

    /// Proxy auth credentials, `username:password`.
    #[arg(short = 'P', long, value_name = "USER:PASS")]
    pub proxy_auth: Option<String>,

    /// Content type of the request body.
    #[arg(short = 'T', long, value_name = "TYPE")]
    pub content_type: Option<String>,

    /// HTTP method [default: GET].
    #[arg(short = 'm', long, value_name = "METHOD")]
    pub method: Option<String>,

    /// SSL/TLS protocol (SSL2, SSL3, TLS1, TLS1.1, TLS1.2, TLS1.3 or ALL) [default: ALL].
    #[arg(short = 'f', long, value_name = "PROTOCOL")]
    pub protocol: Option<String>,

    /// Cookies, `name=value;name=value`. Repeatable.
    #[arg(short = 'C', long = "cookie", value_name = "COOKIES")]
    pub cookies: Vec<String>,

    /// Custom headers, `header;header`. Repeatable.
    #[arg(short = 'H', long = "header", value_name = "HEADERS")]
    pub headers: Vec<String>,

    /// Time limit in seconds, implies `-n 50000` inside ab [default: 0, no limit].
    #[arg(short = 't', long, value_name = "SECONDS")]
    pub timelimit: Option<u32>,

    /// Seconds to wait at most for each response [default: 30].
    #[arg(short = 's', long, value_name = "SECONDS")]
    pub timeout: Option<u32>,

    /// ab verbosity: 4 headers, 3 response codes, 2 warnings/info [default: 3].
    #[arg(short = 'v', long, value_name = "LEVEL")]
    pub verbosity: Option<u8>,

    /// Docker daemon socket to connect to.
    #[arg(long, value_name = "HOST")]
    pub docker_host: Option<String>,

    /// Path to the TLS client certificate used to talk to the daemon.
    #[arg(long, value_name = "PATH")]
    pub tlscert: Option<PathBuf>,

    /// Path to the TLS client key used to talk to the daemon.
    #[arg(long, value_name = "PATH")]
    pub tlskey: Option<PathBuf>,

    /// CA certificate; when given the daemon certificate is verified.
    #[arg(long, value_name = "PATH")]
    pub tlscacert: Option<PathBuf>,

    /// Image that carries the `ab` entrypoint [default: jess/ab].
    #[arg(long, value_name = "IMAGE")]
    pub image: Option<String>,

    /// Prefix for generated container names [default: tws].
    #[arg(long, value_name = "PREFIX")]
    pub name_prefix: Option<String>,

    /// Optional TOML config file. Command-line flags win over its values.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run in debug mode (same as `--log-level debug`).
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `-d`, `TWS_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print every container that would be launched, but don't launch any.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
