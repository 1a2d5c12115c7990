// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::fleet::LaunchTemplate;

pub const DEFAULT_CONTAINERS: usize = 16;
pub const DEFAULT_IMAGE: &str = "jess/ab";
pub const DEFAULT_NAME_PREFIX: &str = "tws";
pub const DEFAULT_CONCURRENCY: u32 = 100;
pub const DEFAULT_REQUESTS: u64 = 10_000;
pub const DEFAULT_METHOD: &str = "GET";
pub const DEFAULT_TIMEOUT_SECS: u32 = 30;
pub const DEFAULT_VERBOSITY: u8 = 3;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [fleet]
/// containers = 8
/// image = "jess/ab"
///
/// [docker]
/// host = "tcp://10.0.0.5:2376"
/// tlscert = "certs/cert.pem"
/// tlskey = "certs/key.pem"
///
/// [bench]
/// target = "https://example.com/health"
/// concurrency = 50
/// headers = ["X-Load-Test: 1"]
/// ```
///
/// Every field is optional; command-line flags are layered on top (see
/// [`crate::config::loader::resolve`]) and defaults are applied during
/// validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub fleet: FleetSection,

    #[serde(default)]
    pub docker: DockerSection,

    #[serde(default)]
    pub bench: BenchSection,
}

/// `[fleet]` section: how many containers, and what they look like.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetSection {
    pub containers: Option<usize>,
    pub image: Option<String>,
    pub name_prefix: Option<String>,
}

/// `[docker]` section: how to reach the daemon.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DockerSection {
    pub host: Option<String>,
    pub tlscert: Option<PathBuf>,
    pub tlskey: Option<PathBuf>,
    pub tlscacert: Option<PathBuf>,
}

/// `[bench]` section: the ab invocation shared by every container.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchSection {
    pub target: Option<String>,
    pub concurrency: Option<u32>,
    pub requests: Option<u64>,
    pub method: Option<String>,
    pub protocol: Option<String>,
    pub timeout: Option<u32>,
    pub timelimit: Option<u32>,
    pub verbosity: Option<u8>,
    pub auth: Option<String>,
    pub proxy_auth: Option<String>,
    pub content_type: Option<String>,

    /// Headers in the order they are passed to ab.
    #[serde(default)]
    pub headers: Vec<String>,

    /// Cookies in the order they are passed to ab.
    #[serde(default)]
    pub cookies: Vec<String>,
}

/// Client certificate pair (plus optional CA) for a TLS-protected daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsIdentity {
    pub cert: PathBuf,
    pub key: PathBuf,
    /// When present the daemon's certificate is verified against it.
    pub ca: Option<PathBuf>,
}

/// Where the docker daemon lives and how to authenticate to it.
///
/// `host = None` leaves the choice to the docker client (`DOCKER_HOST`,
/// current context, or the local socket).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerConnection {
    pub host: Option<String>,
    pub tls: Option<TlsIdentity>,
}

/// Validated, immutable configuration for one run.
///
/// Built once at startup and handed to the coordinator; nothing mutates it
/// afterwards.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    pub containers: usize,
    pub image: String,
    pub name_prefix: String,
    pub docker: DockerConnection,
    pub template: LaunchTemplate,
}
