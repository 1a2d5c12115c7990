// src/fleet/template.rs

//! The shared ab invocation and the per-container specs derived from it.

use url::Url;

use crate::types::Protocol;

/// Benchmark settings shared by every container in the fleet.
///
/// Built once from configuration and shared read-only between workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTemplate {
    pub target: Url,
    pub method: String,
    pub concurrency: u32,
    pub requests: u64,
    pub timeout_secs: u32,
    /// 0 means no time limit.
    pub timelimit_secs: u32,
    pub verbosity: u8,
    pub protocol: Protocol,
    pub auth: Option<String>,
    pub proxy_auth: Option<String>,
    pub content_type: Option<String>,
    pub headers: Vec<String>,
    pub cookies: Vec<String>,
}

impl LaunchTemplate {
    /// Arguments passed to ab inside each container.
    ///
    /// Order is fixed: the mandatory flags, then `-A`, `-P`, `-T`, `-t` when
    /// set, then one `-H` per header and one `-C` per cookie in the order
    /// given, and finally the target URL.
    pub fn command(&self) -> Vec<String> {
        let mut cmd = vec![
            "-c".to_string(),
            self.concurrency.to_string(),
            "-n".to_string(),
            self.requests.to_string(),
            "-m".to_string(),
            self.method.to_uppercase(),
            "-s".to_string(),
            self.timeout_secs.to_string(),
            "-v".to_string(),
            self.verbosity.to_string(),
            "-f".to_string(),
            self.protocol.to_string(),
        ];

        push_opt(&mut cmd, "-A", self.auth.as_deref());
        push_opt(&mut cmd, "-P", self.proxy_auth.as_deref());
        push_opt(&mut cmd, "-T", self.content_type.as_deref());
        if self.timelimit_secs > 0 {
            cmd.push("-t".to_string());
            cmd.push(self.timelimit_secs.to_string());
        }

        for header in self.headers.iter() {
            cmd.push("-H".to_string());
            cmd.push(header.clone());
        }
        for cookie in self.cookies.iter() {
            cmd.push("-C".to_string());
            cmd.push(cookie.clone());
        }

        cmd.push(normalize_target(self.target.clone()).to_string());
        cmd
    }
}

fn push_opt(cmd: &mut Vec<String>, flag: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        cmd.push(flag.to_string());
        cmd.push(value.to_string());
    }
}

/// ab refuses URLs without a path; default it to `/`.
pub fn normalize_target(mut url: Url) -> Url {
    if url.path().is_empty() {
        url.set_path("/");
    }
    url
}

/// Everything needed to launch one container of the fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSpec {
    /// Ordinal, 1-based.
    pub index: usize,
    /// Container name, `<prefix>_<index>`.
    pub name: String,
    pub image: String,
    /// Arguments for the image's ab entrypoint.
    pub command: Vec<String>,
}

impl WorkerSpec {
    pub fn new(index: usize, image: &str, name_prefix: &str, template: &LaunchTemplate) -> Self {
        Self {
            index,
            name: container_name(name_prefix, index),
            image: image.to_string(),
            command: template.command(),
        }
    }
}

pub fn container_name(prefix: &str, index: usize) -> String {
    format!("{prefix}_{index}")
}
