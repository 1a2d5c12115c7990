// src/config/validate.rs

use std::fs;
use std::path::{Path, PathBuf};

use url::Url;

use crate::config::model::{
    BenchSection, DEFAULT_CONCURRENCY, DEFAULT_CONTAINERS, DEFAULT_IMAGE, DEFAULT_METHOD,
    DEFAULT_NAME_PREFIX, DEFAULT_REQUESTS, DEFAULT_TIMEOUT_SECS,
    DEFAULT_VERBOSITY, DockerConnection, DockerSection, FleetConfig, RawConfigFile, TlsIdentity,
};
use crate::errors::{Result, TwsError};
use crate::fleet::{LaunchTemplate, normalize_target};
use crate::types::Protocol;

impl TryFrom<RawConfigFile> for FleetConfig {
    type Error = crate::errors::TwsError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let containers = raw.fleet.containers.unwrap_or(DEFAULT_CONTAINERS);
        if containers == 0 {
            return Err(TwsError::ConfigError(
                "number of containers must be >= 1 (got 0)".to_string(),
            ));
        }

        let image = non_empty(raw.fleet.image).unwrap_or_else(|| DEFAULT_IMAGE.to_string());
        let name_prefix = non_empty(raw.fleet.name_prefix)
            .unwrap_or_else(|| DEFAULT_NAME_PREFIX.to_string());
        validate_name_prefix(&name_prefix)?;

        let docker = validate_docker(raw.docker)?;
        let template = validate_bench(raw.bench)?;

        Ok(FleetConfig {
            containers,
            image,
            name_prefix,
            docker,
            template,
        })
    }
}

fn validate_bench(bench: BenchSection) -> Result<LaunchTemplate> {
    let target = match non_empty(bench.target) {
        Some(t) => parse_target(&t)?,
        None => {
            return Err(TwsError::ConfigError(
                "you need to pass a url to throw spears at".to_string(),
            ));
        }
    };

    let concurrency = bench.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
    let requests = bench.requests.unwrap_or(DEFAULT_REQUESTS);
    let timelimit_secs = bench.timelimit.unwrap_or(0);

    if concurrency == 0 {
        return Err(TwsError::ConfigError(
            "concurrency (-c) must be >= 1 (got 0)".to_string(),
        ));
    }
    if requests == 0 {
        return Err(TwsError::ConfigError(
            "requests (-n) must be >= 1 (got 0)".to_string(),
        ));
    }
    // With a time limit ab picks its own request count.
    if timelimit_secs == 0 && u64::from(concurrency) > requests {
        return Err(TwsError::ConfigError(format!(
            "concurrency (-c {concurrency}) cannot be greater than the number of requests (-n {requests})"
        )));
    }

    let method = bench
        .method
        .map(|m| m.trim().to_uppercase())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_METHOD.to_string());
    if !method.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(TwsError::ConfigError(format!("invalid HTTP method: {method}")));
    }

    let protocol = match bench.protocol.as_deref() {
        Some(p) => p.parse::<Protocol>().map_err(TwsError::ConfigError)?,
        None => Protocol::default(),
    };

    for header in bench.headers.iter() {
        if !header.contains(':') {
            return Err(TwsError::ConfigError(format!(
                "header '{header}' is not of the form 'Name: value'"
            )));
        }
    }

    Ok(LaunchTemplate {
        target,
        method,
        concurrency,
        requests,
        timeout_secs: bench.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
        timelimit_secs,
        verbosity: bench.verbosity.unwrap_or(DEFAULT_VERBOSITY),
        protocol,
        auth: non_empty(bench.auth),
        proxy_auth: non_empty(bench.proxy_auth),
        content_type: non_empty(bench.content_type),
        headers: bench.headers,
        cookies: bench.cookies,
    })
}

/// Parse and normalise the target URL.
///
/// Only absolute `http`/`https` URLs with a host are accepted; ab can't
/// do anything with the rest.
pub fn parse_target(raw: &str) -> Result<Url> {
    let invalid = |reason: String| TwsError::InvalidTarget {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(normalize_target(url))
}

fn validate_name_prefix(prefix: &str) -> Result<()> {
    // Docker names: [a-zA-Z0-9][a-zA-Z0-9_.-]*
    let mut chars = prefix.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if first_ok && rest_ok {
        Ok(())
    } else {
        Err(TwsError::ConfigError(format!(
            "invalid container name prefix '{prefix}'"
        )))
    }
}

fn validate_docker(docker: DockerSection) -> Result<DockerConnection> {
    let tls = match (docker.tlscert, docker.tlskey) {
        (Some(cert), Some(key)) => Some(load_tls_identity(cert, key, docker.tlscacert)?),
        (None, None) => {
            if docker.tlscacert.is_some() {
                return Err(TwsError::TlsError(
                    "--tlscacert needs --tlscert and --tlskey".to_string(),
                ));
            }
            None
        }
        _ => {
            return Err(TwsError::TlsError(
                "--tlscert and --tlskey must be given together".to_string(),
            ));
        }
    };

    Ok(DockerConnection {
        host: non_empty(docker.host),
        tls,
    })
}

/// Check that the key pair can be loaded before any container is created.
///
/// The docker client would otherwise fail once per container, N times over.
fn load_tls_identity(cert: PathBuf, key: PathBuf, ca: Option<PathBuf>) -> Result<TlsIdentity> {
    let cert_pem = read_pem(&cert)?;
    if !cert_pem.contains("-----BEGIN CERTIFICATE-----") {
        return Err(TwsError::TlsError(format!(
            "could not load X509 key pair: {} holds no PEM certificate",
            cert.display()
        )));
    }

    let key_pem = read_pem(&key)?;
    if key_pem.contains("ENCRYPTED") {
        return Err(TwsError::TlsError(format!(
            "could not load X509 key pair: {} is encrypted. Make sure the key is not encrypted",
            key.display()
        )));
    }
    if !key_pem.contains("PRIVATE KEY-----") {
        return Err(TwsError::TlsError(format!(
            "could not load X509 key pair: {} holds no PEM private key",
            key.display()
        )));
    }

    if let Some(ref ca) = ca {
        let ca_pem = read_pem(ca)?;
        if !ca_pem.contains("-----BEGIN CERTIFICATE-----") {
            return Err(TwsError::TlsError(format!(
                "{} holds no PEM CA certificate",
                ca.display()
            )));
        }
    }

    Ok(TlsIdentity { cert, key, ca })
}

fn read_pem(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| TwsError::TlsError(format!("reading {}: {e}", path.display())))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
