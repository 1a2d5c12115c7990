// src/exec/docker.rs

//! Production runtime: drives the daemon through the `docker` client.
//!
//! Every operation is one `docker` invocation via `tokio::process::Command`.
//! Connection flags (`--host`, TLS material) come from [`DockerConnection`]
//! and are prepended to each call.

use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, trace};

use crate::config::DockerConnection;
use crate::errors::RuntimeError;
use crate::fleet::WorkerSpec;

use super::backend::{ContainerHandle, ContainerRuntime, RuntimeFuture};
use super::logs::{LogSender, LogStream};

const LOG_CHUNK_SIZE: usize = 8 * 1024;
const STDERR_TAIL: usize = 512;

/// [`ContainerRuntime`] backed by the `docker` command-line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
    connection: DockerConnection,
}

impl DockerCli {
    pub fn new(connection: DockerConnection) -> Self {
        Self {
            program: "docker".to_string(),
            connection,
        }
    }

    /// Use another client binary (e.g. `podman`, or a full path).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Connection flags placed before every subcommand.
    pub fn global_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(ref host) = self.connection.host {
            args.push("--host".to_string());
            args.push(host.clone());
        }

        if let Some(ref tls) = self.connection.tls {
            match tls.ca {
                Some(ref ca) => {
                    args.push("--tlsverify".to_string());
                    args.push("--tlscacert".to_string());
                    args.push(ca.to_string_lossy().into_owned());
                }
                None => args.push("--tls".to_string()),
            }
            args.push("--tlscert".to_string());
            args.push(tls.cert.to_string_lossy().into_owned());
            args.push("--tlskey".to_string());
            args.push(tls.key.to_string_lossy().into_owned());
        }

        args
    }

    /// Subcommand arguments used to create the container for `spec`.
    pub fn create_args(spec: &WorkerSpec) -> Vec<String> {
        let mut args = vec![
            "create".to_string(),
            "--name".to_string(),
            spec.name.clone(),
            spec.image.clone(),
        ];
        args.extend(spec.command.iter().cloned());
        args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.global_args())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    /// Run one short-lived docker invocation and return its trimmed stdout.
    async fn invoke(&self, op: &'static str, args: Vec<String>) -> Result<String, RuntimeError> {
        trace!(op, ?args, "invoking docker client");

        let output = self
            .command()
            .args(&args)
            .output()
            .await
            .map_err(RuntimeError::Spawn)?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(classify_failure(
                op,
                output.status,
                &String::from_utf8_lossy(&output.stderr),
            ))
        }
    }
}

impl ContainerRuntime for DockerCli {
    fn ping(&self) -> RuntimeFuture<'_, ()> {
        Box::pin(async move {
            let args = vec![
                "version".to_string(),
                "--format".to_string(),
                "{{.Server.Version}}".to_string(),
            ];
            let version = self.invoke("version", args).await?;
            debug!(server_version = %version, "docker daemon reachable");
            Ok(())
        })
    }

    fn create<'a>(&'a self, spec: &'a WorkerSpec) -> RuntimeFuture<'a, ContainerHandle> {
        Box::pin(async move {
            let id = self.invoke("create", Self::create_args(spec)).await?;
            // Pull progress may precede the id on stdout; the id is the last line.
            let id = id.lines().last().unwrap_or_default().trim().to_string();
            if id.is_empty() {
                return Err(RuntimeError::CommandFailed {
                    op: "create",
                    status: "exit status: 0".to_string(),
                    stderr: "docker create printed no container id".to_string(),
                });
            }
            Ok(ContainerHandle::new(id))
        })
    }

    fn start<'a>(&'a self, handle: &'a ContainerHandle) -> RuntimeFuture<'a, ()> {
        Box::pin(async move {
            self.invoke("start", vec!["start".to_string(), handle.to_string()])
                .await
                .map(|_| ())
        })
    }

    fn logs<'a>(&'a self, handle: &'a ContainerHandle) -> RuntimeFuture<'a, LogStream> {
        Box::pin(async move {
            let mut child = self
                .command()
                .args(["logs", "--follow", handle.as_str()])
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .map_err(RuntimeError::Spawn)?;

            let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
                return Err(RuntimeError::StreamClosed(handle.short().to_string()));
            };
            let (tx, stream) = LogStream::channel(32);

            // docker splits the container's streams back onto its own
            // stdout/stderr; both are pumped into the same LogStream.
            tokio::spawn(async move {
                let (_, stderr_tail) = tokio::join!(
                    pump(stdout, tx.clone()),
                    pump(stderr, tx.clone()),
                );

                match child.wait().await {
                    Ok(status) if status.success() => {}
                    Ok(status) => {
                        let tail = String::from_utf8_lossy(&stderr_tail).into_owned();
                        let _ = tx.send(Err(classify_failure("logs", status, &tail))).await;
                    }
                    Err(e) => {
                        let _ = tx.send(Err(RuntimeError::Io(e))).await;
                    }
                }
            });

            Ok(stream)
        })
    }

    fn force_remove<'a>(&'a self, handle: &'a ContainerHandle) -> RuntimeFuture<'a, ()> {
        Box::pin(async move {
            let args = vec![
                "rm".to_string(),
                "--force".to_string(),
                "--volumes".to_string(),
                handle.to_string(),
            ];
            self.invoke("rm", args).await.map(|_| ())
        })
    }
}

/// Copy `reader` into the log channel chunk by chunk.
///
/// Returns the last bytes seen so a failing `docker logs` can report why.
async fn pump<R>(mut reader: R, tx: LogSender) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut tail = Vec::new();

    let mut buf = vec![0u8; LOG_CHUNK_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                tail.extend_from_slice(&buf[..n]);
                if tail.len() > STDERR_TAIL {
                    tail.drain(..tail.len() - STDERR_TAIL);
                }
                if tx.send(Ok(buf[..n].to_vec())).await.is_err() {
                    // Reader went away; nobody wants the rest.
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(RuntimeError::Io(e))).await;
                break;
            }
        }
    }
    tail
}

/// Map a failed docker invocation onto a [`RuntimeError`].
pub fn classify_failure(op: &'static str, status: ExitStatus, stderr: &str) -> RuntimeError {
    let stderr = stderr.trim();
    if stderr.contains("No such container") {
        RuntimeError::NotFound(stderr.to_string())
    } else {
        RuntimeError::CommandFailed {
            op,
            status: status.to_string(),
            stderr: stderr.to_string(),
        }
    }
}
