// src/fleet/worker.rs

//! One container's lifecycle: create, register, start, follow logs.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::exec::ContainerRuntime;

use super::registry::{FleetRegistry, Registration};
use super::template::WorkerSpec;
use super::WorkerOutcome;

/// Drive one container from creation to the end of its ab run.
///
/// Stops at the first error and reports it through the returned outcome and
/// the log; never panics or fails the fleet. A container that was created is
/// always either in the registry or already removed when this returns, and
/// its create stays announced to the registry until then.
pub async fn run_worker(
    spec: WorkerSpec,
    runtime: Arc<dyn ContainerRuntime>,
    registry: FleetRegistry,
) -> WorkerOutcome {
    info!(
        worker = %spec.name,
        index = spec.index,
        "giving tupperware container some spears"
    );

    let Some(ticket) = registry.begin_create().await else {
        warn!(worker = %spec.name, "fleet is being torn down; not creating container");
        return WorkerOutcome::Discarded;
    };

    let handle = match runtime.create(&spec).await {
        Ok(handle) => handle,
        Err(e) => {
            error!(worker = %spec.name, error = %e, "error while creating container");
            return WorkerOutcome::CreateFailed;
        }
    };
    debug!(worker = %spec.name, container = %handle.short(), "container created");

    if registry.register(handle.clone()).await == Registration::Sealed {
        warn!(
            worker = %spec.name,
            container = %handle.short(),
            "fleet is being torn down; removing container created too late"
        );
        if let Err(e) = runtime.force_remove(&handle).await {
            if !e.is_not_found() {
                warn!(container = %handle.short(), error = %e, "failed removing container");
            }
        }
        drop(ticket);
        return WorkerOutcome::Discarded;
    }
    drop(ticket);

    if let Err(e) = runtime.start(&handle).await {
        error!(worker = %spec.name, error = %e, "error while starting container");
        return WorkerOutcome::StartFailed;
    }
    debug!(worker = %spec.name, container = %handle.short(), "container started");

    let stream = match runtime.logs(&handle).await {
        Ok(stream) => stream,
        Err(e) => {
            error!(worker = %spec.name, error = %e, "error streaming container's logs");
            return WorkerOutcome::LogReadFailed;
        }
    };

    match stream.read_to_end().await {
        Ok(body) => {
            info!(
                worker = %spec.name,
                "logs for container:\n{}",
                String::from_utf8_lossy(&body)
            );
            WorkerOutcome::Completed
        }
        Err(e) => {
            error!(worker = %spec.name, error = %e, "error reading container's logs");
            WorkerOutcome::LogReadFailed
        }
    }
}
