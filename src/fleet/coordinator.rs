// src/fleet/coordinator.rs

//! Fan-out of N workers and the scoped teardown that follows it.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::config::FleetConfig;
use crate::exec::ContainerRuntime;

use super::registry::{CleanupReport, FleetRegistry};
use super::template::{LaunchTemplate, WorkerSpec};
use super::worker::run_worker;
use super::FleetReport;

/// Spawns the fleet, waits for it, and tears it down.
pub struct Coordinator {
    containers: usize,
    image: String,
    name_prefix: String,
    template: Arc<LaunchTemplate>,
    runtime: Arc<dyn ContainerRuntime>,
    registry: FleetRegistry,
}

impl Coordinator {
    pub fn new(config: &FleetConfig, runtime: Arc<dyn ContainerRuntime>) -> Self {
        let registry = FleetRegistry::new(Arc::clone(&runtime));
        Self {
            containers: config.containers,
            image: config.image.clone(),
            name_prefix: config.name_prefix.clone(),
            template: Arc::new(config.template.clone()),
            runtime,
            registry,
        }
    }

    /// The registry this coordinator tears down; share it with the
    /// interrupt watcher.
    pub fn registry(&self) -> FleetRegistry {
        self.registry.clone()
    }

    /// Specs for ordinals `1..=N`, in order.
    pub fn worker_specs(&self) -> Vec<WorkerSpec> {
        (1..=self.containers)
            .map(|i| WorkerSpec::new(i, &self.image, &self.name_prefix, &self.template))
            .collect()
    }

    /// Run the whole fleet and remove every container it created.
    ///
    /// Returns once every worker has finished and the teardown is done. If
    /// this future is dropped early the teardown still runs, on a spawned
    /// task (see [`TeardownGuard`]).
    pub async fn run(self) -> (FleetReport, CleanupReport) {
        let guard = TeardownGuard::new(self.registry.clone());

        let report = self.fan_out().await;
        info!(
            total = report.total(),
            completed = report.completed(),
            failed = report.failed(),
            "all workers finished"
        );

        let cleanup = guard.release().await;
        (report, cleanup)
    }

    async fn fan_out(&self) -> FleetReport {
        let mut workers = JoinSet::new();

        for spec in self.worker_specs() {
            let runtime = Arc::clone(&self.runtime);
            let registry = self.registry.clone();
            workers.spawn(async move {
                let index = spec.index;
                (index, run_worker(spec, runtime, registry).await)
            });
        }
        debug!(workers = workers.len(), "fleet spawned");

        let mut report = FleetReport::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    debug!(index, %outcome, "worker finished");
                    report.record(index, outcome);
                }
                Err(e) => {
                    error!(error = %e, "worker task died");
                    report.record_lost();
                }
            }
        }
        report
    }
}

/// Removes the fleet when the coordinator's scope ends.
///
/// The normal path awaits [`TeardownGuard::release`]. If the guard is dropped
/// unreleased (the run future was dropped or a panic unwound through it),
/// the teardown is spawned on the current Tokio runtime instead.
///
/// That fallback is best effort: it only runs if the runtime keeps going.
/// A panic that unwinds out of `#[tokio::main]` shuts the runtime down, and
/// the spawned teardown is dropped with it.
pub struct TeardownGuard {
    registry: Option<FleetRegistry>,
}

impl TeardownGuard {
    pub fn new(registry: FleetRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    pub async fn release(mut self) -> CleanupReport {
        match self.registry.take() {
            Some(registry) => registry.remove_all().await,
            None => CleanupReport::default(),
        }
    }
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        let Some(registry) = self.registry.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                info!("coordinator scope left early; tearing down fleet in the background");
                rt.spawn(async move {
                    registry.remove_all().await;
                });
            }
            Err(_) => error!("no async runtime left to tear down the fleet"),
        }
    }
}
