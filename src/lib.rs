// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fleet;
pub mod logging;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::FleetConfig;
use crate::exec::{ContainerRuntime, DockerCli};
use crate::fleet::{Coordinator, FleetReport, WorkerOutcome, spawn_interrupt_watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + flags)
/// - the docker runtime
/// - the fleet coordinator
/// - SIGINT / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config = config::resolve(&args).context("loading configuration")?;
    let docker = DockerCli::new(config.docker.clone());

    if args.dry_run {
        print_dry_run(&config, &docker);
        return Ok(());
    }

    docker
        .ping()
        .await
        .context("connecting to the docker daemon")?;

    let runtime: Arc<dyn ContainerRuntime> = Arc::new(docker);
    let report = run_fleet(&config, runtime).await;
    log_summary(&report);

    Ok(())
}

/// Run one fleet against `runtime` with interrupt handling installed.
///
/// The watcher is stopped once the coordinator's own teardown is done.
pub async fn run_fleet(config: &FleetConfig, runtime: Arc<dyn ContainerRuntime>) -> FleetReport {
    let coordinator = Coordinator::new(config, runtime);
    let watcher = spawn_interrupt_watcher(coordinator.registry());

    info!(
        containers = config.containers,
        image = %config.image,
        target = %config.template.target,
        "throwing spears"
    );
    let (report, _cleanup) = coordinator.run().await;

    watcher.abort();
    report
}

fn log_summary(report: &FleetReport) {
    for (index, outcome) in report.outcomes() {
        if !outcome.is_success() {
            warn!(index, %outcome, "worker did not complete");
        }
    }
    info!(
        completed = report.completed(),
        log_read_failed = report.count(WorkerOutcome::LogReadFailed),
        create_failed = report.count(WorkerOutcome::CreateFailed),
        start_failed = report.count(WorkerOutcome::StartFailed),
        discarded = report.discarded(),
        lost = report.lost(),
        "run finished"
    );
}

/// Simple dry-run output: print every container that would be launched.
fn print_dry_run(config: &FleetConfig, docker: &DockerCli) {
    let specs = (1..=config.containers).map(|i| {
        fleet::WorkerSpec::new(i, &config.image, &config.name_prefix, &config.template)
    });

    println!("tws dry-run");
    println!("  target = {}", config.template.target);
    println!("  containers = {}", config.containers);
    println!("  image = {}", config.image);
    if let Some(ref host) = config.docker.host {
        println!("  docker host = {host}");
    }
    if config.docker.tls.is_some() {
        println!("  docker tls = client certificate");
    }
    println!();

    let global = docker.global_args();
    for spec in specs {
        let mut line = vec![docker.program().to_string()];
        line.extend(global.iter().cloned());
        line.extend(DockerCli::create_args(&spec));
        println!("  - {}", line.join(" "));
    }

    debug!("dry-run complete (no containers created)");
}
