// src/fleet/interrupt.rs

//! Ctrl-C / SIGTERM handling.
//!
//! The watcher races the coordinator: whichever notices the end of the run
//! first calls [`FleetRegistry::remove_all`], and the other one repeats it
//! harmlessly.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::registry::FleetRegistry;

/// Exit status used when the run was interrupted.
pub const INTERRUPTED_EXIT_CODE: i32 = 1;

/// How long an interrupt waits for creates that were already in flight when
/// the teardown started.
pub const LATE_CREATE_GRACE: Duration = Duration::from_secs(15);

/// Resolves on the first SIGINT or SIGTERM.
pub async fn wait_for_termination() -> io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res,
            _ = term.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// Wait for `signal`, then tear the fleet down.
///
/// After `remove_all` the registry is sealed, but creates issued before that
/// may still be in flight. Their workers remove those containers themselves;
/// this waits up to [`LATE_CREATE_GRACE`] for them so the process doesn't
/// exit first.
///
/// Returns the exit status the process should terminate with, or `None` if
/// the signal listener itself failed (the run then continues unwatched).
pub async fn teardown_on_interrupt<S>(signal: S, registry: FleetRegistry) -> Option<i32>
where
    S: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!(error = %e, "failed to listen for termination signals");
        return None;
    }

    info!("received termination signal, removing all tupperware with spears...");
    registry.remove_all().await;

    let pending = registry.pending_creates();
    if pending > 0 {
        info!(pending, "waiting for in-flight creates to be cleaned up");
        if !registry.wait_for_pending_creates(LATE_CREATE_GRACE).await {
            warn!(
                pending = registry.pending_creates(),
                "gave up waiting for in-flight creates; containers may be left behind"
            );
        }
    }
    Some(INTERRUPTED_EXIT_CODE)
}

/// Spawn the process-wide watcher: on SIGINT/SIGTERM the fleet is removed
/// and the process exits with [`INTERRUPTED_EXIT_CODE`].
pub fn spawn_interrupt_watcher(registry: FleetRegistry) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Some(code) = teardown_on_interrupt(wait_for_termination(), registry).await {
            std::process::exit(code);
        }
    })
}
