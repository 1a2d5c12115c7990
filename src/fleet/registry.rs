// src/fleet/registry.rs

//! The set of containers a run has created, and their teardown.
//!
//! `register` and `remove_all` take the same async lock for their whole
//! duration, so concurrent registrations never lose an entry and a teardown
//! never walks a half-updated list.
//!
//! Creates that are still in flight when a teardown starts are tracked with
//! [`CreateTicket`]s, so an interrupt can wait for them to settle before the
//! process exits.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::exec::{ContainerHandle, ContainerRuntime};

/// Result of [`FleetRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The handle is tracked and will be removed by the next teardown.
    Accepted,
    /// A teardown already ran; the caller owns the container and must
    /// remove it itself.
    Sealed,
}

/// Counts from one [`FleetRegistry::remove_all`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub already_gone: usize,
    pub failed: usize,
}

impl CleanupReport {
    pub fn attempted(&self) -> usize {
        self.removed + self.already_gone + self.failed
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    handles: Vec<ContainerHandle>,
    sealed: bool,
}

/// Marks one `create` call as in flight.
///
/// Obtained from [`FleetRegistry::begin_create`]. Hold it until the created
/// container is registered or removed; dropping it settles the create.
#[derive(Debug)]
pub struct CreateTicket {
    pending: Arc<watch::Sender<usize>>,
}

impl Drop for CreateTicket {
    fn drop(&mut self) {
        self.pending.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Append-only registry of container handles, shared by every worker, the
/// coordinator and the interrupt watcher. Cloning shares the same registry.
#[derive(Clone)]
pub struct FleetRegistry {
    state: Arc<Mutex<RegistryState>>,
    pending: Arc<watch::Sender<usize>>,
    runtime: Arc<dyn ContainerRuntime>,
}

impl fmt::Debug for FleetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FleetRegistry").finish_non_exhaustive()
    }
}

impl FleetRegistry {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
            pending: Arc::new(watch::Sender::new(0)),
            runtime,
        }
    }

    /// Announce a `create` that is about to be issued.
    ///
    /// Returns `None` once a teardown has started: nothing new may be created
    /// then. The check and the count happen under the registry lock, so every
    /// create either is refused or is visible to
    /// [`FleetRegistry::wait_for_pending_creates`].
    pub async fn begin_create(&self) -> Option<CreateTicket> {
        let state = self.state.lock().await;
        if state.sealed {
            return None;
        }
        self.pending.send_modify(|n| *n += 1);
        Some(CreateTicket {
            pending: Arc::clone(&self.pending),
        })
    }

    /// Number of creates whose container is neither registered nor removed.
    pub fn pending_creates(&self) -> usize {
        *self.pending.borrow()
    }

    /// Wait until every in-flight create has settled, for at most `limit`.
    ///
    /// Returns `false` if creates were still pending when the limit ran out.
    pub async fn wait_for_pending_creates(&self, limit: Duration) -> bool {
        let mut rx = self.pending.subscribe();
        matches!(
            tokio::time::timeout(limit, rx.wait_for(|n| *n == 0)).await,
            Ok(Ok(_))
        )
    }

    /// Track a freshly created container.
    ///
    /// Once a teardown has started the registry is sealed and the handle is
    /// refused, so it can't slip past a cleanup that already ran.
    pub async fn register(&self, handle: ContainerHandle) -> Registration {
        let mut state = self.state.lock().await;
        if state.sealed {
            return Registration::Sealed;
        }
        debug!(container = %handle.short(), "registered container");
        state.handles.push(handle);
        Registration::Accepted
    }

    /// Snapshot of every handle registered so far, in registration order.
    pub async fn handles(&self) -> Vec<ContainerHandle> {
        self.state.lock().await.handles.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.handles.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Force-remove every registered container.
    ///
    /// Each removal is attempted once; failures are logged and counted but
    /// never returned. Safe to call repeatedly and from concurrent callers:
    /// later calls re-attempt every handle and count "not found" as
    /// `already_gone`.
    pub async fn remove_all(&self) -> CleanupReport {
        let mut state = self.state.lock().await;
        state.sealed = true;

        let mut removals = JoinSet::new();
        for handle in state.handles.iter().cloned() {
            let runtime = Arc::clone(&self.runtime);
            removals.spawn(async move {
                let result = runtime.force_remove(&handle).await;
                (handle, result)
            });
        }

        let mut report = CleanupReport::default();
        while let Some(joined) = removals.join_next().await {
            match joined {
                Ok((handle, Ok(()))) => {
                    debug!(container = %handle.short(), "removed container");
                    report.removed += 1;
                }
                Ok((handle, Err(e))) if e.is_not_found() => {
                    debug!(container = %handle.short(), "container already gone");
                    report.already_gone += 1;
                }
                Ok((handle, Err(e))) => {
                    warn!(
                        container = %handle.short(),
                        error = %e,
                        "failed removing container"
                    );
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "container removal task died");
                    report.failed += 1;
                }
            }
        }
        drop(state);

        info!(
            removed = report.removed,
            already_gone = report.already_gone,
            failed = report.failed,
            "fleet teardown finished"
        );
        report
    }
}
