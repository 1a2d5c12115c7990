// src/fleet/mod.rs

//! The container fleet: N workers, the registry of what they created, and
//! the two paths that tear it down.
//!
//! - [`template`]: the shared ab invocation and per-container specs.
//! - [`worker`]: one container's lifecycle.
//! - [`registry`]: the lock-guarded set of created containers.
//! - [`coordinator`]: fan-out, barrier and scoped teardown.
//! - [`interrupt`]: SIGINT/SIGTERM teardown.

use std::collections::BTreeMap;
use std::fmt;

pub mod coordinator;
pub mod interrupt;
pub mod registry;
pub mod template;
pub mod worker;

pub use coordinator::{Coordinator, TeardownGuard};
pub use interrupt::{
    INTERRUPTED_EXIT_CODE, LATE_CREATE_GRACE, spawn_interrupt_watcher, teardown_on_interrupt,
    wait_for_termination,
};
pub use registry::{CleanupReport, CreateTicket, FleetRegistry, Registration};
pub use template::{LaunchTemplate, WorkerSpec, container_name, normalize_target};
pub use worker::run_worker;

/// How a single worker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkerOutcome {
    /// Created, started, and its output fully read.
    Completed,
    /// Created and started, but following or reading its output failed.
    LogReadFailed,
    /// The runtime refused to create the container.
    CreateFailed,
    /// Created (and registered) but would not start.
    StartFailed,
    /// Teardown began before the container was registered: it was either
    /// never created or removed on the spot. Never started.
    Discarded,
}

impl WorkerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerOutcome::Completed)
    }
}

impl fmt::Display for WorkerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerOutcome::Completed => "completed",
            WorkerOutcome::LogReadFailed => "log read failed",
            WorkerOutcome::CreateFailed => "create failed",
            WorkerOutcome::StartFailed => "start failed",
            WorkerOutcome::Discarded => "discarded",
        };
        f.write_str(s)
    }
}

/// Per-ordinal outcomes of one fleet run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetReport {
    outcomes: BTreeMap<usize, WorkerOutcome>,
    /// Worker tasks that panicked or were aborted.
    lost: usize,
}

impl FleetReport {
    pub fn record(&mut self, index: usize, outcome: WorkerOutcome) {
        self.outcomes.insert(index, outcome);
    }

    pub fn record_lost(&mut self) {
        self.lost += 1;
    }

    pub fn outcome(&self, index: usize) -> Option<WorkerOutcome> {
        self.outcomes.get(&index).copied()
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (usize, WorkerOutcome)> + '_ {
        self.outcomes.iter().map(|(i, o)| (*i, *o))
    }

    pub fn count(&self, outcome: WorkerOutcome) -> usize {
        self.outcomes.values().filter(|o| **o == outcome).count()
    }

    pub fn lost(&self) -> usize {
        self.lost
    }

    pub fn total(&self) -> usize {
        self.outcomes.len() + self.lost
    }

    pub fn completed(&self) -> usize {
        self.count(WorkerOutcome::Completed)
    }

    /// Workers that never ran because teardown had already started.
    pub fn discarded(&self) -> usize {
        self.count(WorkerOutcome::Discarded)
    }

    pub fn failed(&self) -> usize {
        self.total() - self.completed()
    }
}
