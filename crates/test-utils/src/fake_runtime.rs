use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tws::errors::RuntimeError;
use tws::exec::{ContainerHandle, ContainerRuntime, LogStream, RuntimeFuture};
use tws::fleet::WorkerSpec;

#[derive(Debug, Default)]
struct FakeState {
    next_id: u32,
    /// id -> container name
    names: HashMap<String, String>,
    live: HashSet<String>,
    created: Vec<WorkerSpec>,
    started: Vec<String>,
    remove_calls: Vec<String>,
    /// names whose `create` is parked at the gate
    held_creates: Vec<String>,
    gate_open: bool,
}

/// An in-memory container daemon.
///
/// - `create` hands out unique ids and tracks containers as "live"
/// - `force_remove` drops them again and returns `NotFound` for unknown ids
/// - failures (or panics) can be injected per container name
/// - `create` can be held at a gate until the test opens it
/// - `logs` can be held open until the container is removed, like a
///   followed `docker logs` on a long ab run
pub struct FakeRuntime {
    state: Arc<Mutex<FakeState>>,
    removed: Arc<Notify>,
    gate: Arc<Notify>,
    hold_create: HashSet<String>,
    panic_create: HashSet<String>,
    fail_create: HashSet<String>,
    fail_start: HashSet<String>,
    fail_logs: HashSet<String>,
    fail_remove: HashSet<String>,
    block_logs: bool,
    output: Vec<u8>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
            removed: Arc::new(Notify::new()),
            gate: Arc::new(Notify::new()),
            hold_create: HashSet::new(),
            panic_create: HashSet::new(),
            fail_create: HashSet::new(),
            fail_start: HashSet::new(),
            fail_logs: HashSet::new(),
            fail_remove: HashSet::new(),
            block_logs: false,
            output: b"Requests per second:    1234.56 [#/sec] (mean)\n".to_vec(),
        }
    }

    pub fn fail_create_for(mut self, name: &str) -> Self {
        self.fail_create.insert(name.to_string());
        self
    }

    /// Panic inside `create` for this container, as a buggy runtime would.
    pub fn panic_on_create_for(mut self, name: &str) -> Self {
        self.panic_create.insert(name.to_string());
        self
    }

    /// Park `create` for this container until [`FakeRuntime::open_create_gate`].
    pub fn hold_create_for(mut self, name: &str) -> Self {
        self.hold_create.insert(name.to_string());
        self
    }

    /// Let every held `create` proceed.
    pub fn open_create_gate(&self) {
        self.state.lock().unwrap().gate_open = true;
        self.gate.notify_waiters();
    }

    /// Poll until `n` creates are parked at the gate.
    pub async fn wait_for_held_creates(&self, n: usize) {
        while self.state.lock().unwrap().held_creates.len() < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    pub fn fail_start_for(mut self, name: &str) -> Self {
        self.fail_start.insert(name.to_string());
        self
    }

    pub fn fail_logs_for(mut self, name: &str) -> Self {
        self.fail_logs.insert(name.to_string());
        self
    }

    pub fn fail_remove_for(mut self, name: &str) -> Self {
        self.fail_remove.insert(name.to_string());
        self
    }

    /// Keep every log stream open until its container is removed.
    pub fn block_logs_until_removed(mut self) -> Self {
        self.block_logs = true;
        self
    }

    pub fn with_output(mut self, output: &[u8]) -> Self {
        self.output = output.to_vec();
        self
    }

    pub fn live_count(&self) -> usize {
        self.state.lock().unwrap().live.len()
    }

    pub fn live_ids(&self) -> HashSet<String> {
        self.state.lock().unwrap().live.clone()
    }

    pub fn created_specs(&self) -> Vec<WorkerSpec> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn created_count(&self) -> usize {
        self.state.lock().unwrap().created.len()
    }

    pub fn started_names(&self) -> Vec<String> {
        self.state.lock().unwrap().started.clone()
    }

    pub fn remove_attempts(&self, handle: &ContainerHandle) -> usize {
        self.state
            .lock()
            .unwrap()
            .remove_calls
            .iter()
            .filter(|id| id.as_str() == handle.as_str())
            .count()
    }

    pub fn total_remove_calls(&self) -> usize {
        self.state.lock().unwrap().remove_calls.len()
    }

    /// Poll until `n` containers have been started.
    pub async fn wait_for_started(&self, n: usize) {
        while self.started_names().len() < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn name_of(&self, id: &str) -> String {
        self.state
            .lock()
            .unwrap()
            .names
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    fn simulated(op: &'static str, what: &str) -> RuntimeError {
        RuntimeError::CommandFailed {
            op,
            status: "exit status: 125".to_string(),
            stderr: format!("simulated {what} failure"),
        }
    }
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRuntime for FakeRuntime {
    fn ping(&self) -> RuntimeFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn create<'a>(&'a self, spec: &'a WorkerSpec) -> RuntimeFuture<'a, ContainerHandle> {
        Box::pin(async move {
            // Let other workers interleave with this one.
            tokio::task::yield_now().await;

            if self.panic_create.contains(&spec.name) {
                panic!("simulated panic creating {}", spec.name);
            }
            if self.hold_create.contains(&spec.name) {
                self.state.lock().unwrap().held_creates.push(spec.name.clone());
                loop {
                    let opened = self.gate.notified();
                    tokio::pin!(opened);
                    opened.as_mut().enable();
                    let open = self.state.lock().unwrap().gate_open;
                    if open {
                        break;
                    }
                    opened.await;
                }
            }
            if self.fail_create.contains(&spec.name) {
                return Err(Self::simulated("create", "create"));
            }

            let mut state = self.state.lock().unwrap();
            let clash = state
                .live
                .iter()
                .any(|id| state.names.get(id) == Some(&spec.name));
            if clash {
                return Err(RuntimeError::CommandFailed {
                    op: "create",
                    status: "exit status: 125".to_string(),
                    stderr: format!("Conflict. The container name \"/{}\" is already in use", spec.name),
                });
            }

            state.next_id += 1;
            let n = state.next_id;
            let id = format!("{:08x}{:056x}", n.wrapping_mul(2_654_435_761), n);
            state.names.insert(id.clone(), spec.name.clone());
            state.live.insert(id.clone());
            state.created.push(spec.clone());
            Ok(ContainerHandle::new(id))
        })
    }

    fn start<'a>(&'a self, handle: &'a ContainerHandle) -> RuntimeFuture<'a, ()> {
        Box::pin(async move {
            tokio::task::yield_now().await;

            let name = self.name_of(handle.as_str());
            if self.fail_start.contains(&name) {
                return Err(Self::simulated("start", "start"));
            }

            let mut state = self.state.lock().unwrap();
            if !state.live.contains(handle.as_str()) {
                return Err(RuntimeError::NotFound(handle.to_string()));
            }
            state.started.push(name);
            Ok(())
        })
    }

    fn logs<'a>(&'a self, handle: &'a ContainerHandle) -> RuntimeFuture<'a, LogStream> {
        Box::pin(async move {
            let name = self.name_of(handle.as_str());
            if self.fail_logs.contains(&name) {
                return Err(Self::simulated("logs", "logs"));
            }
            if !self.block_logs {
                return Ok(LogStream::from_bytes(self.output.clone()));
            }

            let (tx, stream) = LogStream::channel(4);
            let state = Arc::clone(&self.state);
            let removed = Arc::clone(&self.removed);
            let output = self.output.clone();
            let id = handle.to_string();

            tokio::spawn(async move {
                let _ = tx.send(Ok(output)).await;
                loop {
                    let notified = removed.notified();
                    tokio::pin!(notified);
                    notified.as_mut().enable();
                    let alive = state.lock().unwrap().live.contains(&id);
                    if !alive {
                        break;
                    }
                    notified.await;
                }
            });

            Ok(stream)
        })
    }

    fn force_remove<'a>(&'a self, handle: &'a ContainerHandle) -> RuntimeFuture<'a, ()> {
        Box::pin(async move {
            tokio::task::yield_now().await;

            let name = self.name_of(handle.as_str());
            let result = {
                let mut state = self.state.lock().unwrap();
                state.remove_calls.push(handle.to_string());
                if self.fail_remove.contains(&name) && state.live.contains(handle.as_str()) {
                    Err(Self::simulated("rm", "remove"))
                } else if state.live.remove(handle.as_str()) {
                    Ok(())
                } else {
                    Err(RuntimeError::NotFound(format!(
                        "Error response from daemon: No such container: {handle}"
                    )))
                }
            };

            if result.is_ok() {
                self.removed.notify_waiters();
            }
            result
        })
    }
}
