//! Lock-step execution of several VMs that share global variables
//!
//! The coordinator hands out one line at a time: each registered VM runs a
//! single line, reports back, and only then does the next VM get its turn.
//! Globals written during a line are therefore visible to every line that
//! runs after it, whichever VM it belongs to.

use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;

use tracing::debug;
use yolol_vm_parser::ast::is_global;

use super::{is_valid_variable_name, lock, Signal, VmError};
use crate::value::Value;

/// A VM taking part in the rounds
struct Member {
    id: usize,
    inbox: Sender<Signal>,
    /// Closed when the VM leaves
    done: Receiver<()>,
}

#[derive(Default)]
struct Registry {
    next_id: usize,
    /// Registered but not yet picked up by the loop
    pending: Vec<Member>,
    /// Every VM that has not finished yet
    live: HashMap<usize, Sender<Signal>>,
    running: bool,
}

#[derive(Default)]
struct CoordinatorShared {
    globals: Mutex<HashMap<String, Value>>,
    registry: Mutex<Registry>,
    finished: Condvar,
}

/// Owns the global variables of a group of VMs and schedules their lines.
/// Clones refer to the same coordinator.
#[derive(Clone, Default)]
pub struct Coordinator {
    shared: Arc<CoordinatorShared>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = lock(&self.shared.registry);
        f.debug_struct("Coordinator")
            .field("vms", &registry.live.len())
            .field("running", &registry.running)
            .finish()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a VM to the next round. Returns its id and the channel it
    /// reports finished lines on.
    pub(crate) fn register(&self, inbox: Sender<Signal>) -> (usize, Sender<()>) {
        let (done_tx, done_rx) = mpsc::channel();
        let mut registry = lock(&self.shared.registry);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.live.insert(id, inbox.clone());
        registry.pending.push(Member {
            id,
            inbox,
            done: done_rx,
        });
        debug!(vm = id, "vm registered");
        (id, done_tx)
    }

    pub(crate) fn vm_finished(&self, id: usize) {
        let mut registry = lock(&self.shared.registry);
        registry.live.remove(&id);
        debug!(vm = id, remaining = registry.live.len(), "vm deregistered");
        drop(registry);
        self.shared.finished.notify_all();
    }

    /// Start handing out turns. The loop stops by itself once every VM is
    /// gone; calling this while it runs does nothing.
    pub fn run(&self) {
        {
            let mut registry = lock(&self.shared.registry);
            if registry.running {
                return;
            }
            registry.running = true;
        }
        let shared = Arc::clone(&self.shared);
        thread::spawn(move || run_rounds(shared));
    }

    /// Terminate every VM of the group
    pub fn terminate(&self) {
        let registry = lock(&self.shared.registry);
        debug!(vms = registry.live.len(), "terminating coordinated vms");
        for inbox in registry.live.values() {
            let _ = inbox.send(Signal::Terminate);
        }
    }

    /// Block until every registered VM has finished
    pub fn wait_for_termination(&self) {
        let mut registry = lock(&self.shared.registry);
        while !registry.live.is_empty() {
            registry = self
                .shared
                .finished
                .wait(registry)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.load(name)
    }

    pub fn set_variable(&self, name: &str, value: impl Into<Value>) -> Result<(), VmError> {
        if !is_valid_variable_name(name) {
            return Err(VmError::InvalidVariableName(name.to_string()));
        }
        if !is_global(name) {
            return Err(VmError::NotGlobal(name.to_string()));
        }
        self.store(name, value.into());
        Ok(())
    }

    pub fn get_variables(&self) -> BTreeMap<String, Value> {
        lock(&self.shared.globals)
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub(crate) fn load(&self, name: &str) -> Option<Value> {
        lock(&self.shared.globals).get(name).cloned()
    }

    pub(crate) fn store(&self, name: &str, value: Value) {
        lock(&self.shared.globals).insert(name.to_string(), value);
    }
}

/// Round-robin over the members in registration order until none is left
fn run_rounds(shared: Arc<CoordinatorShared>) {
    let mut members: Vec<Member> = Vec::new();
    debug!("coordinator started");
    loop {
        {
            let mut registry = lock(&shared.registry);
            members.append(&mut registry.pending);
            if members.is_empty() {
                registry.running = false;
                debug!("coordinator stopped, no vms left");
                return;
            }
        }
        // A VM that is gone either refuses the turn or closes `done`
        members.retain(|member| {
            let alive = member.inbox.send(Signal::Turn).is_ok() && member.done.recv().is_ok();
            if !alive {
                debug!(vm = member.id, "vm left the round");
            }
            alive
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globals() {
        let coordinator = Coordinator::new();
        assert_eq!(coordinator.get_variable(":a"), None);
        coordinator.set_variable(":a", "text").unwrap();
        assert_eq!(coordinator.get_variable(":a"), Some(Value::from("text")));
        assert_eq!(
            coordinator.set_variable("a", 1_i64),
            Err(VmError::NotGlobal("a".to_string()))
        );
        assert_eq!(coordinator.get_variables().len(), 1);
    }

    #[test]
    fn test_run_without_vms_stops() {
        let coordinator = Coordinator::new();
        coordinator.run();
        coordinator.wait_for_termination();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while lock(&coordinator.shared.registry).running && std::time::Instant::now() < deadline {
            thread::yield_now();
        }
        assert!(!lock(&coordinator.shared.registry).running);
    }
}
