//! Resumable interpreter for YOLOL programs
//!
//! Every [`Vm`] runs its program on its own thread. A VM starts out
//! paused; [`Vm::resume`], [`Vm::pause`], [`Vm::step`] and
//! [`Vm::terminate`] only record a request, which the runner thread picks
//! up between two lines (or while it waits). Handlers run on the runner
//! thread, outside of any lock, and get the VM passed in so they can read
//! variables or request state changes themselves.
//!
//! The program space always has [`PROGRAM_LINES`] lines. Lines past the end
//! of the program are empty, and execution wraps from the last line back to
//! the first.
//!
//! ```no_run
//! use yolol_vm::vm::Vm;
//! use yolol_vm::Value;
//!
//! let vm = Vm::from_source("a=1+2 b=a==3").unwrap();
//! vm.set_max_executed_lines(1);
//! vm.resume();
//! vm.wait_for_termination();
//! assert_eq!(vm.get_variable("b"), Some(Value::from(1_i64)));
//! ```

mod coordinator;
mod error;
mod exec;
mod snapshot;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use yolol_vm_parser::ast::yolol::Program;
use yolol_vm_parser::parse_yolol;

use crate::error::RuntimeError;
use crate::value::Value;
use exec::{Flow, Frame};

pub use coordinator::Coordinator;
pub use error::VmError;
pub use snapshot::VmSnapshot;

/// Number of line slots of a chip
pub const PROGRAM_LINES: usize = 20;

static VARIABLE_NAME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(:[A-Za-z0-9_]+|[A-Za-z_][A-Za-z0-9_]*)$").ok());

pub(crate) fn is_valid_variable_name(name: &str) -> bool {
    VARIABLE_NAME.as_ref().is_some_and(|re| re.is_match(name))
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VmState {
    Paused,
    Running,
    /// Run one line, then pause
    Stepping,
    /// Final, a terminated VM never runs again
    Terminated,
}

/// Called before a line with a breakpoint runs. The VM is paused; returning
/// `true` keeps it running, otherwise the line runs once the VM is resumed.
pub type BreakpointHandler = Box<dyn FnMut(&Vm, usize) -> bool + Send>;
/// Called when a line fails. Returning `true` keeps the VM running, `false`
/// pauses it. Without a handler a runtime error terminates the VM.
pub type ErrorHandler = Box<dyn FnMut(&Vm, &RuntimeError) -> bool + Send>;
pub type StepHandler = Box<dyn FnMut(&Vm) + Send>;
pub type FinishHandler = Box<dyn FnMut(&Vm) + Send>;
pub type VariableChangedHandler = Box<dyn FnMut(&Vm, &str, &Value) + Send>;

#[derive(Default)]
struct Handlers {
    breakpoint: Option<BreakpointHandler>,
    error: Option<ErrorHandler>,
    step: Option<StepHandler>,
    finish: Option<FinishHandler>,
    variable_changed: Option<VariableChangedHandler>,
}

/// Wakes the runner thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signal {
    /// The requested state changed
    Wake,
    /// The coordinator allows one line
    Turn,
    /// The coordinator shuts the VM down
    Terminate,
    /// A user handle was dropped
    Detached,
}

#[derive(Debug)]
struct Inner {
    state: VmState,
    variables: HashMap<String, Value>,
    breakpoints: BTreeSet<usize>,
    /// 1-based line that runs next
    current_line: usize,
    executed_lines: u64,
    max_executed_lines: Option<u64>,
    last_error: Option<RuntimeError>,
    /// The runner is blocked waiting for a signal
    parked: bool,
    /// Set once cleanup is complete
    finished: bool,
}

struct Shared {
    program: Program,
    inner: Mutex<Inner>,
    changed: Condvar,
    handlers: Mutex<Handlers>,
    coordinator: Option<Coordinator>,
}

/// Shared by the clones of one user handle. The runner only keeps a weak
/// reference, so it notices when the last handle is gone.
struct Link {
    inbox: Sender<Signal>,
}

impl Drop for Link {
    fn drop(&mut self) {
        let _ = self.inbox.send(Signal::Detached);
    }
}

/// Handle to a running program. Clones refer to the same VM; once every
/// handle is dropped the VM terminates.
#[derive(Clone)]
pub struct Vm {
    shared: Arc<Shared>,
    link: Arc<Link>,
}

impl std::fmt::Debug for Vm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.shared.inner);
        f.debug_struct("Vm")
            .field("state", &inner.state)
            .field("current_line", &inner.current_line)
            .field("executed_lines", &inner.executed_lines)
            .field("coordinated", &self.shared.coordinator.is_some())
            .finish()
    }
}

impl Vm {
    /// Start a paused VM for an already parsed program
    pub fn new(program: Program) -> Self {
        Self::spawn(program, None)
    }

    pub fn from_source(source: &str) -> Result<Self, VmError> {
        Ok(Self::new(parse_yolol(source)?))
    }

    /// Start a paused VM whose global variables live in `coordinator` and
    /// which only runs a line when the coordinator hands it a turn
    pub fn new_coordinated(program: Program, coordinator: &Coordinator) -> Self {
        Self::spawn(program, Some(coordinator.clone()))
    }

    fn spawn(program: Program, coordinator: Option<Coordinator>) -> Self {
        let (inbox, signals) = mpsc::channel();
        let shared = Arc::new(Shared {
            program,
            inner: Mutex::new(Inner {
                state: VmState::Paused,
                variables: HashMap::new(),
                breakpoints: BTreeSet::new(),
                current_line: 1,
                executed_lines: 0,
                max_executed_lines: None,
                last_error: None,
                parked: false,
                finished: false,
            }),
            changed: Condvar::new(),
            handlers: Mutex::new(Handlers::default()),
            coordinator,
        });
        let link = Arc::new(Link {
            inbox: inbox.clone(),
        });
        let turns = shared
            .coordinator
            .as_ref()
            .map(|coordinator| coordinator.register(inbox.clone()));
        let runner = Runner {
            shared: Arc::clone(&shared),
            inbox,
            link: Arc::downgrade(&link),
            signals,
            turns,
            pending_turn: false,
            resumed_at: None,
        };
        let vm = Vm { shared, link };
        thread::spawn(move || runner.run());
        debug!(lines = vm.shared.program.lines.len(), "vm created");
        vm
    }

    pub fn program(&self) -> &Program {
        &self.shared.program
    }

    pub fn resume(&self) {
        self.request(VmState::Running);
    }

    pub fn pause(&self) {
        self.request(VmState::Paused);
    }

    /// Run exactly one line, then pause and call the step handler
    pub fn step(&self) {
        self.request(VmState::Stepping);
    }

    pub fn terminate(&self) {
        self.request(VmState::Terminated);
    }

    fn request(&self, state: VmState) {
        {
            let mut inner = lock(&self.shared.inner);
            if inner.state == VmState::Terminated || inner.state == state {
                return;
            }
            trace!(from = ?inner.state, to = ?state, "state requested");
            inner.state = state;
        }
        self.shared.changed.notify_all();
        // The runner is gone once terminated
        let _ = self.link.inbox.send(Signal::Wake);
    }

    pub fn state(&self) -> VmState {
        lock(&self.shared.inner).state
    }

    /// 1-based line that runs next
    pub fn current_line(&self) -> usize {
        lock(&self.shared.inner).current_line
    }

    pub fn executed_lines(&self) -> u64 {
        lock(&self.shared.inner).executed_lines
    }

    pub fn last_error(&self) -> Option<RuntimeError> {
        lock(&self.shared.inner).last_error.clone()
    }

    pub fn add_breakpoint(&self, line: usize) {
        lock(&self.shared.inner).breakpoints.insert(line);
    }

    pub fn remove_breakpoint(&self, line: usize) {
        lock(&self.shared.inner).breakpoints.remove(&line);
    }

    pub fn breakpoints(&self) -> Vec<usize> {
        lock(&self.shared.inner).breakpoints.iter().copied().collect()
    }

    /// Terminate after this many lines in total
    pub fn set_max_executed_lines(&self, max: u64) {
        lock(&self.shared.inner).max_executed_lines = Some(max);
    }

    /// Current value of a variable, `None` if it was never written.
    /// Globals of a coordinated VM are read from the coordinator.
    pub fn get_variable(&self, name: &str) -> Option<Value> {
        match &self.shared.coordinator {
            Some(coordinator) if name.starts_with(':') => coordinator.load(name),
            _ => lock(&self.shared.inner).variables.get(name).cloned(),
        }
    }

    pub fn set_variable(&self, name: &str, value: impl Into<Value>) -> Result<(), VmError> {
        if !is_valid_variable_name(name) {
            return Err(VmError::InvalidVariableName(name.to_string()));
        }
        let value = value.into();
        match &self.shared.coordinator {
            Some(coordinator) if name.starts_with(':') => coordinator.store(name, value),
            _ => {
                lock(&self.shared.inner)
                    .variables
                    .insert(name.to_string(), value);
            }
        }
        Ok(())
    }

    /// Every variable the VM holds itself; a coordinated VM's globals are
    /// in [`Coordinator::get_variables`]
    pub fn get_variables(&self) -> BTreeMap<String, Value> {
        lock(&self.shared.inner)
            .variables
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn set_breakpoint_handler(&self, handler: impl FnMut(&Vm, usize) -> bool + Send + 'static) {
        lock(&self.shared.handlers).breakpoint = Some(Box::new(handler));
    }

    pub fn set_error_handler(
        &self,
        handler: impl FnMut(&Vm, &RuntimeError) -> bool + Send + 'static,
    ) {
        lock(&self.shared.handlers).error = Some(Box::new(handler));
    }

    pub fn set_step_handler(&self, handler: impl FnMut(&Vm) + Send + 'static) {
        lock(&self.shared.handlers).step = Some(Box::new(handler));
    }

    pub fn set_finish_handler(&self, handler: impl FnMut(&Vm) + Send + 'static) {
        lock(&self.shared.handlers).finish = Some(Box::new(handler));
    }

    pub fn set_variable_changed_handler(
        &self,
        handler: impl FnMut(&Vm, &str, &Value) + Send + 'static,
    ) {
        lock(&self.shared.handlers).variable_changed = Some(Box::new(handler));
    }

    /// Block until the VM has terminated and its finish handler returned
    pub fn wait_for_termination(&self) {
        let mut inner = lock(&self.shared.inner);
        while !inner.finished {
            inner = self
                .shared
                .changed
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`Vm::wait_for_termination`]; `false` if the VM is still alive
    /// after `timeout`
    pub fn wait_for_termination_timeout(&self, timeout: Duration) -> bool {
        let inner = lock(&self.shared.inner);
        let (inner, _) = self
            .shared
            .changed
            .wait_timeout_while(inner, timeout, |inner| !inner.finished)
            .unwrap_or_else(PoisonError::into_inner);
        inner.finished
    }

    /// Block until the runner has stopped in the paused state (any handler
    /// that paused it has returned) or has finished. `false` on timeout.
    pub fn wait_for_pause(&self, timeout: Duration) -> bool {
        let stopped =
            |inner: &Inner| inner.finished || (inner.state == VmState::Paused && inner.parked);
        let inner = lock(&self.shared.inner);
        let (inner, _) = self
            .shared
            .changed
            .wait_timeout_while(inner, timeout, |inner| !stopped(inner))
            .unwrap_or_else(PoisonError::into_inner);
        stopped(&inner)
    }

    pub fn snapshot(&self) -> VmSnapshot {
        let inner = lock(&self.shared.inner);
        VmSnapshot {
            state: inner.state,
            current_line: inner.current_line,
            executed_lines: inner.executed_lines,
            variables: inner
                .variables
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            last_error: inner.last_error.as_ref().map(ToString::to_string),
        }
    }

    pub fn snapshot_json(&self) -> Result<String, VmError> {
        serde_json::to_string_pretty(&self.snapshot()).map_err(|e| VmError::Snapshot(e.to_string()))
    }
}

/// Stops the runner; every path that ends a VM funnels through it
#[derive(Debug)]
enum Interrupt {
    Kill,
}

/// What one line did
struct LineOutcome {
    writes: Vec<(String, Value)>,
    error: Option<RuntimeError>,
    limit_reached: bool,
}

struct Runner {
    shared: Arc<Shared>,
    /// Used to build handles for handlers once every user handle is gone
    inbox: Sender<Signal>,
    link: Weak<Link>,
    signals: Receiver<Signal>,
    /// Coordinator id and the channel reporting finished lines to it
    turns: Option<(usize, Sender<()>)>,
    pending_turn: bool,
    /// Line whose breakpoint already paused the VM; it runs on resume
    resumed_at: Option<usize>,
}

impl Runner {
    fn run(mut self) {
        if let Err(Interrupt::Kill) = self.run_lines() {
            trace!("vm killed");
        }
        self.finish();
    }

    fn run_lines(&mut self) -> Result<(), Interrupt> {
        loop {
            self.checkpoint()?;
            if self.stop_at_breakpoint() {
                continue;
            }
            let outcome = self.execute_line();
            if let Some((_, done)) = &self.turns {
                // The coordinator waits for this before the next VM's turn
                let _ = done.send(());
            }
            self.after_line(outcome)?;
        }
    }

    /// A handle for handlers; the user's handle if one is still alive
    fn handle(&mut self) -> Vm {
        let link = match self.link.upgrade() {
            Some(link) => link,
            None => {
                let link = Arc::new(Link {
                    inbox: self.inbox.clone(),
                });
                self.link = Arc::downgrade(&link);
                link
            }
        };
        Vm {
            shared: Arc::clone(&self.shared),
            link,
        }
    }

    fn state(&self) -> VmState {
        lock(&self.shared.inner).state
    }

    /// Apply queued requests and block until the VM may run its next line
    fn checkpoint(&mut self) -> Result<(), Interrupt> {
        loop {
            loop {
                match self.signals.try_recv() {
                    Ok(signal) => self.receive(signal)?,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return Err(Interrupt::Kill),
                }
            }
            let ready = match self.state() {
                VmState::Terminated => return Err(Interrupt::Kill),
                VmState::Paused => false,
                VmState::Running | VmState::Stepping => {
                    self.turns.is_none() || self.pending_turn
                }
            };
            if ready {
                self.pending_turn = false;
                return Ok(());
            }
            self.set_parked(true);
            let signal = self.signals.recv();
            self.set_parked(false);
            self.receive(signal.map_err(|_| Interrupt::Kill)?)?;
        }
    }

    fn set_parked(&self, parked: bool) {
        lock(&self.shared.inner).parked = parked;
        self.shared.changed.notify_all();
    }

    fn receive(&mut self, signal: Signal) -> Result<(), Interrupt> {
        match signal {
            Signal::Wake => {}
            Signal::Turn => self.pending_turn = true,
            Signal::Terminate => return Err(Interrupt::Kill),
            Signal::Detached if self.link.strong_count() == 0 => {
                debug!("every handle dropped");
                return Err(Interrupt::Kill);
            }
            Signal::Detached => {}
        }
        Ok(())
    }

    /// Pause a running VM in front of a line with a breakpoint. `true` if
    /// the line must not run now.
    fn stop_at_breakpoint(&mut self) -> bool {
        let line = lock(&self.shared.inner).current_line;
        if self.resumed_at.take() == Some(line) {
            return false;
        }
        let at_breakpoint = lock(&self.shared.inner).breakpoints.contains(&line);
        if !at_breakpoint || !self.transition(VmState::Running, VmState::Paused) {
            return false;
        }
        debug!(line, "breakpoint hit");
        let keep_running = self
            .call(|h| &mut h.breakpoint, |handler, vm| handler(vm, line))
            .unwrap_or(false);
        if keep_running && self.transition(VmState::Paused, VmState::Running) {
            return false;
        }
        self.resumed_at = Some(line);
        if self.turns.is_some() {
            // The turn is still owed, the coordinator waits for this line
            self.pending_turn = true;
        }
        true
    }

    fn execute_line(&mut self) -> LineOutcome {
        let shared = &self.shared;
        let mut guard = lock(&shared.inner);
        let inner = &mut *guard;
        let line = inner.current_line;

        let mut frame = Frame::new(&mut inner.variables, shared.coordinator.as_ref(), line);
        let result = match shared.program.lines.get(line - 1) {
            Some(program_line) => frame.run_line(program_line),
            None => Ok(Flow::Next),
        };
        let writes = frame.writes;

        let next = |line: usize| if line >= PROGRAM_LINES { 1 } else { line + 1 };
        let error = match result {
            Ok(Flow::Next) => {
                inner.current_line = next(line);
                None
            }
            Ok(Flow::Goto(target)) => {
                inner.current_line = target;
                None
            }
            Err(error) => {
                // The rest of a failed line is skipped
                inner.current_line = next(line);
                inner.last_error = Some(error.clone());
                Some(error)
            }
        };
        inner.executed_lines += 1;
        let limit_reached = inner
            .max_executed_lines
            .is_some_and(|max| inner.executed_lines >= max);
        trace!(line, next = inner.current_line, "line executed");
        LineOutcome {
            writes,
            error,
            limit_reached,
        }
    }

    fn after_line(&mut self, outcome: LineOutcome) -> Result<(), Interrupt> {
        for (name, value) in &outcome.writes {
            self.call(
                |h| &mut h.variable_changed,
                |handler, vm| handler(vm, name, value),
            );
        }

        if let Some(error) = outcome.error {
            let resume = self.call(|h| &mut h.error, |handler, vm| handler(vm, &error));
            match resume {
                None => {
                    warn!(%error, "unhandled runtime error");
                    return Err(Interrupt::Kill);
                }
                Some(false) => {
                    debug!(%error, "runtime error, pausing");
                    self.transition(VmState::Running, VmState::Paused);
                }
                Some(true) => debug!(%error, "runtime error, resuming"),
            }
        }

        if outcome.limit_reached {
            debug!("maximum number of executed lines reached");
            return Err(Interrupt::Kill);
        }

        if self.transition(VmState::Stepping, VmState::Paused) {
            self.call(|h| &mut h.step, |handler, vm| handler(vm));
        }
        Ok(())
    }

    /// Move from `from` to `to` unless someone requested another state in
    /// the meantime
    fn transition(&self, from: VmState, to: VmState) -> bool {
        let mut inner = lock(&self.shared.inner);
        if inner.state != from {
            return false;
        }
        inner.state = to;
        drop(inner);
        self.shared.changed.notify_all();
        trace!(?from, ?to, "state changed");
        true
    }

    /// Call a handler without holding any lock. Handlers may replace
    /// themselves while they run.
    fn call<H, R>(
        &mut self,
        slot: impl Fn(&mut Handlers) -> &mut Option<H>,
        call: impl FnOnce(&mut H, &Vm) -> R,
    ) -> Option<R> {
        let mut handler = slot(&mut lock(&self.shared.handlers)).take()?;
        let vm = self.handle();
        let result = call(&mut handler, &vm);
        drop(vm);
        let mut handlers = lock(&self.shared.handlers);
        let current = slot(&mut handlers);
        if current.is_none() {
            *current = Some(handler);
        }
        Some(result)
    }

    fn finish(mut self) {
        {
            let mut inner = lock(&self.shared.inner);
            inner.state = VmState::Terminated;
            debug!(
                executed_lines = inner.executed_lines,
                line = inner.current_line,
                "vm terminated"
            );
        }
        self.shared.changed.notify_all();

        if let Some((id, done)) = self.turns.take() {
            drop(done);
            if let Some(coordinator) = &self.shared.coordinator {
                coordinator.vm_finished(id);
            }
        }
        self.call(|h| &mut h.finish, |handler, vm| handler(vm));

        // Handlers may hold clones of this VM
        *lock(&self.shared.handlers) = Handlers::default();
        lock(&self.shared.inner).finished = true;
        self.shared.changed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn run_lines(source: &str, lines: u64) -> Vm {
        let vm = Vm::from_source(source).unwrap();
        vm.set_max_executed_lines(lines);
        vm.resume();
        assert!(vm.wait_for_termination_timeout(TIMEOUT));
        vm
    }

    #[test]
    fn test_starts_paused() {
        let vm = Vm::from_source("a=1").unwrap();
        assert_eq!(vm.state(), VmState::Paused);
        assert_eq!(vm.current_line(), 1);
        assert_eq!(vm.executed_lines(), 0);
        vm.terminate();
        assert!(vm.wait_for_termination_timeout(TIMEOUT));
        assert_eq!(vm.state(), VmState::Terminated);
        assert_eq!(vm.executed_lines(), 0);
    }

    #[test]
    fn test_simple_program() {
        let vm = run_lines("a=1+2 b=a==3", 1);
        assert_eq!(vm.get_variable("a"), Some(Value::from(3_i64)));
        assert_eq!(vm.get_variable("b"), Some(Value::from(1_i64)));
    }

    #[test]
    fn test_execution_wraps_after_twenty_lines() {
        let vm = run_lines("a++", 21);
        assert_eq!(vm.get_variable("a"), Some(Value::from(2_i64)));
        assert_eq!(vm.current_line(), 2);
    }

    #[test]
    fn test_goto_loop() {
        let vm = run_lines("a++ goto 1", 5);
        assert_eq!(vm.get_variable("a"), Some(Value::from(5_i64)));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(Vm::from_source("a=(1"), Err(VmError::Parse(_))));
    }

    #[test]
    fn test_set_variable_validates_names() {
        let vm = Vm::from_source("").unwrap();
        assert!(vm.set_variable("ok_name", 1_i64).is_ok());
        assert!(vm.set_variable(":global", "s").is_ok());
        assert_eq!(
            vm.set_variable("1abc", 1_i64),
            Err(VmError::InvalidVariableName("1abc".to_string()))
        );
        assert_eq!(vm.get_variables().len(), 2);
        vm.terminate();
    }

    #[test]
    fn test_step() {
        let vm = Vm::from_source("a=1\nb=2\nc=3").unwrap();
        let steps = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&steps);
        vm.set_step_handler(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        vm.step();
        assert!(vm.wait_for_pause(TIMEOUT));
        assert_eq!(steps.load(Ordering::SeqCst), 1);
        assert_eq!(vm.executed_lines(), 1);
        assert_eq!(vm.current_line(), 2);
        assert_eq!(vm.get_variable("a"), Some(Value::from(1_i64)));
        assert_eq!(vm.get_variable("b"), None);
        vm.terminate();
        assert!(vm.wait_for_termination_timeout(TIMEOUT));
    }

    #[test]
    fn test_breakpoint_pauses() {
        let vm = Vm::from_source("a=1\nb=2\nc=3").unwrap();
        vm.add_breakpoint(3);
        let hits = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&hits);
        vm.set_breakpoint_handler(move |_, line| {
            seen.lock().unwrap().push(line);
            false
        });
        vm.resume();
        assert!(vm.wait_for_pause(TIMEOUT));
        assert_eq!(vm.current_line(), 3);
        assert_eq!(vm.get_variable("b"), Some(Value::from(2_i64)));
        assert_eq!(vm.get_variable("c"), None);
        vm.terminate();
        assert!(vm.wait_for_termination_timeout(TIMEOUT));
        assert_eq!(*hits.lock().unwrap(), vec![3]);
    }

    #[test]
    fn test_unhandled_runtime_error_kills() {
        let vm = Vm::from_source("a=1/0\nb=1").unwrap();
        vm.resume();
        assert!(vm.wait_for_termination_timeout(TIMEOUT));
        assert_eq!(vm.get_variable("b"), None);
        let error = vm.last_error().unwrap();
        assert_eq!(error.line, 1);
        assert!(error.message.contains("zero"));
    }

    #[test]
    fn test_error_handler_can_resume() {
        let vm = Vm::from_source("a=1/0 c=1\nb=1").unwrap();
        let errors = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&errors);
        vm.set_error_handler(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        vm.set_max_executed_lines(2);
        vm.resume();
        assert!(vm.wait_for_termination_timeout(TIMEOUT));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(vm.get_variable("b"), Some(Value::from(1_i64)));
        assert_eq!(vm.get_variable("c"), None);
    }

    #[test]
    fn test_terminate_from_variable_handler() {
        let vm = Vm::from_source("a++ if a==3 then done=1 end goto 1").unwrap();
        vm.set_variable_changed_handler(|vm, name, value| {
            if name == "done" && *value == Value::from(1_i64) {
                vm.terminate();
            }
        });
        vm.set_max_executed_lines(1000);
        vm.resume();
        assert!(vm.wait_for_termination_timeout(TIMEOUT));
        assert_eq!(vm.executed_lines(), 3);
        assert_eq!(vm.get_variable("a"), Some(Value::from(3_i64)));
    }

    #[test]
    fn test_finish_handler_runs_once() {
        let vm = Vm::from_source("a=1").unwrap();
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&finished);
        vm.set_finish_handler(move |vm| {
            assert_eq!(vm.state(), VmState::Terminated);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        vm.set_max_executed_lines(3);
        vm.resume();
        vm.wait_for_termination();
        vm.terminate();
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_snapshot() {
        let vm = run_lines("a=\"x\" b=2", 1);
        let snapshot = vm.snapshot();
        assert_eq!(snapshot.state, VmState::Terminated);
        assert_eq!(snapshot.executed_lines, 1);
        assert_eq!(snapshot.current_line, 2);
        let json: serde_json::Value = serde_json::from_str(&vm.snapshot_json().unwrap()).unwrap();
        assert_eq!(json["variables"]["a"], "x");
        assert_eq!(json["state"], "Terminated");
    }
}
