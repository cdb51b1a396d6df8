//! Runtime that serializes event dispatch over a frozen machine definition.

use crate::checkpoint::Snapshot;
use crate::config::MachineConfig;
use crate::core::{label, Id, State, StateHistory, StateTransition, Trigger};
use crate::engine::error::{HookKind, MachineError};
use crate::engine::transition::Transition;
use crate::timer::Countdown;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Lifecycle of a machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Built, `start()` not called yet
    Configured,
    /// Started and accepting events
    Running,
    /// `stop()` in progress
    Stopping,
    /// `stop()` returned
    Stopped,
}

/// Event injected automatically after a state has been active for `delay`.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeoutEvent<E> {
    pub event: E,
    pub delay: Duration,
}

pub(crate) struct StateEntry<E> {
    pub(crate) state: Arc<dyn State<E>>,
    pub(crate) group: String,
}

/// Tables populated by the builder and never mutated afterwards.
pub(crate) struct Definition<S, E> {
    pub(crate) states: HashMap<S, StateEntry<E>>,
    pub(crate) transitions: HashMap<(S, E), Transition<S>>,
    pub(crate) timeouts: HashMap<S, TimeoutEvent<E>>,
    pub(crate) start: S,
}

/// State guarded by the dispatch lock.
struct Dispatch<S> {
    current: S,
    /// Generation of the countdown armed for `current`, if any.
    armed: Option<u64>,
}

struct ArmedCountdown {
    generation: u64,
    countdown: Countdown,
}

struct Shared<S, E> {
    config: MachineConfig,
    definition: Definition<S, E>,
    dispatch: Mutex<Dispatch<S>>,
    active: RwLock<S>,
    history: Mutex<StateHistory<S, E>>,
    armed: Mutex<Option<ArmedCountdown>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    generation: AtomicU64,
    started: AtomicBool,
    stopping: AtomicBool,
    stopped: AtomicBool,
}

impl<S, E> Drop for Shared<S, E> {
    fn drop(&mut self) {
        // Let a sleeping timer thread exit instead of holding a dead machine.
        if let Some(armed) = lock(&self.armed).take() {
            armed.countdown.cancel();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a running state machine.
///
/// Handles are cheap to clone; all clones drive the same machine. Every
/// transition, whatever thread or timer submitted its event, runs under a
/// single dispatch lock, so state hooks and transition actions never run
/// concurrently.
///
/// Build one with [`MachineBuilder`](crate::builder::MachineBuilder).
pub struct Machine<S: Id, E: Id> {
    shared: Arc<Shared<S, E>>,
}

impl<S: Id, E: Id> Clone for Machine<S, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: Id, E: Id> fmt::Debug for Machine<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.shared.config.name)
            .field("status", &self.status())
            .field("active", &self.active_state_id())
            .finish()
    }
}

/// Result of an [`Machine::operate_async`] submission.
///
/// Dropping it leaves the dispatch running in the background; failures are
/// then only logged.
#[derive(Debug)]
#[must_use = "drop the handle explicitly to fire and forget"]
pub struct PendingDispatch {
    rx: mpsc::Receiver<Result<(), MachineError>>,
}

impl PendingDispatch {
    fn resolved(result: Result<(), MachineError>) -> Self {
        let (tx, rx) = mpsc::channel();
        // The receiver is alive, so this cannot fail.
        let _ = tx.send(result);
        Self { rx }
    }

    /// Block until the dispatch has finished and return its result.
    pub fn wait(self) -> Result<(), MachineError> {
        self.rx.recv().unwrap_or(Err(MachineError::Disconnected))
    }

    /// Wait at most `timeout`; `None` if the dispatch is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<(), MachineError>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(mpsc::RecvTimeoutError::Timeout) => None,
            Err(mpsc::RecvTimeoutError::Disconnected) => Some(Err(MachineError::Disconnected)),
        }
    }
}

impl<S: Id, E: Id> Machine<S, E> {
    pub(crate) fn from_definition(
        config: MachineConfig,
        definition: Definition<S, E>,
        mut history: StateHistory<S, E>,
    ) -> Self {
        history.set_limit(config.history_limit);
        let start = definition.start.clone();
        Self {
            shared: Arc::new(Shared {
                dispatch: Mutex::new(Dispatch {
                    current: start.clone(),
                    armed: None,
                }),
                active: RwLock::new(start),
                history: Mutex::new(history),
                armed: Mutex::new(None),
                tasks: Mutex::new(Vec::new()),
                generation: AtomicU64::new(0),
                started: AtomicBool::new(false),
                stopping: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                config,
                definition,
            }),
        }
    }

    /// Name from the machine's configuration.
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    pub fn status(&self) -> Status {
        let shared = &self.shared;
        if shared.stopped.load(Ordering::SeqCst) {
            Status::Stopped
        } else if shared.stopping.load(Ordering::SeqCst) {
            Status::Stopping
        } else if shared.started.load(Ordering::SeqCst) {
            Status::Running
        } else {
            Status::Configured
        }
    }

    /// Activate the start state.
    ///
    /// Runs the start state's `on_entry` under the dispatch lock, arms its
    /// timeout and dispatches any event the hook returned. A second call
    /// fails with [`MachineError::AlreadyStarted`].
    pub fn start(&self) -> Result<(), MachineError> {
        if self.shared.started.swap(true, Ordering::SeqCst) {
            return Err(MachineError::AlreadyStarted);
        }

        let result = {
            let mut dispatch = lock(&self.shared.dispatch);
            info!(
                machine = %self.name(),
                state = ?dispatch.current,
                "starting state machine"
            );
            self.activate(&mut dispatch)
        };
        self.prune_tasks();
        result
    }

    fn activate(&self, dispatch: &mut Dispatch<S>) -> Result<(), MachineError> {
        if self.is_stopping() {
            return Ok(());
        }
        let current = dispatch.current.clone();
        let entry = self.state_entry(&current)?;
        self.arm(dispatch, &current)?;

        trace!(machine = %self.name(), state = ?current, "running on_entry");
        let chained = entry.state.on_entry().map_err(|source| MachineError::Hook {
            state: label(&current),
            hook: HookKind::Entry,
            source: source.into(),
        })?;

        match chained {
            Some(event) => self.run_chain(dispatch, event, Trigger::Start),
            None => Ok(()),
        }
    }

    /// Dispatch `event` and every event chained from it, blocking until done.
    ///
    /// Once [`Machine::stop`] has begun this is a no-op that returns `Ok(())`.
    /// Hooks and actions must use [`Machine::operate_async`] instead; the
    /// dispatch lock is not reentrant.
    pub fn operate(&self, event: E) -> Result<(), MachineError> {
        self.dispatch(event, Trigger::External)
    }

    fn dispatch(&self, event: E, trigger: Trigger) -> Result<(), MachineError> {
        if !self.shared.started.load(Ordering::SeqCst) {
            return Err(MachineError::NotStarted);
        }

        let result = {
            let mut dispatch = lock(&self.shared.dispatch);
            self.run_chain(&mut dispatch, event, trigger)
        };
        self.prune_tasks();
        result
    }

    /// Submit `event` on a background thread and return immediately.
    ///
    /// Concurrent submissions acquire the dispatch lock in unspecified order.
    pub fn operate_async(&self, event: E) -> Result<PendingDispatch, MachineError> {
        let mut tasks = lock(&self.shared.tasks);
        if self.is_stopping() {
            debug!(machine = %self.name(), ?event, "machine stopping, dropping async event");
            return Ok(PendingDispatch::resolved(Ok(())));
        }

        let (tx, rx) = mpsc::channel();
        let machine = self.clone();
        let handle = thread::Builder::new()
            .name(format!("{}-dispatch", self.name()))
            .spawn(move || {
                let result = machine.operate(event);
                if let Err(mpsc::SendError(Err(err))) = tx.send(result) {
                    warn!(
                        machine = %machine.name(),
                        error = %err,
                        "asynchronous dispatch failed"
                    );
                }
            })?;
        tasks.push(handle);

        Ok(PendingDispatch { rx })
    }

    /// The currently active state object.
    ///
    /// Not synchronized with in-flight dispatches.
    pub fn get_active_state(&self) -> Arc<dyn State<E>> {
        let id = self.active_state_id();
        // Only registered states ever become active.
        Arc::clone(&self.shared.definition.states[&id].state)
    }

    pub fn active_state_id(&self) -> S {
        self.shared
            .active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Group tag of the currently active state.
    pub fn active_group(&self) -> String {
        self.group_of(&self.active_state_id())
            .unwrap_or_default()
            .to_string()
    }

    /// Group tag of a registered state.
    pub fn group_of(&self, state: &S) -> Option<&str> {
        self.shared
            .definition
            .states
            .get(state)
            .map(|entry| entry.group.as_str())
    }

    /// Timeout event registered for `state`, if any.
    pub fn timeout_event(&self, state: &S) -> Option<&TimeoutEvent<E>> {
        self.shared.definition.timeouts.get(state)
    }

    /// Copy of the transition log.
    pub fn history(&self) -> StateHistory<S, E> {
        lock(&self.shared.history).clone()
    }

    /// Capture the runtime status for diagnostics or a later resume.
    pub fn snapshot(&self) -> Snapshot<S, E> {
        Snapshot::new(
            self.name(),
            self.status(),
            self.active_state_id(),
            self.history(),
        )
    }

    /// Force the current state after a failed dispatch.
    ///
    /// Neither hook runs; the timeout of `state` is re-armed if the machine
    /// is running.
    pub fn recover(&self, state: S) -> Result<(), MachineError> {
        self.state_entry(&state)?;

        let mut dispatch = lock(&self.shared.dispatch);
        self.disarm(&mut dispatch);
        warn!(
            machine = %self.name(),
            from = ?dispatch.current,
            to = ?state,
            "recovering current state"
        );
        dispatch.current = state.clone();
        self.set_active(&state);
        if self.shared.started.load(Ordering::SeqCst) {
            self.arm(&mut dispatch, &state)?;
        }
        Ok(())
    }

    /// Shut the machine down.
    ///
    /// Stops further transitions, cancels the armed timeout, waits for every
    /// background dispatch and finally acquires the dispatch lock so no
    /// dispatch is mid-flight when this returns. Must not be called from a
    /// state hook or transition action.
    pub fn stop(&self) {
        let shared = &self.shared;
        shared.stopping.store(true, Ordering::SeqCst);
        info!(machine = %self.name(), "stopping state machine");

        if let Some(armed) = lock(&shared.armed).take() {
            debug!(machine = %self.name(), "cancelling armed timeout");
            armed.countdown.cancel();
            lock(&shared.tasks).push(armed.countdown.into_handle());
        }
        self.join_tasks();

        {
            let mut dispatch = lock(&shared.dispatch);
            // An in-flight dispatch may have armed a countdown after the
            // cancellation above.
            self.disarm(&mut dispatch);
            shared.stopped.store(true, Ordering::SeqCst);
        }
        // Retired timer threads may need the dispatch lock to observe the
        // stopping flag, so they are joined after it is released.
        self.join_tasks();
        info!(machine = %self.name(), "state machine stopped");
    }

    fn is_stopping(&self) -> bool {
        self.shared.stopping.load(Ordering::SeqCst)
    }

    fn state_entry(&self, state: &S) -> Result<&StateEntry<E>, MachineError> {
        self.shared
            .definition
            .states
            .get(state)
            .ok_or_else(|| MachineError::StateNotFound {
                state: label(state),
            })
    }

    fn set_active(&self, state: &S) {
        *self
            .shared
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner) = state.clone();
    }

    /// Process `event` and its chain. The caller holds the dispatch lock.
    fn run_chain(
        &self,
        dispatch: &mut Dispatch<S>,
        event: E,
        trigger: Trigger,
    ) -> Result<(), MachineError> {
        let definition = &self.shared.definition;
        let mut pending = Some((event, trigger));

        while let Some((event, trigger)) = pending.take() {
            if self.is_stopping() {
                debug!(machine = %self.name(), ?event, "machine stopping, event ignored");
                break;
            }

            self.disarm(dispatch);
            let from = dispatch.current.clone();
            let leaving = self.state_entry(&from)?;

            trace!(machine = %self.name(), state = ?from, "running on_exit");
            leaving.state.on_exit().map_err(|source| MachineError::Hook {
                state: label(&from),
                hook: HookKind::Exit,
                source: source.into(),
            })?;

            let key = (from.clone(), event.clone());
            let transition =
                definition
                    .transitions
                    .get(&key)
                    .ok_or_else(|| MachineError::TransitionNotFound {
                        state: label(&from),
                        event: label(&event),
                    })?;
            let to = transition.target().clone();
            let entering = self.state_entry(&to)?;

            transition
                .run_action()
                .map_err(|source| MachineError::Action {
                    state: label(&from),
                    event: label(&event),
                    source: source.into(),
                })?;

            dispatch.current = to.clone();
            self.set_active(&to);
            debug!(
                machine = %self.name(),
                from = ?from,
                to = ?to,
                ?event,
                ?trigger,
                "transition"
            );
            lock(&self.shared.history).push(StateTransition {
                from,
                to: to.clone(),
                event,
                trigger,
                timestamp: Utc::now(),
            });
            self.arm(dispatch, &to)?;

            trace!(machine = %self.name(), state = ?to, "running on_entry");
            pending = entering
                .state
                .on_entry()
                .map_err(|source| MachineError::Hook {
                    state: label(&to),
                    hook: HookKind::Entry,
                    source: source.into(),
                })?
                .map(|next| (next, Trigger::Chained));
        }

        Ok(())
    }

    /// Start the countdown registered for `state`. The caller holds the
    /// dispatch lock.
    fn arm(&self, dispatch: &mut Dispatch<S>, state: &S) -> Result<(), MachineError> {
        let Some(timeout) = self.shared.definition.timeouts.get(state) else {
            return Ok(());
        };
        if self.is_stopping() {
            return Ok(());
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let machine: Weak<Shared<S, E>> = Arc::downgrade(&self.shared);
        let event = timeout.event.clone();
        let countdown = Countdown::start(
            &format!("{}-timeout", self.name()),
            timeout.delay,
            move || {
                if let Some(shared) = machine.upgrade() {
                    Machine { shared }.fire_timeout(generation, event);
                }
            },
        )?;

        debug!(
            machine = %self.name(),
            state = ?state,
            event = ?timeout.event,
            delay = ?timeout.delay,
            "armed timeout"
        );
        dispatch.armed = Some(generation);
        *lock(&self.shared.armed) = Some(ArmedCountdown {
            generation,
            countdown,
        });
        Ok(())
    }

    /// Cancel the armed countdown, if any. The caller holds the dispatch
    /// lock.
    fn disarm(&self, dispatch: &mut Dispatch<S>) {
        dispatch.armed = None;
        let Some(armed) = lock(&self.shared.armed).take() else {
            return;
        };
        trace!(machine = %self.name(), generation = armed.generation, "cancelling timeout");
        armed.countdown.cancel();
        lock(&self.shared.tasks).push(armed.countdown.into_handle());
    }

    fn fire_timeout(&self, generation: u64, event: E) {
        let result = {
            let mut dispatch = lock(&self.shared.dispatch);
            if dispatch.armed != Some(generation) {
                debug!(machine = %self.name(), ?event, "stale timeout ignored");
                return;
            }
            debug!(machine = %self.name(), ?event, "timeout fired");
            self.run_chain(&mut dispatch, event, Trigger::Timeout)
        };
        if let Err(err) = result {
            warn!(machine = %self.name(), error = %err, "timeout dispatch failed");
        }
        self.prune_tasks();
    }

    /// Reap background threads that have already finished.
    fn prune_tasks(&self) {
        let finished: Vec<JoinHandle<()>> = {
            let mut tasks = lock(&self.shared.tasks);
            let (finished, running) = mem::take(&mut *tasks)
                .into_iter()
                .partition(|handle| handle.is_finished());
            *tasks = running;
            finished
        };
        for handle in finished {
            self.reap(handle);
        }
    }

    /// Join tracked threads until none are left.
    fn join_tasks(&self) {
        loop {
            let handles = mem::take(&mut *lock(&self.shared.tasks));
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                self.reap(handle);
            }
        }
    }

    fn reap(&self, handle: JoinHandle<()>) {
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            warn!(machine = %self.name(), "background thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MachineBuilder;
    use crate::core::HookState;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    fn passive() -> HookState<&'static str> {
        HookState::new()
    }

    fn ping_pong() -> Machine<&'static str, &'static str> {
        MachineBuilder::new()
            .add_state("A", passive())
            .add_state("B", passive())
            .set_start_state("A")
            .unwrap()
            .add_transition("A", "x", "B")
            .unwrap()
            .add_transition("B", "y", "A")
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn operate_follows_transitions() {
        let machine = ping_pong();
        machine.start().unwrap();

        machine.operate("x").unwrap();
        assert_eq!(machine.active_state_id(), "B");
        machine.operate("y").unwrap();
        assert_eq!(machine.active_state_id(), "A");

        machine.stop();
    }

    #[test]
    fn start_twice_is_a_lifecycle_error() {
        let machine = ping_pong();
        machine.start().unwrap();
        let err = machine.start().unwrap_err();
        assert!(matches!(err, MachineError::AlreadyStarted));
        assert!(err.is_lifecycle());
        assert_eq!(err.to_string(), "start() must only be called once");
    }

    #[test]
    fn operate_before_start_is_rejected() {
        let machine = ping_pong();
        assert!(matches!(
            machine.operate("x"),
            Err(MachineError::NotStarted)
        ));
        assert_eq!(machine.active_state_id(), "A");
    }

    #[test]
    fn missing_transition_leaves_lock_released() {
        let machine = ping_pong();
        machine.start().unwrap();

        let err = machine.operate("nope").unwrap_err();
        match err {
            MachineError::TransitionNotFound { state, event } => {
                assert_eq!(state, "\"A\"");
                assert_eq!(event, "\"nope\"");
            }
            other => panic!("unexpected error: {other}"),
        }

        machine.operate("x").unwrap();
        assert_eq!(machine.active_state_id(), "B");
    }

    #[test]
    fn dangling_target_is_reported_at_dispatch() {
        let machine = MachineBuilder::new()
            .add_state("A", passive())
            .set_start_state("A")
            .unwrap()
            .add_transition("A", "x", "ghost")
            .unwrap()
            .build()
            .unwrap();
        machine.start().unwrap();

        let err = machine.operate("x").unwrap_err();
        assert!(matches!(err, MachineError::StateNotFound { ref state } if state == "\"ghost\""));
        assert_eq!(machine.active_state_id(), "A");
    }

    #[test]
    fn status_follows_lifecycle() {
        let machine = ping_pong();
        assert_eq!(machine.status(), Status::Configured);
        machine.start().unwrap();
        assert_eq!(machine.status(), Status::Running);
        machine.stop();
        assert_eq!(machine.status(), Status::Stopped);
    }

    #[test]
    fn operate_after_stop_is_noop() {
        let machine = ping_pong();
        machine.start().unwrap();
        machine.stop();

        machine.operate("x").unwrap();
        assert_eq!(machine.active_state_id(), "A");
        machine.operate_async("x").unwrap().wait().unwrap();
        assert_eq!(machine.active_state_id(), "A");
    }

    #[test]
    fn chained_entries_run_before_operate_returns() {
        let machine = MachineBuilder::new()
            .add_state("A", passive())
            .add_state("B", HookState::new().entry(|| Ok(Some("auto"))))
            .add_state("C", passive())
            .set_start_state("A")
            .unwrap()
            .add_transition("A", "x", "B")
            .unwrap()
            .add_transition("B", "auto", "C")
            .unwrap()
            .build()
            .unwrap();
        machine.start().unwrap();

        machine.operate("x").unwrap();
        assert_eq!(machine.active_state_id(), "C");

        let history = machine.history();
        let triggers: Vec<Trigger> = history.transitions().iter().map(|t| t.trigger).collect();
        assert_eq!(triggers, vec![Trigger::External, Trigger::Chained]);
    }

    #[test]
    fn action_error_chain_reaches_the_callback_error() {
        use std::error::Error as _;
        use std::io;

        let machine = MachineBuilder::new()
            .add_state("A", passive())
            .add_state("B", passive())
            .set_start_state("A")
            .unwrap()
            .add_transition_with(
                "A",
                "x",
                Transition::to("B").action(|| {
                    let err = io::Error::new(io::ErrorKind::TimedOut, "valve stuck");
                    Err(anyhow::Error::new(err))
                }),
            )
            .unwrap()
            .build()
            .unwrap();
        machine.start().unwrap();

        let err = machine.operate("x").unwrap_err();
        assert!(err.is_callback());
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "valve stuck");
        let io_err = source.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn start_chain_is_recorded_as_started() {
        let machine = MachineBuilder::new()
            .add_state("A", HookState::new().entry(|| Ok(Some("auto"))))
            .add_state("B", HookState::new().entry(|| Ok(Some("auto"))))
            .add_state("C", passive())
            .set_start_state("A")
            .unwrap()
            .add_transition("A", "auto", "B")
            .unwrap()
            .add_transition("B", "auto", "C")
            .unwrap()
            .build()
            .unwrap();
        machine.start().unwrap();
        assert_eq!(machine.active_state_id(), "C");

        let history = machine.history();
        let triggers: Vec<Trigger> = history.transitions().iter().map(|t| t.trigger).collect();
        assert_eq!(triggers, vec![Trigger::Start, Trigger::Chained]);
    }

    #[test]
    fn failed_exit_hook_keeps_current_state() {
        let machine = MachineBuilder::new()
            .add_state("A", HookState::new().exit(|| anyhow::bail!("stuck")))
            .add_state("B", passive())
            .set_start_state("A")
            .unwrap()
            .add_transition("A", "x", "B")
            .unwrap()
            .build()
            .unwrap();
        machine.start().unwrap();

        let err = machine.operate("x").unwrap_err();
        assert!(matches!(err, MachineError::Hook { hook: HookKind::Exit, .. }));
        assert_eq!(machine.active_state_id(), "A");
    }

    #[test]
    fn recover_resets_current_state_without_hooks() {
        let entries = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&entries);
        let machine = MachineBuilder::new()
            .add_state("A", passive())
            .add_state(
                "B",
                HookState::new().entry(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }),
            )
            .set_start_state("A")
            .unwrap()
            .build()
            .unwrap();
        machine.start().unwrap();

        machine.recover("B").unwrap();
        assert_eq!(machine.active_state_id(), "B");
        assert_eq!(entries.load(Ordering::SeqCst), 0);

        assert!(matches!(
            machine.recover("ghost"),
            Err(MachineError::StateNotFound { .. })
        ));
    }

    #[test]
    fn stale_timeout_does_not_fire_in_next_state() {
        let machine = MachineBuilder::new()
            .add_state("A", passive())
            .add_state("B", passive())
            .add_state("C", passive())
            .set_start_state("A")
            .unwrap()
            .add_transition("A", "x", "B")
            .unwrap()
            .add_transition("A", "late", "C")
            .unwrap()
            .add_transition("B", "late", "C")
            .unwrap()
            .add_timeout_event("A", "late", 0.05)
            .unwrap()
            .build()
            .unwrap();
        machine.start().unwrap();

        machine.operate("x").unwrap();
        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(machine.active_state_id(), "B");
        machine.stop();
    }

    #[test]
    fn stop_is_idempotent_and_prompt() {
        let machine = MachineBuilder::new()
            .add_state("A", passive())
            .add_state("B", passive())
            .set_start_state("A")
            .unwrap()
            .add_transition("A", "t", "B")
            .unwrap()
            .add_timeout_event("A", "t", 3600.0)
            .unwrap()
            .build()
            .unwrap();
        machine.start().unwrap();

        let started = Instant::now();
        machine.stop();
        machine.stop();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(machine.active_state_id(), "A");
    }

    #[test]
    fn group_lookup() {
        let machine: Machine<&str, &str> = MachineBuilder::new()
            .add_state_in_group("A", "boot", passive())
            .add_state("B", passive())
            .set_start_state("A")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(machine.active_group(), "boot");
        assert_eq!(machine.group_of(&"B"), Some("default"));
        assert_eq!(machine.group_of(&"Z"), None);
    }
}
