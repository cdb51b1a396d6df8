//! Builder for defining machines.

use crate::builder::error::BuildError;
use crate::checkpoint::Snapshot;
use crate::config::MachineConfig;
use crate::core::{label, Id, State, StateHistory, DEFAULT_GROUP};
use crate::engine::{Definition, Machine, StateEntry, TimeoutEvent, Transition};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builder for defining a machine's states, transitions and timeouts.
///
/// Everything registered here is frozen by [`MachineBuilder::build`]; the
/// resulting [`Machine`] never changes its tables.
///
/// # Example
///
/// ```rust
/// use tantamount::builder::MachineBuilder;
/// use tantamount::core::HookState;
///
/// let machine = MachineBuilder::new()
///     .add_state("A", HookState::new())
///     .add_state("B", HookState::new())
///     .set_start_state("A")?
///     .add_transition("A", "x", "B")?
///     .add_transition("B", "y", "A")?
///     .build()?;
///
/// machine.start()?;
/// machine.operate("x")?;
/// assert_eq!(machine.active_state_id(), "B");
/// machine.stop();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct MachineBuilder<S: Id, E: Id> {
    config: MachineConfig,
    states: HashMap<S, StateEntry<E>>,
    transitions: HashMap<(S, E), Transition<S>>,
    timeouts: HashMap<S, TimeoutEvent<E>>,
    start: Option<S>,
    history: StateHistory<S, E>,
}

impl<S: Id, E: Id> MachineBuilder<S, E> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: MachineConfig::default(),
            states: HashMap::new(),
            transitions: HashMap::new(),
            timeouts: HashMap::new(),
            start: None,
            history: StateHistory::new(),
        }
    }

    /// Replace the runtime configuration.
    pub fn with_config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a state in the default group. Re-registering an id replaces
    /// the earlier state.
    pub fn add_state(self, id: S, state: impl State<E> + 'static) -> Self {
        self.add_state_in_group(id, DEFAULT_GROUP, state)
    }

    /// Register a state under a group tag.
    pub fn add_state_in_group(
        mut self,
        id: S,
        group: impl Into<String>,
        state: impl State<E> + 'static,
    ) -> Self {
        let entry = StateEntry {
            state: Arc::new(state),
            group: group.into(),
        };
        if self.states.insert(id.clone(), entry).is_some() {
            debug!(state = ?id, "replacing registered state");
        }
        self
    }

    /// Set the state activated by `start()` (required).
    pub fn set_start_state(mut self, id: S) -> Result<Self, BuildError> {
        self.require_state(&id)?;
        self.start = Some(id);
        Ok(self)
    }

    /// Register a transition without an action.
    ///
    /// `target` is not checked here; an unknown target fails the dispatch
    /// that takes the transition.
    pub fn add_transition(self, source: S, event: E, target: S) -> Result<Self, BuildError> {
        self.add_transition_with(source, event, Transition::to(target))
    }

    /// Register a fully specified transition.
    pub fn add_transition_with(
        mut self,
        source: S,
        event: E,
        transition: Transition<S>,
    ) -> Result<Self, BuildError> {
        let key = (source, event);
        if self.transitions.contains_key(&key) {
            return Err(BuildError::DuplicateTransition {
                state: label(&key.0),
                event: label(&key.1),
            });
        }
        self.transitions.insert(key, transition);
        Ok(self)
    }

    /// Inject `event` when `state` stays active for `seconds`.
    ///
    /// The `(state, event)` transition must already be registered. A later
    /// registration for the same state replaces the earlier one.
    pub fn add_timeout_event(mut self, state: S, event: E, seconds: f64) -> Result<Self, BuildError> {
        let delay = validate_delay(seconds)?;
        self.require_transition(&state, &event)?;

        if let Some(previous) = self.timeouts.get(&state) {
            debug!(state = ?state, previous = ?previous.event, "replacing timeout event");
        }
        self.timeouts.insert(state, TimeoutEvent { event, delay });
        Ok(self)
    }

    /// Change the delay of an existing timeout event.
    ///
    /// Fails unless `state` already has a timeout bound to `event`.
    pub fn update_timeout_event(
        mut self,
        state: S,
        event: E,
        seconds: f64,
    ) -> Result<Self, BuildError> {
        let delay = validate_delay(seconds)?;
        self.require_transition(&state, &event)?;

        let timeout = self
            .timeouts
            .get_mut(&state)
            .ok_or_else(|| BuildError::NoTimeout {
                state: label(&state),
            })?;
        if timeout.event != event {
            return Err(BuildError::TimeoutEventMismatch {
                state: label(&state),
                registered: label(&timeout.event),
                requested: label(&event),
            });
        }
        timeout.delay = delay;
        Ok(self)
    }

    /// Start from the state a snapshot was taken in, keeping its history.
    pub fn resume_from(mut self, snapshot: &Snapshot<S, E>) -> Result<Self, BuildError> {
        self.require_state(&snapshot.active_state)?;
        debug!(
            machine = %snapshot.machine,
            snapshot = %snapshot.id,
            state = ?snapshot.active_state,
            "resuming from snapshot"
        );
        self.start = Some(snapshot.active_state.clone());
        self.history = snapshot.history.clone();
        Ok(self)
    }

    /// Freeze the definition into a machine.
    pub fn build(self) -> Result<Machine<S, E>, BuildError> {
        let start = self.start.ok_or(BuildError::MissingStartState)?;

        let definition = Definition {
            states: self.states,
            transitions: self.transitions,
            timeouts: self.timeouts,
            start,
        };
        Ok(Machine::from_definition(
            self.config,
            definition,
            self.history,
        ))
    }

    fn require_state(&self, id: &S) -> Result<(), BuildError> {
        if self.states.contains_key(id) {
            Ok(())
        } else {
            Err(BuildError::UnknownState { state: label(id) })
        }
    }

    fn require_transition(&self, state: &S, event: &E) -> Result<(), BuildError> {
        if self
            .transitions
            .contains_key(&(state.clone(), event.clone()))
        {
            Ok(())
        } else {
            Err(BuildError::UnknownTransition {
                state: label(state),
                event: label(event),
            })
        }
    }
}

impl<S: Id, E: Id> Default for MachineBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_delay(seconds: f64) -> Result<Duration, BuildError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(BuildError::InvalidTimeout { seconds });
    }
    // Finite delays beyond what a Duration holds saturate.
    Ok(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HookState;

    type Builder = MachineBuilder<&'static str, &'static str>;

    fn two_states() -> Builder {
        MachineBuilder::new()
            .add_state("A", HookState::new())
            .add_state("B", HookState::new())
    }

    #[test]
    fn builder_requires_start_state() {
        let result = two_states().build();
        assert!(matches!(result, Err(BuildError::MissingStartState)));
    }

    #[test]
    fn start_state_must_be_registered() {
        let err = two_states().set_start_state("Z").err().unwrap();
        assert_eq!(
            err,
            BuildError::UnknownState {
                state: "\"Z\"".to_string()
            }
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn duplicate_transition_is_rejected() {
        let err = two_states()
            .add_transition("A", "x", "B")
            .unwrap()
            .add_transition("A", "x", "A")
            .err()
            .unwrap();
        assert!(matches!(err, BuildError::DuplicateTransition { .. }));
    }

    #[test]
    fn same_event_from_different_states_is_allowed() {
        let result = two_states()
            .add_transition("A", "x", "B")
            .unwrap()
            .add_transition("B", "x", "A");
        assert!(result.is_ok());
    }

    #[test]
    fn timeout_requires_matching_transition() {
        let err = two_states()
            .add_timeout_event("A", "t", 1.0)
            .err()
            .unwrap();
        assert_eq!(
            err,
            BuildError::UnknownTransition {
                state: "\"A\"".to_string(),
                event: "\"t\"".to_string()
            }
        );
    }

    #[test]
    fn negative_or_non_finite_timeout_is_invalid_argument() {
        for seconds in [-0.5, f64::NAN, f64::INFINITY] {
            let err = two_states()
                .add_transition("A", "t", "B")
                .unwrap()
                .add_timeout_event("A", "t", seconds)
                .err()
                .unwrap();
            assert!(matches!(err, BuildError::InvalidTimeout { .. }));
            assert!(!err.is_configuration());
        }
    }

    #[test]
    fn zero_timeout_is_allowed() {
        let result = two_states()
            .add_transition("A", "t", "B")
            .unwrap()
            .add_timeout_event("A", "t", 0.0);
        assert!(result.is_ok());
    }

    #[test]
    fn huge_finite_timeout_saturates() {
        let builder = two_states()
            .add_transition("A", "t", "B")
            .unwrap()
            .add_timeout_event("A", "t", 1e20)
            .unwrap();
        assert_eq!(builder.timeouts[&"A"].delay, Duration::MAX);

        let machine = builder.set_start_state("A").unwrap().build().unwrap();
        machine.start().unwrap();
        machine.stop();
    }

    #[test]
    fn update_changes_existing_delay() {
        let machine = two_states()
            .add_transition("A", "t", "B")
            .unwrap()
            .add_timeout_event("A", "t", 5.0)
            .unwrap()
            .update_timeout_event("A", "t", 0.25)
            .unwrap()
            .set_start_state("A")
            .unwrap()
            .build()
            .unwrap();

        let timeout = machine.timeout_event(&"A").unwrap();
        assert_eq!(timeout.event, "t");
        assert_eq!(timeout.delay, Duration::from_millis(250));
    }

    #[test]
    fn update_without_timeout_fails() {
        let err = two_states()
            .add_transition("A", "t", "B")
            .unwrap()
            .update_timeout_event("A", "t", 1.0)
            .err()
            .unwrap();
        assert!(matches!(err, BuildError::NoTimeout { .. }));
    }

    #[test]
    fn update_with_other_event_fails() {
        let err = two_states()
            .add_transition("A", "t", "B")
            .unwrap()
            .add_transition("A", "u", "B")
            .unwrap()
            .add_timeout_event("A", "t", 1.0)
            .unwrap()
            .update_timeout_event("A", "u", 1.0)
            .err()
            .unwrap();
        assert_eq!(
            err,
            BuildError::TimeoutEventMismatch {
                state: "\"A\"".to_string(),
                registered: "\"t\"".to_string(),
                requested: "\"u\"".to_string(),
            }
        );
    }

    #[test]
    fn later_timeout_registration_wins() {
        let machine = two_states()
            .add_transition("A", "t", "B")
            .unwrap()
            .add_transition("A", "u", "B")
            .unwrap()
            .add_timeout_event("A", "t", 1.0)
            .unwrap()
            .add_timeout_event("A", "u", 2.0)
            .unwrap()
            .set_start_state("A")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(machine.timeout_event(&"A").unwrap().event, "u");
    }

    #[test]
    fn config_reaches_machine() {
        let machine = two_states()
            .with_config(MachineConfig::named("door"))
            .set_start_state("B")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(machine.name(), "door");
        assert_eq!(machine.active_state_id(), "B");
    }
}
