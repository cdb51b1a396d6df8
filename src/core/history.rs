//! State transition history tracking.
//!
//! The machine records every completed transition into a bounded
//! [`StateHistory`], oldest entries first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the event behind a transition reached the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// Submitted through `operate` or `operate_async`.
    External,
    /// Returned by the start state's `on_entry` hook during `start()`.
    Start,
    /// Returned by the previous state's `on_entry` hook.
    Chained,
    /// Injected by an expired timeout event.
    Timeout,
}

/// Record of a single state transition.
///
/// # Example
///
/// ```rust
/// use tantamount::core::{StateTransition, Trigger};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: "idle",
///     to: "busy",
///     event: "work",
///     trigger: Trigger::External,
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.to, "busy");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition<S, E> {
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// The event that selected the transition
    pub event: E,
    /// Where the event came from
    pub trigger: Trigger,
    /// When the target state became active
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of state transitions.
///
/// A history created with [`StateHistory::with_limit`] keeps at most that
/// many transitions, evicting the oldest first.
///
/// # Example
///
/// ```rust
/// use tantamount::core::{StateHistory, StateTransition, Trigger};
/// use chrono::Utc;
///
/// let mut history = StateHistory::with_limit(8);
/// history.push(StateTransition {
///     from: "start",
///     to: "middle",
///     event: "next",
///     trigger: Trigger::External,
///     timestamp: Utc::now(),
/// });
/// history.push(StateTransition {
///     from: "middle",
///     to: "end",
///     event: "next",
///     trigger: Trigger::Chained,
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.get_path(), vec![&"start", &"middle", &"end"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory<S, E> {
    transitions: Vec<StateTransition<S, E>>,
    limit: Option<usize>,
}

impl<S, E> Default for StateHistory<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E> StateHistory<S, E> {
    /// Create a new empty, unbounded history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
            limit: None,
        }
    }

    /// Create a new empty history holding at most `limit` transitions.
    ///
    /// A limit of zero records nothing.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: Vec::with_capacity(limit.min(64)),
            limit: Some(limit),
        }
    }

    /// Maximum number of retained transitions, if bounded.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Append a transition in place, evicting the oldest ones past the limit.
    pub fn push(&mut self, transition: StateTransition<S, E>) {
        self.transitions.push(transition);
        self.trim();
    }

    /// Re-bound the history, evicting the oldest transitions past `limit`.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = Some(limit);
        self.trim();
    }

    fn trim(&mut self) {
        if let Some(limit) = self.limit {
            if self.transitions.len() > limit {
                let excess = self.transitions.len() - limit;
                self.transitions.drain(..excess);
            }
        }
    }

    /// Get the path of states traversed.
    ///
    /// Returns references to states in order: the source of the oldest
    /// retained transition, then the `to` state of each transition.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Calculate total duration from first to last retained transition.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get all retained transitions, oldest first.
    pub fn transitions(&self) -> &[StateTransition<S, E>] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

impl<S: Clone, E: Clone> StateHistory<S, E> {
    /// Record a transition, returning a new history.
    ///
    /// The existing history is left untouched.
    pub fn record(&self, transition: StateTransition<S, E>) -> Self {
        let mut next = self.clone();
        next.push(transition);
        next
    }
}
