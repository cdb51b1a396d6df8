//! Build errors for machine definitions.

use thiserror::Error;

/// Errors raised while defining a machine.
///
/// All variants except [`BuildError::InvalidTimeout`] are configuration
/// errors: the definition references something that does not exist or
/// would be ambiguous.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("Start state not specified. Call .set_start_state(id) before .build()")]
    MissingStartState,

    #[error("State {state} is not registered")]
    UnknownState { state: String },

    #[error("Transition from {state} on {event} is already registered")]
    DuplicateTransition { state: String, event: String },

    #[error("No transition from {state} on {event}; add it before its timeout event")]
    UnknownTransition { state: String, event: String },

    #[error("State {state} has no timeout event to update")]
    NoTimeout { state: String },

    #[error("Timeout event of state {state} is {registered}, not {requested}")]
    TimeoutEventMismatch {
        state: String,
        registered: String,
        requested: String,
    },

    #[error("Timeout must be a finite, non-negative number of seconds (got {seconds})")]
    InvalidTimeout { seconds: f64 },
}

impl BuildError {
    /// Whether the error comes from an inconsistent definition rather than
    /// a bad argument value.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::InvalidTimeout { .. })
    }
}
