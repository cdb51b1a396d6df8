//! Runtime errors raised by a running machine.

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Boxed error produced by user hooks and actions.
pub type CallbackError = Box<dyn StdError + Send + Sync + 'static>;

/// Which state hook failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Entry,
    Exit,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => f.write_str("on_entry"),
            Self::Exit => f.write_str("on_exit"),
        }
    }
}

/// Errors that can occur while starting, dispatching or stopping a machine.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("start() must only be called once")]
    AlreadyStarted,

    #[error("Machine has not been started. Call start() before operate()")]
    NotStarted,

    #[error("No transition from state {state} for event {event}")]
    TransitionNotFound { state: String, event: String },

    #[error("Transition target state {state} is not registered")]
    StateNotFound { state: String },

    #[error("{hook} hook of state {state} failed")]
    Hook {
        state: String,
        hook: HookKind,
        #[source]
        source: CallbackError,
    },

    #[error("Action of transition from {state} on {event} failed")]
    Action {
        state: String,
        event: String,
        #[source]
        source: CallbackError,
    },

    #[error("Failed to spawn background thread")]
    Spawn(#[from] std::io::Error),

    #[error("Background dispatch ended without reporting a result")]
    Disconnected,
}

impl MachineError {
    /// Lifecycle misuse: starting twice, or dispatching before start.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::AlreadyStarted | Self::NotStarted)
    }

    /// Failures raised by user-supplied hooks or actions.
    pub fn is_callback(&self) -> bool {
        matches!(self, Self::Hook { .. } | Self::Action { .. })
    }
}
