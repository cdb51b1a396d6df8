//! Core state machine types.
//!
//! This module holds the vocabulary shared by the builder and the runtime:
//! - The `Id` bound for state and event keys
//! - The `State` hook trait and the closure-based `HookState`
//! - Bounded transition history

mod history;
mod id;
mod state;

pub use history::{StateHistory, StateTransition, Trigger};
pub use id::Id;
pub(crate) use id::label;
pub use state::{HookState, State, DEFAULT_GROUP};
