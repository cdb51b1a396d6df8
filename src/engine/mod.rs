//! State machine runtime.
//!
//! # Key Concepts
//!
//! - **Machine**: cloneable handle that owns the current state and the
//!   dispatch lock
//! - **Transition**: edge target plus an optional action
//! - **Timeout events**: events injected by a [`Countdown`](crate::timer::Countdown)
//!   when a state stays active too long
//!
//! # Dispatch
//!
//! `operate` takes the dispatch lock, then for each pending event cancels
//! the current timeout, runs `on_exit`, looks up the transition, runs its
//! action, switches state, arms the new timeout and runs `on_entry`. An
//! event returned by `on_entry` is processed in the same loop before the
//! lock is released. A failure leaves the machine wherever the loop
//! stopped; `on_exit` is not undone.

mod error;
mod machine;
mod transition;

pub use error::{CallbackError, HookKind, MachineError};
pub(crate) use machine::{Definition, StateEntry};
pub use machine::{Machine, PendingDispatch, Status, TimeoutEvent};
pub use transition::{Transition, TransitionAction};
