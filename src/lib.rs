//! Tantamount: a finite-state-machine runtime
//!
//! A machine is a table of states and event-keyed transitions with exactly
//! one active state. Events are dispatched serially under a single lock,
//! either synchronously or from background threads, and states can inject
//! events of their own: immediately, by returning one from `on_entry`, or
//! later, through a timeout event armed while the state is active.
//!
//! # Core Concepts
//!
//! - **State**: entry/exit hooks via the `State` trait
//! - **Transition**: `(state, event) -> target`, with an optional action
//! - **Timeout event**: an event fired when a state stays active too long
//! - **Machine**: the runtime handle (`start`, `operate`, `operate_async`, `stop`)
//!
//! # Example
//!
//! ```rust
//! use tantamount::builder::MachineBuilder;
//! use tantamount::core::HookState;
//! use tantamount::engine::Transition;
//!
//! let machine = MachineBuilder::new()
//!     .add_state("locked", HookState::new())
//!     .add_state("unlocked", HookState::new())
//!     .set_start_state("locked")?
//!     .add_transition_with(
//!         "locked",
//!         "coin",
//!         Transition::to("unlocked").action(|| Ok(())),
//!     )?
//!     .add_transition("unlocked", "push", "locked")?
//!     .add_transition("unlocked", "idle", "locked")?
//!     .add_timeout_event("unlocked", "idle", 30.0)?
//!     .build()?;
//!
//! machine.start()?;
//! machine.operate("coin")?;
//! assert_eq!(machine.active_state_id(), "unlocked");
//!
//! machine.operate_async("push")?.wait()?;
//! assert_eq!(machine.active_state_id(), "locked");
//!
//! machine.stop();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod engine;
pub mod timer;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder};
pub use config::MachineConfig;
pub use self::core::{HookState, Id, State, StateHistory, StateTransition, Trigger};
pub use engine::{Machine, MachineError, PendingDispatch, Status, Transition};
