//! Builder API for defining machines.
//!
//! States, transitions and timeout events are registered on a
//! [`MachineBuilder`], validated as they are added, and frozen into a
//! [`Machine`](crate::engine::Machine) by `build()`.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::MachineBuilder;
