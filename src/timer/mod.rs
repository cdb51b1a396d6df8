//! Cancellable timers backing timeout events.

mod countdown;

pub use countdown::Countdown;
