//! State hooks invoked by the machine on activation and deactivation.
//!
//! A state is behavior, not data: the machine keys states by id and calls
//! into them when they become active or are about to be left.

use std::fmt;

/// Group assigned to states registered without an explicit group.
pub const DEFAULT_GROUP: &str = "default";

/// Trait for state machine states.
///
/// Both hooks run under the machine's dispatch lock, so no two hooks of the
/// same machine ever run concurrently. Errors propagate unchanged out of the
/// dispatch call that triggered them.
///
/// # Example
///
/// ```rust
/// use tantamount::core::State;
///
/// struct Connecting;
///
/// impl State<&'static str> for Connecting {
///     fn on_entry(&self) -> anyhow::Result<Option<&'static str>> {
///         // Nothing to wait for: move straight on.
///         Ok(Some("connected"))
///     }
/// }
/// ```
pub trait State<E>: Send + Sync {
    /// Called when the state becomes active.
    ///
    /// Returning `Some(event)` dispatches `event` immediately, before the
    /// lock is released. Default implementation returns `None`.
    fn on_entry(&self) -> anyhow::Result<Option<E>> {
        Ok(None)
    }

    /// Called right before the state is left.
    ///
    /// Default implementation does nothing.
    fn on_exit(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

type EntryHook<E> = Box<dyn Fn() -> anyhow::Result<Option<E>> + Send + Sync>;
type ExitHook = Box<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// State assembled from closures.
///
/// A `HookState` with no hooks is a passive state: entering and leaving it
/// has no side effects.
///
/// # Example
///
/// ```rust
/// use tantamount::core::{HookState, State};
///
/// let state = HookState::new()
///     .entry(|| Ok(Some("next")))
///     .exit(|| Ok(()));
///
/// assert_eq!(state.on_entry().unwrap(), Some("next"));
/// ```
pub struct HookState<E> {
    entry: Option<EntryHook<E>>,
    exit: Option<ExitHook>,
}

impl<E> HookState<E> {
    pub fn new() -> Self {
        Self {
            entry: None,
            exit: None,
        }
    }

    /// Set the entry hook.
    pub fn entry<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> anyhow::Result<Option<E>> + Send + Sync + 'static,
    {
        self.entry = Some(Box::new(hook));
        self
    }

    /// Set the exit hook.
    pub fn exit<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.exit = Some(Box::new(hook));
        self
    }
}

impl<E> Default for HookState<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for HookState<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookState")
            .field("entry", &self.entry.is_some())
            .field("exit", &self.exit.is_some())
            .finish()
    }
}

impl<E: Send + Sync> State<E> for HookState<E> {
    fn on_entry(&self) -> anyhow::Result<Option<E>> {
        match &self.entry {
            Some(hook) => hook(),
            None => Ok(None),
        }
    }

    fn on_exit(&self) -> anyhow::Result<()> {
        match &self.exit {
            Some(hook) => hook(),
            None => Ok(()),
        }
    }
}
