//! Transition edges with optional side-effecting actions.

use std::fmt;
use std::sync::Arc;

/// Type alias for transition actions.
/// Bound arguments live inside the closure.
pub type TransitionAction = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// The value half of a transition-table entry: where an event leads, and
/// what to run on the way.
///
/// The source state and event form the table key and are supplied when the
/// transition is registered. The target is only resolved when the
/// transition is taken.
///
/// # Example
///
/// ```rust
/// use tantamount::engine::Transition;
///
/// let transition = Transition::to("closed")
///     .action_with_args(|(code, reason): &(u16, &str)| {
///         println!("closing with {code}: {reason}");
///         Ok(())
///     }, (1000, "normal"));
///
/// assert_eq!(transition.target(), &"closed");
/// assert!(transition.has_action());
/// ```
pub struct Transition<S> {
    target: S,
    action: Option<TransitionAction>,
}

impl<S> Transition<S> {
    /// Transition without an action.
    pub fn to(target: S) -> Self {
        Self {
            target,
            action: None,
        }
    }

    /// Attach an action run between leaving the source and entering the
    /// target.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Attach an action invoked as `action(&args)` on every traversal.
    pub fn action_with_args<A, F>(self, action: F, args: A) -> Self
    where
        A: Send + Sync + 'static,
        F: Fn(&A) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.action(move || action(&args))
    }

    pub fn target(&self) -> &S {
        &self.target
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Run the action, if any.
    pub(crate) fn run_action(&self) -> anyhow::Result<()> {
        match &self.action {
            Some(action) => action(),
            None => Ok(()),
        }
    }
}

impl<S: Clone> Clone for Transition<S> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            action: self.action.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Transition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("target", &self.target)
            .field("action", &self.action.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn plain_transition_has_no_action() {
        let transition = Transition::to("B");
        assert_eq!(transition.target(), &"B");
        assert!(!transition.has_action());
        assert!(transition.run_action().is_ok());
    }

    #[test]
    fn action_with_args_receives_bound_arguments() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);

        let transition = Transition::to("B").action_with_args(
            move |(a, b): &(i32, i32)| {
                sink.lock().unwrap().push((*a, *b));
                Ok(())
            },
            (1, 2),
        );

        transition.run_action().unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![(1, 2)]);
    }

    #[test]
    fn action_errors_are_returned() {
        let transition = Transition::to("B").action(|| anyhow::bail!("refused"));
        assert_eq!(transition.run_action().unwrap_err().to_string(), "refused");
    }

    #[test]
    fn clones_share_the_action() {
        let transition = Transition::to("B").action(|| Ok(()));
        let cloned = transition.clone();
        assert!(cloned.has_action());
        assert_eq!(format!("{cloned:?}"), "Transition { target: \"B\", action: true }");
    }
}
