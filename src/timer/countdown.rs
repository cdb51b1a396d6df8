//! One-shot timer whose wait can be interrupted.

use std::io;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Default)]
struct Signal {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// A one-shot timer running on its own thread.
///
/// The thread sleeps on a condition variable until the deadline passes or
/// [`Countdown::cancel`] raises the cancellation flag, whichever comes
/// first. The expiry callback never runs after a completed `cancel`.
///
/// # Example
///
/// ```rust
/// use std::sync::mpsc;
/// use std::time::Duration;
/// use tantamount::timer::Countdown;
///
/// let (tx, rx) = mpsc::channel();
/// let countdown = Countdown::start("demo", Duration::from_millis(5), move || {
///     tx.send(()).unwrap();
/// })
/// .unwrap();
///
/// rx.recv_timeout(Duration::from_secs(1)).unwrap();
/// countdown.join();
/// ```
pub struct Countdown {
    signal: Arc<Signal>,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Spawn a thread named `name` that runs `on_expire` after `delay`.
    pub fn start<F>(name: &str, delay: Duration, on_expire: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let signal = Arc::new(Signal::default());
        let waiter = Arc::clone(&signal);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                if waiter.wait(delay) {
                    on_expire();
                }
            })?;

        Ok(Self { signal, handle })
    }

    /// Interrupt the wait. Calling this more than once, or after expiry, is
    /// a no-op.
    pub fn cancel(&self) {
        self.signal.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        *self
            .signal
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the timer thread has exited, by expiry or cancellation.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the timer thread to exit.
    ///
    /// Returns `false` if the expiry callback panicked.
    pub fn join(self) -> bool {
        self.handle.join().is_ok()
    }

    /// Give up ownership of the timer thread.
    pub fn into_handle(self) -> JoinHandle<()> {
        self.handle
    }
}

impl Signal {
    /// Block until `delay` elapses or the signal is cancelled.
    /// Returns `true` when the deadline was reached.
    fn wait(&self, delay: Duration) -> bool {
        let deadline = Instant::now().checked_add(delay);
        let mut cancelled = self
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        loop {
            if *cancelled {
                return false;
            }
            let remaining = match deadline {
                Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                    Some(remaining) if !remaining.is_zero() => remaining,
                    _ => return true,
                },
                // Unrepresentable deadline: wait for cancellation only.
                None => Duration::from_secs(3600),
            };
            // Spurious wakeups loop back and recompute the remaining time.
            cancelled = self
                .wake
                .wait_timeout(cancelled, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn cancel(&self) {
        let mut cancelled = self
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled = true;
        self.wake.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;

    #[test]
    fn fires_after_delay() {
        let (tx, rx) = mpsc::channel();
        let started = Instant::now();
        let countdown = Countdown::start("t", Duration::from_millis(30), move || {
            tx.send(Instant::now()).unwrap();
        })
        .unwrap();

        let fired_at = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(fired_at.duration_since(started) >= Duration::from_millis(30));
        assert!(countdown.join());
    }

    #[test]
    fn zero_delay_fires_immediately() {
        let (tx, rx) = mpsc::channel();
        let countdown = Countdown::start("t", Duration::ZERO, move || tx.send(()).unwrap()).unwrap();
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
        countdown.join();
    }

    #[test]
    fn cancel_preempts_long_wait() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let countdown = Countdown::start("t", Duration::from_secs(3600), move || {
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();

        let started = Instant::now();
        countdown.cancel();
        assert!(countdown.is_cancelled());
        assert!(countdown.join());

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn cancel_is_idempotent() {
        let countdown = Countdown::start("t", Duration::from_secs(60), || {}).unwrap();
        countdown.cancel();
        countdown.cancel();
        countdown.join();
    }

    #[test]
    fn cancel_after_expiry_is_noop() {
        let (tx, rx) = mpsc::channel();
        let countdown = Countdown::start("t", Duration::ZERO, move || tx.send(()).unwrap()).unwrap();
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
        countdown.cancel();
        assert!(countdown.join());
    }

    #[test]
    fn huge_delay_still_cancels() {
        let countdown = Countdown::start("t", Duration::MAX, || {}).unwrap();
        countdown.cancel();
        assert!(countdown.join());
    }

    #[test]
    fn panicking_callback_is_reported_by_join() {
        let countdown = Countdown::start("t", Duration::ZERO, || panic!("boom")).unwrap();
        assert!(!countdown.join());
    }
}
