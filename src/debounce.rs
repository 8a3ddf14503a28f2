//! Trailing-edge debounce timer driven by an external clock.

use std::time::Duration;

/// Fires once a burst of triggers has been quiet for `delay`.
///
/// The owner calls [`trigger`](Self::trigger) on every signal and
/// [`poll`](Self::poll) on every scheduler tick. [`cancel`](Self::cancel)
/// releases the pending timer so a late tick cannot fire it.
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Duration>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// (Re)arm the timer, replacing any pending deadline.
    pub fn trigger(&mut self, now: Duration) {
        self.deadline = Some(now + self.delay);
    }

    /// Returns `true` exactly once per armed timer, when its deadline has passed.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Clear the pending timer. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}
