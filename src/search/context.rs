use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation for a search: a shared cancel flag plus an
/// optional deadline. Workers poll [`SearchContext::is_done`] between units
/// of work; nothing is interrupted mid-file.
///
/// Clones share the same cancel flag.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl SearchContext {
    /// A context that only cancels explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that is done once `deadline` passes.
    pub fn with_deadline(deadline: Instant) -> Self {
        SearchContext {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// A context that is done `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Signals every holder of this context to stop.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once [`SearchContext::cancel`] has been called, regardless of
    /// the deadline.
    pub fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// True once the context has been cancelled or its deadline passed.
    pub fn is_done(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed) || self.deadline_exceeded()
    }

    /// True once the deadline has passed, regardless of cancellation.
    pub fn deadline_exceeded(&self) -> bool {
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}
