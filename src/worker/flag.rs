//! One-shot start flag

use std::sync::{Condvar, Mutex, PoisonError};

/// Flag that starts lowered and is raised exactly once
///
/// Executors block in [`Flag::wait`] after their setup; the session raises
/// the flag when every executor is ready, releasing them together.
#[derive(Debug, Default)]
pub struct Flag {
    raised: Mutex<bool>,
    changed: Condvar,
}

impl Flag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag and wake every waiter
    pub fn raise(&self) {
        let mut raised = self.raised.lock().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(!*raised, "Flag raised twice");
        *raised = true;
        self.changed.notify_all();
    }

    /// Block until the flag is raised (returns immediately if it already is)
    pub fn wait(&self) {
        let mut raised = self.raised.lock().unwrap_or_else(PoisonError::into_inner);
        while !*raised {
            raised = self.changed.wait(raised).unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn is_raised(&self) -> bool {
        *self.raised.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
