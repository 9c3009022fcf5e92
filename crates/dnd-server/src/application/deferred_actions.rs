//! FIFO queue of actions that run once the rest of a request is handled.
//!
//! Drag reconciliation must see the widget state *after* the request's other
//! operations were applied, so it is queued here instead of running inline.
//! [`ProcessActionRunner::execute`] drains the queue in insertion order.
//! Each action runs to completion before the next starts.  Actions receive
//! the session context, not the runner, so they cannot enqueue more work
//! while the queue is draining.

use std::collections::VecDeque;
use std::fmt;

/// A queued action over the context `C`.
pub type DeferredAction<C> = Box<dyn FnOnce(&mut C) + Send>;

pub struct ProcessActionRunner<C> {
    queue: VecDeque<DeferredAction<C>>,
}

impl<C> ProcessActionRunner<C> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Appends `action` to the queue.
    pub fn add<F>(&mut self, action: F)
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        self.queue.push_back(Box::new(action));
    }

    /// Runs every queued action against `context`, oldest first.
    ///
    /// Returns the number of actions run.
    pub fn execute(&mut self, context: &mut C) -> usize {
        let mut executed = 0;
        while let Some(action) = self.queue.pop_front() {
            action(context);
            executed += 1;
        }
        executed
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<C> Default for ProcessActionRunner<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for ProcessActionRunner<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessActionRunner")
            .field("queued", &self.queue.len())
            .finish()
    }
}
