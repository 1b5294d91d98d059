//! Shared event queue with front-of-queue insertion

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::Event;

/// Handle to a FIFO of pending events.
///
/// Clones share the same queue: the dispatcher pops from one handle while
/// state handlers keep another to re-inject events. `publish_front` places an
/// event ahead of everything already queued, which is how priority events
/// preempt normal traffic.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<Event>>>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Event>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an event behind everything queued
    pub fn publish(&self, event: Event) {
        self.lock().push_back(event);
    }

    /// Insert an event ahead of everything queued
    pub fn publish_front(&self, event: Event) {
        self.lock().push_front(event);
    }

    /// Take the next event
    pub fn pop(&self) -> Option<Event> {
        self.lock().pop_front()
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of the queued events, next first
    pub fn pending(&self) -> Vec<Event> {
        self.lock().iter().copied().collect()
    }
}
