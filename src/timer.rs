//! Timer slots with staleness cookies.
//!
//! Every slot owns a counter that is bumped each time the timer is started.
//! The timeout event carries the counter value from that start, so a timeout
//! that was overtaken by a later restart can be recognised and dropped. This
//! stands in for cancellation: the timer service never needs to revoke a
//! pending timeout.

use std::time::Duration;

use tracing::{trace, warn};

use crate::{Event, EventId};

/// Index of a timer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerIndex(pub u8);

/// The block of event identities reserved for timer expiry.
///
/// Slot `i` expires with identity `base + i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvents {
    base: EventId,
    count: u8,
}

impl TimerEvents {
    /// Reserve `count` identities starting at `base`
    pub const fn new(base: EventId, count: u8) -> Self {
        Self { base, count }
    }

    /// Number of timer slots
    pub const fn count(&self) -> u8 {
        self.count
    }

    /// Expiry identity for a slot, `None` if the slot does not exist
    pub fn id_for(&self, index: TimerIndex) -> Option<EventId> {
        (index.0 < self.count).then(|| self.base.offset(index.0))
    }

    /// Slot that expires with `id`, `None` for non-timer identities
    pub fn index_of(&self, id: EventId) -> Option<TimerIndex> {
        let offset = id.0.checked_sub(self.base.0)?;
        (offset < self.count).then_some(TimerIndex(offset))
    }
}

/// Scheduler that delivers a timeout event once, at or after a delay.
pub trait TimerService: Send {
    /// Deliver `event` to the machine's queue after `after` has elapsed
    fn schedule(&self, after: Duration, event: Event);
}

/// Timer slots for one machine instance
pub struct Timers {
    events: TimerEvents,
    cookies: Vec<u8>,
    service: Box<dyn TimerService>,
}

impl Timers {
    /// Create a slot per reserved timer identity, all cookies at zero
    pub fn new<T>(events: TimerEvents, service: T) -> Self
    where
        T: TimerService + 'static,
    {
        Self {
            events,
            cookies: vec![0; events.count() as usize],
            service: Box::new(service),
        }
    }

    /// The identity block these timers expire with
    pub fn events(&self) -> TimerEvents {
        self.events
    }

    /// Start (or restart) a timer.
    ///
    /// Any timeout from an earlier start of the same slot becomes stale.
    pub fn start(&mut self, index: TimerIndex, duration: Duration) {
        let Some(id) = self.events.id_for(index) else {
            warn!(?index, "start of undefined timer ignored");
            return;
        };
        let cookie = &mut self.cookies[index.0 as usize];
        *cookie = cookie.wrapping_add(1);
        trace!(?index, ?duration, cookie = *cookie, "timer started");
        self.service
            .schedule(duration, Event::with_payload(id, *cookie));
    }

    /// True if `event` is a timeout from the most recent start of its slot
    pub fn is_valid(&self, event: &Event) -> bool {
        self.events
            .index_of(event.id())
            .and_then(|index| self.cookie(index))
            .is_some_and(|cookie| cookie == event.payload())
    }

    /// Current cookie of a slot
    pub fn cookie(&self, index: TimerIndex) -> Option<u8> {
        self.cookies.get(index.0 as usize).copied()
    }
}

impl std::fmt::Debug for Timers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timers")
            .field("events", &self.events)
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

/// Timer service backed by tokio tasks.
///
/// Each schedule spawns a task that sleeps and then sends the timeout on the
/// channel feeding the machine. Must be used from within a tokio runtime.
#[cfg(feature = "tokio-integration")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio-integration")))]
#[derive(Debug, Clone)]
pub struct TokioTimerService {
    event_tx: tokio::sync::mpsc::UnboundedSender<Event>,
}

#[cfg(feature = "tokio-integration")]
impl TokioTimerService {
    /// Deliver timeouts on `event_tx`
    pub fn new(event_tx: tokio::sync::mpsc::UnboundedSender<Event>) -> Self {
        Self { event_tx }
    }
}

#[cfg(feature = "tokio-integration")]
impl TokioTimerService {
    fn spawn_timeout(&self, after: Duration, event: Event) -> tokio::task::JoinHandle<()> {
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            trace!(id = %event.id(), cookie = event.payload(), "timer fired");
            if event_tx.send(event).is_err() {
                tracing::debug!(id = %event.id(), "timeout dropped, event channel closed");
            }
        })
    }
}

#[cfg(feature = "tokio-integration")]
impl TimerService for TokioTimerService {
    fn schedule(&self, after: Duration, event: Event) {
        self.spawn_timeout(after, event);
    }
}
