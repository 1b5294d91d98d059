//! Event records delivered to the dispatch engine

use std::fmt;

/// Identity of an event.
///
/// Identities are densely numbered from zero. Which number means what is
/// decided by the machine's event namespace (see [`EventCatalog`](crate::EventCatalog)),
/// so the engine only ever compares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u8);

impl EventId {
    /// Raw numeric identity
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Identity `offset` places after this one.
    ///
    /// Used to address the timer-expired range, which starts at a base id.
    pub const fn offset(self, offset: u8) -> EventId {
        EventId(self.0.wrapping_add(offset))
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single event: an identity plus a one byte payload.
///
/// For switch events the payload says what happened (press, release); for
/// timer events it carries the cookie captured when the timer was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    id: EventId,
    payload: u8,
}

impl Event {
    /// Event with a zero payload
    pub const fn new(id: EventId) -> Self {
        Self { id, payload: 0 }
    }

    /// Event carrying `payload`
    pub const fn with_payload(id: EventId, payload: u8) -> Self {
        Self { id, payload }
    }

    /// Identity of the event
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Payload byte
    pub const fn payload(&self) -> u8 {
        self.payload
    }

    /// True if this event has identity `id` and payload `payload`
    pub fn is(&self, id: EventId, payload: u8) -> bool {
        self.id == id && self.payload == payload
    }
}

impl From<EventId> for Event {
    fn from(id: EventId) -> Self {
        Event::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_payload_is_zero() {
        let ev = Event::new(EventId(4));
        assert_eq!(ev.id(), EventId(4));
        assert_eq!(ev.payload(), 0);
        assert_eq!(Event::from(EventId(4)), ev);
    }

    #[test]
    fn test_is_matches_identity_and_payload() {
        let ev = Event::with_payload(EventId(2), 1);
        assert!(ev.is(EventId(2), 1));
        assert!(!ev.is(EventId(2), 0));
        assert!(!ev.is(EventId(3), 1));
    }

    #[test]
    fn test_offset_addresses_timer_range() {
        let base = EventId(9);
        assert_eq!(base.offset(0), EventId(9));
        assert_eq!(base.offset(3), EventId(12));
        assert_eq!(base.to_string(), "#9");
    }
}
