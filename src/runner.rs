//! Run loop feeding queued events to a machine.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{Event, EventCatalog, EventQueue, HierarchicalState, Outcome, StateMachine, TraceMask};

/// Asynchronous supplier of events from outside the machine, e.g. switch
/// inputs or timer expiries.
#[async_trait]
pub trait EventSource: Send {
    /// Next event, or `None` once the source is exhausted
    async fn next_event(&mut self) -> Option<Event>;
}

#[cfg(feature = "tokio-integration")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio-integration")))]
#[async_trait]
impl EventSource for tokio::sync::mpsc::UnboundedReceiver<Event> {
    async fn next_event(&mut self) -> Option<Event> {
        self.recv().await
    }
}

/// Owns a machine and the queue it consumes.
///
/// Events are dispatched one at a time, each run to completion before the
/// next is taken from the queue.
pub struct Runner<S, CTX>
where
    S: HierarchicalState,
{
    machine: StateMachine<S, CTX>,
    queue: EventQueue,
    catalog: Option<EventCatalog>,
    trace: Option<TraceMask>,
}

impl<S, CTX> Runner<S, CTX>
where
    S: HierarchicalState,
{
    /// Run `machine` from `queue`
    pub fn new(machine: StateMachine<S, CTX>, queue: EventQueue) -> Self {
        Self {
            machine,
            queue,
            catalog: None,
            trace: None,
        }
    }

    /// Name events from `catalog` in logs and trace those in `trace` at info
    /// level
    pub fn with_trace(mut self, catalog: EventCatalog, trace: TraceMask) -> Self {
        self.catalog = Some(catalog);
        self.trace = Some(trace);
        self
    }

    /// The machine being run
    pub fn machine(&self) -> &StateMachine<S, CTX> {
        &self.machine
    }

    /// Mutable access to the machine being run
    pub fn machine_mut(&mut self) -> &mut StateMachine<S, CTX> {
        &mut self.machine
    }

    /// The queue the machine consumes
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Dispatch one event immediately, bypassing the queue
    pub fn dispatch(&mut self, event: &Event) -> Outcome<S> {
        let name = self
            .catalog
            .as_ref()
            .and_then(|catalog| catalog.name(event.id()))
            .unwrap_or("?");
        if self
            .trace
            .as_ref()
            .is_some_and(|mask| mask.contains(event.id()))
        {
            info!(id = %event.id(), name, payload = event.payload(), "event");
        } else {
            debug!(id = %event.id(), name, payload = event.payload(), "event");
        }
        self.machine.process(event)
    }

    /// Dispatch queued events until the queue is empty, including any the
    /// machine publishes along the way. Returns the number dispatched.
    pub fn run_until_idle(&mut self) -> usize {
        let mut dispatched = 0;
        while let Some(event) = self.queue.pop() {
            self.dispatch(&event);
            dispatched += 1;
        }
        dispatched
    }

    /// Dispatch events from `source` until it is exhausted, draining the
    /// queue after each one. Returns the number dispatched.
    pub async fn run<E>(&mut self, source: &mut E) -> usize
    where
        E: EventSource + ?Sized,
    {
        let mut dispatched = self.run_until_idle();
        while let Some(event) = source.next_event().await {
            self.queue.publish(event);
            dispatched += self.run_until_idle();
        }
        debug!(dispatched, "event source exhausted");
        dispatched
    }

    /// Give up the machine
    pub fn into_machine(self) -> StateMachine<S, CTX> {
        self.machine
    }
}

impl<S, CTX> std::fmt::Debug for Runner<S, CTX>
where
    S: HierarchicalState,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("current_state", &self.machine.current_state())
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventId, Response, StateMachineBuilder, Stateful};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Lamp {
        Off,
        On,
    }

    impl HierarchicalState for Lamp {
        const ALL: &'static [Self] = &[Lamp::Off, Lamp::On];

        fn index(self) -> usize {
            self as usize
        }

        fn parent(self) -> Option<Self> {
            None
        }
    }

    const TOGGLE: EventId = EventId(1);
    const ECHO: EventId = EventId(2);

    struct Toggle {
        to: Lamp,
        queue: EventQueue,
    }

    impl Stateful<Lamp, u32> for Toggle {
        fn on_event(&mut self, event: &Event, count: &mut u32) -> Response<Lamp> {
            match event.id() {
                TOGGLE => {
                    self.queue.publish(Event::new(ECHO));
                    Response::Transition(self.to)
                }
                ECHO => {
                    *count += 1;
                    Response::Handled
                }
                _ => Response::Ignored,
            }
        }
    }

    fn runner() -> Runner<Lamp, u32> {
        let queue = EventQueue::new();
        let machine = StateMachineBuilder::new(0)
            .state(
                Lamp::Off,
                Toggle {
                    to: Lamp::On,
                    queue: queue.clone(),
                },
            )
            .state(
                Lamp::On,
                Toggle {
                    to: Lamp::Off,
                    queue: queue.clone(),
                },
            )
            .initial(Lamp::Off)
            .build()
            .unwrap();
        Runner::new(machine, queue)
    }

    #[test]
    fn test_run_until_idle_follows_published_events() {
        let mut runner = runner();
        runner.queue().publish(Event::new(TOGGLE));
        assert_eq!(runner.run_until_idle(), 2);
        assert_eq!(runner.machine().current_state(), Lamp::On);
        assert_eq!(*runner.machine().context(), 1);
        assert!(runner.queue().is_empty());
    }

    struct Script(Vec<Event>);

    #[async_trait]
    impl EventSource for Script {
        async fn next_event(&mut self) -> Option<Event> {
            if self.0.is_empty() {
                None
            } else {
                Some(self.0.remove(0))
            }
        }
    }

    #[tokio::test]
    async fn test_run_drains_source() {
        let mut runner = runner();
        let mut source = Script(vec![Event::new(TOGGLE), Event::new(TOGGLE), Event::new(TOGGLE)]);
        assert_eq!(runner.run(&mut source).await, 6);
        assert_eq!(runner.machine().current_state(), Lamp::On);
        assert_eq!(*runner.into_machine().context(), 3);
    }
}
