//! A run-to-completion hierarchical state machine dispatching fixed-size events,
//! with a priority reset event and optional PlantUML export of the transitions taken.
//!
//! # Type Parameters
//! - `S`: State identifier type, implementing [`HierarchicalState`].
//! - `CTX`: Context type shared across state handlers (collaborators, registers, timers).
//!
//! # Features
//! - Per-state handlers via the [`Stateful`] trait, registered with the builder.
//! - Events a state does not handle are delegated to its enclosing state by
//!   returning [`Response::Super`], so one composite-state handler can serve
//!   many leaf states.
//! - A reset event is checked before the current state is consulted and always
//!   returns the machine to its initial state.
//! - Constant-time "is in" queries against the current state.
//! - Optional transition logging and PlantUML export (enabled with the `plantuml` feature in debug builds).
//!
//! # Usage
//! 1. Implement [`HierarchicalState`] for the state enum.
//! 2. Implement [`Stateful`] for each state (leaf or composite) that reacts to events.
//! 3. Register handlers, the initial state and the reset event with
//!    [`StateMachineBuilder`](crate::StateMachineBuilder).
//! 4. Feed events to [`StateMachine::process`] one at a time.
//!
//! # Errors
//! None at dispatch time. An event either matches a transition or is ignored;
//! the machine never refuses an event.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::{Event, EventId, HierarchicalState, IsInTable};

// Transition log entry type - only compiled with plantuml feature in debug
#[cfg(all(feature = "plantuml", debug_assertions))]
#[derive(Debug, Clone)]
pub(crate) struct TransitionRecord<S> {
    pub(crate) from: S,
    pub(crate) to: S,
    pub(crate) trigger: Trigger,
}

/// Trait for state handlers in the state machine.
///
/// Handlers run to completion: they call collaborators through the context
/// and answer with a [`Response`], never blocking or waiting.
pub trait Stateful<S, CTX>: Send {
    /// Called when an event is offered to the state.
    ///
    /// # Arguments
    /// * `event` - The event being dispatched.
    /// * `context` - Mutable reference to the shared context.
    ///
    /// # Returns
    /// A [`Response`] indicating how to proceed after handling the event.
    fn on_event(&mut self, event: &Event, context: &mut CTX) -> Response<S>;

    /// Called when entering the state.
    ///
    /// Returning [`Response::Transition`] from the target of a transition takes
    /// an initial transition to that state, usually a substate.
    fn on_enter(&mut self, _context: &mut CTX) -> Response<S> {
        Response::Handled
    }

    /// Called when leaving the state.
    fn on_exit(&mut self, _context: &mut CTX) {}
}

/// Response type for state handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response<S> {
    /// Event was acted on, no state change
    Handled,
    /// Event failed a payload or timer guard, nothing was done
    Ignored,
    /// Transition to a new state
    Transition(S),
    /// Delegate to the enclosing state
    Super,
}

/// What [`StateMachine::process`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<S> {
    /// The reset event moved the machine to its initial state
    Reset {
        /// State before the reset
        from: S,
    },
    /// A transition was taken
    Transitioned {
        /// State before the transition
        from: S,
        /// State after the transition, including any initial transitions
        to: S,
    },
    /// Handled without a state change
    Handled,
    /// No handler acted on the event
    Ignored,
}

/// Why a state change happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The reset event
    Reset,
    /// A transition on an event
    Event(EventId),
    /// An initial transition taken on entry
    Initial,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Reset => f.write_str("reset"),
            Trigger::Event(id) => write!(f, "event {id}"),
            Trigger::Initial => f.write_str("initial"),
        }
    }
}

/// Receives every state change, for tracing and debug consoles.
pub trait TransitionObserver<S>: Send {
    /// Called after the current state changed from `from` to `to`
    fn on_transition(&mut self, from: S, to: S, trigger: Trigger);
}

impl<S, F> TransitionObserver<S> for F
where
    F: FnMut(S, S, Trigger) + Send,
{
    fn on_transition(&mut self, from: S, to: S, trigger: Trigger) {
        self(from, to, trigger)
    }
}

pub(crate) type ResetFn<CTX> = Box<dyn FnMut(&mut CTX) + Send>;

/// Reset handling: the event that triggers it and the actions it runs
pub(crate) struct ResetConfig<CTX> {
    pub(crate) event: Option<EventId>,
    pub(crate) actions: Option<ResetFn<CTX>>,
}

/// A hierarchical run-to-completion state machine.
pub struct StateMachine<S, CTX>
where
    S: HierarchicalState,
{
    states: HashMap<S, Box<dyn Stateful<S, CTX>>>,
    current_state: S,
    initial_state: S,
    reset: ResetConfig<CTX>,
    is_in_table: IsInTable,
    observers: Vec<Box<dyn TransitionObserver<S>>>,
    context: CTX,

    // Transition log - only one record per unique state-to-state transition
    // Key: (from_state, to_state), Value: TransitionRecord
    #[cfg(all(feature = "plantuml", debug_assertions))]
    transition_log: HashMap<(S, S), TransitionRecord<S>>,
}

impl<S, CTX> StateMachine<S, CTX>
where
    S: HierarchicalState,
{
    /// Create a state machine sitting in `initial_state`.
    ///
    /// No entry actions run here; deliver the reset event (or call
    /// [`StateMachine::reset`]) to start the machine properly.
    pub(crate) fn new(
        context: CTX,
        states: HashMap<S, Box<dyn Stateful<S, CTX>>>,
        initial_state: S,
        is_in_table: IsInTable,
        reset: ResetConfig<CTX>,
        observers: Vec<Box<dyn TransitionObserver<S>>>,
    ) -> Self {
        Self {
            states,
            current_state: initial_state,
            initial_state,
            reset,
            is_in_table,
            observers,
            context,

            // Initialize the transition log
            #[cfg(all(feature = "plantuml", debug_assertions))]
            transition_log: HashMap::new(),
        }
    }

    // Log a transition (only in debug builds with plantuml feature)
    #[cfg(all(feature = "plantuml", debug_assertions))]
    fn log_transition(&mut self, from: S, to: S, trigger: Trigger) {
        let record = TransitionRecord {
            from,
            to,
            trigger,
        };
        self.transition_log.insert((from, to), record);
    }

    #[cfg(not(all(feature = "plantuml", debug_assertions)))]
    fn log_transition(&mut self, _from: S, _to: S, _trigger: Trigger) {
        // No-op when plantuml feature is disabled or in release builds
    }

    /// Set the current state and tell everyone who is listening
    fn change_state(&mut self, to: S, trigger: Trigger) {
        let from = self.current_state;
        self.current_state = to;
        debug!(?from, ?to, %trigger, "state change");
        self.log_transition(from, to, trigger);
        for observer in &mut self.observers {
            observer.on_transition(from, to, trigger);
        }
    }

    /// Run the reset: jump to the initial state and run the reset actions.
    ///
    /// The per-state handlers are not consulted and no exit or entry actions
    /// run. Equivalent to processing the reset event.
    ///
    /// Since entry handlers do not run, an initial transition out of the
    /// initial state is not taken either: a composite initial state stays
    /// current after a reset until an event moves the machine on.
    pub fn reset(&mut self) -> Outcome<S> {
        let from = self.current_state;
        self.change_state(self.initial_state, Trigger::Reset);
        if let Some(actions) = self.reset.actions.as_mut() {
            actions(&mut self.context);
        }
        Outcome::Reset { from }
    }

    /// Process one event to completion.
    pub fn process(&mut self, event: &Event) -> Outcome<S> {
        if self.reset.event == Some(event.id()) {
            return self.reset();
        }

        let mut handling = self.current_state;
        loop {
            let response = match self.states.get_mut(&handling) {
                Some(handler) => handler.on_event(event, &mut self.context),
                None => Response::Super,
            };

            match response {
                Response::Handled => return Outcome::Handled,
                Response::Ignored => {
                    trace!(state = ?handling, ?event, "event gated out");
                    return Outcome::Ignored;
                }
                Response::Transition(target) => {
                    let from = self.current_state;
                    self.transition_to(target, Trigger::Event(event.id()));
                    return Outcome::Transitioned {
                        from,
                        to: self.current_state,
                    };
                }
                Response::Super => match handling.parent() {
                    // Offer the same event to the enclosing state
                    Some(parent) => handling = parent,
                    None => {
                        trace!(state = ?self.current_state, ?event, "event not handled");
                        return Outcome::Ignored;
                    }
                },
            }
        }
    }

    /// Transition to a new state, running exit and entry handlers
    fn transition_to(&mut self, target: S, trigger: Trigger) {
        let mut target = target;
        let mut trigger = trigger;

        loop {
            let (exits, entries) = transition_path(self.current_state, target);

            for state in exits {
                if let Some(handler) = self.states.get_mut(&state) {
                    handler.on_exit(&mut self.context);
                }
            }

            if self.current_state != target {
                self.change_state(target, trigger);
            }

            let mut next = None;
            for state in entries {
                let Some(handler) = self.states.get_mut(&state) else {
                    continue;
                };
                match handler.on_enter(&mut self.context) {
                    Response::Transition(initial) if state == target => next = Some(initial),
                    Response::Transition(other) => {
                        warn!(?state, ?other, "transition from enclosing state's entry ignored");
                    }
                    Response::Super => warn!(?state, "on_enter cannot delegate to superstate"),
                    Response::Handled | Response::Ignored => {}
                }
            }

            match next {
                Some(initial) => {
                    target = initial;
                    trigger = Trigger::Initial;
                }
                None => return,
            }
        }
    }

    /// Get the current state
    pub fn current_state(&self) -> S {
        self.current_state
    }

    /// The state the reset event returns to
    pub fn initial_state(&self) -> S {
        self.initial_state
    }

    /// True if the current state is `state` or lies inside it
    pub fn is_in(&self, state: S) -> bool {
        self.is_in_table
            .is_in(self.current_state.index(), state.index())
    }

    /// The containment table used by [`StateMachine::is_in`]
    pub fn is_in_table(&self) -> &IsInTable {
        &self.is_in_table
    }

    /// Get a reference to the context
    pub fn context(&self) -> &CTX {
        &self.context
    }

    /// Get a mutable reference to the context
    pub fn context_mut(&mut self) -> &mut CTX {
        &mut self.context
    }

    /// Export the transitions taken so far as a PlantUML state diagram
    #[cfg(all(feature = "plantuml", debug_assertions))]
    pub fn export_plantuml(&self) -> String {
        let records = self
            .transition_log
            .values()
            .map(|record| (record.from, record.to, record.trigger));
        crate::plantuml::generate_plantuml(records, self.current_state)
    }

    /// Stub for export_plantuml when feature is disabled
    #[cfg(not(all(feature = "plantuml", debug_assertions)))]
    pub fn export_plantuml(&self) -> String {
        String::from("PlantUML export not available (requires 'plantuml' feature and debug build)")
    }
}

impl<S, CTX> fmt::Debug for StateMachine<S, CTX>
where
    S: HierarchicalState,
    CTX: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current_state", &self.current_state)
            .field("initial_state", &self.initial_state)
            .field("reset_event", &self.reset.event)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// States to exit (innermost first) and enter (outermost first) going from
/// `from` to `to`.
///
/// A target that is `from` itself or encloses it is left and re-entered, so
/// self transitions run their own exit and entry handlers.
fn transition_path<S: HierarchicalState>(from: S, to: S) -> (Vec<S>, Vec<S>) {
    let mut exits = Vec::new();
    for state in from.ancestors() {
        exits.push(state);
        if state == to {
            return (exits, vec![to]);
        }
    }

    let mut entries: Vec<S> = to.ancestors().collect();

    // Drop the ancestors both paths share
    while let (Some(a), Some(b)) = (exits.last(), entries.last()) {
        if a != b {
            break;
        }
        exits.pop();
        entries.pop();
    }

    entries.reverse();
    (exits, entries)
}
