//! Builder pattern implementation for state machines

use std::collections::HashMap;

use tracing::warn;

use crate::fsm::{ResetConfig, ResetFn, TransitionObserver};
use crate::{Error, EventId, HierarchicalState, IsInTable, Result, StateMachine, Stateful};

/// Builder for constructing state machines
pub struct StateMachineBuilder<S, CTX>
where
    S: HierarchicalState,
{
    context: CTX,
    states: HashMap<S, Box<dyn Stateful<S, CTX>>>,
    initial_state: Option<S>,
    reset_event: Option<EventId>,
    on_reset: Option<ResetFn<CTX>>,
    is_in_table: Option<IsInTable>,
    observers: Vec<Box<dyn TransitionObserver<S>>>,
}

impl<S, CTX> StateMachineBuilder<S, CTX>
where
    S: HierarchicalState,
{
    /// Create a new builder with the given context
    pub fn new(context: CTX) -> Self {
        Self {
            context,
            states: HashMap::new(),
            initial_state: None,
            reset_event: None,
            on_reset: None,
            is_in_table: None,
            observers: Vec::new(),
        }
    }

    /// Add a handler for a leaf or composite state
    pub fn state<T>(mut self, state_id: S, state_impl: T) -> Self
    where
        T: Stateful<S, CTX> + 'static,
    {
        self.states.insert(state_id, Box::new(state_impl));
        self
    }

    /// State the machine starts in and returns to on reset.
    ///
    /// Reset runs no entry handlers, so this should normally be a leaf state.
    pub fn initial(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Event identity that resets the machine from any state
    pub fn reset_event(mut self, id: EventId) -> Self {
        self.reset_event = Some(id);
        self
    }

    /// Actions run after every reset
    pub fn on_reset<F>(mut self, actions: F) -> Self
    where
        F: FnMut(&mut CTX) + Send + 'static,
    {
        self.on_reset = Some(Box::new(actions));
        self
    }

    /// Use a generated containment table instead of computing one
    pub fn is_in_table(mut self, table: IsInTable) -> Self {
        self.is_in_table = Some(table);
        self
    }

    /// Notify `observer` of every state change
    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: TransitionObserver<S> + 'static,
    {
        self.observers.push(Box::new(observer));
        self
    }

    /// Build the state machine
    pub fn build(self) -> Result<StateMachine<S, CTX>> {
        let initial_state = self.initial_state.ok_or(Error::MissingInitialState)?;
        if S::ALL.iter().any(|state| state.parent() == Some(initial_state)) {
            warn!(
                state = ?initial_state,
                "composite initial state, reset will not take its initial transition"
            );
        }
        let is_in_table = self.is_in_table.unwrap_or_else(IsInTable::build::<S>);
        Ok(StateMachine::new(
            self.context,
            self.states,
            initial_state,
            is_in_table,
            ResetConfig {
                event: self.reset_event,
                actions: self.on_reset,
            },
            self.observers,
        ))
    }
}
