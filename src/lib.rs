//! # Hierarchical State Machine Dispatch
//!
//! A run-to-completion hierarchical state machine engine for embedded style
//! controllers, with staleness-checked timers, "is in" queries backed by a
//! containment table and PlantUML diagram generation.
//!
//! ## Features
//!
//! - 🏗️ **Hierarchical States**: Unhandled events bubble up to enclosing states
//! - 🔁 **Run to Completion**: One event is fully processed before the next
//! - ⏰ **Timer Cookies**: Timeouts from a superseded timer start are ignored
//! - 🧭 **Is-In Queries**: Constant time "is the machine in state X" checks
//! - 📊 **PlantUML Export**: Automatic state diagram generation (debug builds only)
//! - 🧵 **Async Driving**: Feed the machine from any async event source
//!
//! ## Quick Start
//!
//! ```rust
//! use hfsm_dispatch::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum State { Powered, Off, On }
//!
//! impl HierarchicalState for State {
//!     const ALL: &'static [Self] = &[State::Powered, State::Off, State::On];
//!
//!     fn index(self) -> usize {
//!         self as usize
//!     }
//!
//!     fn parent(self) -> Option<Self> {
//!         match self {
//!             State::Powered => None,
//!             State::Off | State::On => Some(State::Powered),
//!         }
//!     }
//! }
//!
//! const RESET: EventId = EventId(0);
//! const TOGGLE: EventId = EventId(1);
//!
//! struct Toggle(State);
//!
//! impl Stateful<State, u32> for Toggle {
//!     fn on_event(&mut self, event: &Event, _presses: &mut u32) -> Response<State> {
//!         match event.id() {
//!             TOGGLE => Response::Transition(self.0),
//!             _ => Response::Super,
//!         }
//!     }
//!
//!     fn on_enter(&mut self, presses: &mut u32) -> Response<State> {
//!         *presses += 1;
//!         Response::Handled
//!     }
//! }
//!
//! # fn main() -> hfsm_dispatch::Result<()> {
//! let mut fsm = StateMachineBuilder::new(0)
//!     .state(State::Off, Toggle(State::On))
//!     .state(State::On, Toggle(State::Off))
//!     .initial(State::Off)
//!     .reset_event(RESET)
//!     .build()?;
//!
//! fsm.process(&Event::new(RESET));
//! fsm.process(&Event::new(TOGGLE));
//! assert_eq!(fsm.current_state(), State::On);
//! assert!(fsm.is_in(State::Powered));
//! assert_eq!(*fsm.context(), 1);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub use async_trait::async_trait;

mod builder;
mod catalog;
mod error;
mod event;
mod fsm;
mod hierarchy;
mod queue;
mod runner;
mod timer;

#[cfg(all(feature = "plantuml", debug_assertions))]
mod plantuml;

pub mod motor;

pub use builder::StateMachineBuilder;
pub use catalog::{EventCatalog, EventDef, TraceMask, GROUP_ALL};
pub use error::{Error, Result};
pub use event::{Event, EventId};
pub use fsm::{Outcome, Response, StateMachine, Stateful, TransitionObserver, Trigger};
pub use hierarchy::{Ancestors, HierarchicalState, IsInTable};
pub use queue::EventQueue;
pub use runner::{EventSource, Runner};
pub use timer::{TimerEvents, TimerIndex, TimerService, Timers};

#[cfg(feature = "tokio-integration")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio-integration")))]
pub use timer::TokioTimerService;

pub mod prelude {
    //! Prelude module for convenient imports
    pub use crate::{
        Error, Event, EventId, EventQueue, HierarchicalState, Outcome, Response, Result, Runner,
        StateMachine, StateMachineBuilder, Stateful, TimerIndex, TimerService, Trigger,
    };
    pub use async_trait::async_trait;
    pub use std::time::Duration;
}
