//! Motorized actuator controller.
//!
//! Drives a motor through direction relays, a soft start stage and a run
//! stage, with an emergency stop that overrides everything:
//!
//! ```text
//! Normal ──────────────────────────────────────┐
//! │ Stopping ─timer─▶ Stop ─run─▶ Running ─────┐│
//! │                                 SetDir ─timer─▶ Start ─timer─▶ Run
//! └────────────────────────────────────────────┘
//! Estop   (from anywhere in Normal on emergency stop press)
//! ```
//!
//! Events no leaf state handles are passed to the enclosing composite
//! state: `Normal` reacts to the emergency stop, `Running` aborts to
//! `Stopping` on any direction or run button.

pub mod driver;
pub mod events;
pub mod regs;
mod states;

use std::fmt;
use std::time::Duration;

use tracing::warn;

use crate::fsm::Trigger;
use crate::timer::{TimerService, Timers};
use crate::{
    Event, EventQueue, HierarchicalState, IsInTable, Result, StateMachine, StateMachineBuilder,
    TransitionObserver,
};

use driver::{Colour, Flash, Indicator, OutputDevice, RunRelay};
use events::{payload, SW_ESTOP, TIMER_EVENTS, TIMER_MOTOR_STOP};
use regs::{flags, Reg, Registers};

/// Time for a relay to settle after it has been switched
pub const RELAY_OPERATE_DELAY: Duration = Duration::from_millis(200);

/// States of the motor controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorState {
    /// Composite: everything except the emergency stop
    Normal,
    /// Motor running down after being switched off
    Stopping,
    /// Motor stopped, waiting for a run command
    Stop,
    /// Composite: motor being started or running
    Running,
    /// Direction relay operating
    SetDir,
    /// Soft start
    Start,
    /// Full run
    Run,
    /// Emergency stop
    Estop,
}

/// Generated containment data, one byte per state
pub static IS_IN_DATA: [u8; 8] = [0x01, 0x03, 0x05, 0x09, 0x19, 0x29, 0x49, 0x80];

impl HierarchicalState for MotorState {
    const ALL: &'static [Self] = &[
        MotorState::Normal,
        MotorState::Stopping,
        MotorState::Stop,
        MotorState::Running,
        MotorState::SetDir,
        MotorState::Start,
        MotorState::Run,
        MotorState::Estop,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn parent(self) -> Option<Self> {
        match self {
            MotorState::Stopping | MotorState::Stop | MotorState::Running => {
                Some(MotorState::Normal)
            }
            MotorState::SetDir | MotorState::Start | MotorState::Run => Some(MotorState::Running),
            MotorState::Normal | MotorState::Estop => None,
        }
    }
}

/// Collaborators the motor transitions act on
pub struct MotorContext {
    /// Configuration and flags
    pub regs: Registers,
    /// Timer slots
    pub timers: Timers,
    /// Relays and indicators
    pub outputs: Box<dyn OutputDevice>,
    /// The machine's own event queue, for front-of-queue re-injection
    pub queue: EventQueue,
}

impl MotorContext {
    /// Bundle the collaborators for one machine instance
    pub fn new<T, O>(regs: Registers, timer_service: T, outputs: O, queue: EventQueue) -> Self
    where
        T: TimerService + 'static,
        O: OutputDevice + 'static,
    {
        Self {
            regs,
            timers: Timers::new(TIMER_EVENTS, timer_service),
            outputs: Box::new(outputs),
            queue,
        }
    }

    fn is_dir_reversed(&self) -> bool {
        self.regs.is_flag_set(flags::MOTOR_DIR_REVERSE)
    }

    fn update_dir_indicator(&mut self, flash: Flash) {
        let colour = if self.is_dir_reversed() {
            Colour::Red
        } else {
            Colour::Green
        };
        self.outputs.indicator_set(Indicator::Dir, colour, flash);
    }

    fn set_run_relay(&mut self, stage: RunRelay) {
        self.outputs.relay_write(RunRelay::MASK, stage.bits());
    }

    fn start_motor_timer(&mut self, duration: Duration) {
        self.timers.start(TIMER_MOTOR_STOP, duration);
    }

    /// Drop the run relays and let the motor run down
    fn run_down(&mut self) {
        self.set_run_relay(RunRelay::Stop);
        self.outputs
            .indicator_set(Indicator::Run, Colour::Blue, Flash::VFast);
        let run_down = self.regs.duration(Reg::MotorRunDownDuration);
        self.start_motor_timer(run_down);
    }

    /// Entry into `Stopping` after a reset or an emergency stop release.
    ///
    /// If the emergency stop is still asserted the machine is sent straight
    /// back to `Estop` ahead of anything else queued.
    fn restart(&mut self) {
        self.update_dir_indicator(Flash::Solid);
        if self.regs.is_flag_set(flags::ESTOP) {
            self.queue
                .publish_front(Event::with_payload(SW_ESTOP, payload::SW_CLICK));
        }
        self.run_down();
    }
}

impl fmt::Debug for MotorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotorContext")
            .field("regs", &self.regs)
            .field("timers", &self.timers)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

/// Builder with every motor state registered, for adding observers
pub fn builder(context: MotorContext) -> StateMachineBuilder<MotorState, MotorContext> {
    StateMachineBuilder::new(context)
        .state(MotorState::Normal, states::NormalState)
        .state(MotorState::Stopping, states::StoppingState)
        .state(MotorState::Stop, states::StopState)
        .state(MotorState::Running, states::RunningState)
        .state(MotorState::SetDir, states::SetDirState)
        .state(MotorState::Start, states::StartState)
        .state(MotorState::Run, states::RunState)
        .state(MotorState::Estop, states::EstopState)
        .initial(MotorState::Stopping)
        .reset_event(events::SM_RESET)
        .on_reset(MotorContext::restart)
        .is_in_table(IsInTable::from_static(&IS_IN_DATA, 1))
}

/// The motor controller state machine
pub fn build_machine(context: MotorContext) -> Result<StateMachine<MotorState, MotorContext>> {
    builder(context).build()
}

/// Publishes [`DEBUG_SM_STATE_CHANGE`](events::DEBUG_SM_STATE_CHANGE) with
/// the new state index on every state change, for consoles reading the queue.
#[derive(Debug, Clone)]
pub struct StateChangePublisher {
    queue: EventQueue,
}

impl StateChangePublisher {
    /// Publish on `queue`
    pub fn new(queue: EventQueue) -> Self {
        Self { queue }
    }
}

impl<S: HierarchicalState> TransitionObserver<S> for StateChangePublisher {
    fn on_transition(&mut self, _from: S, to: S, _trigger: Trigger) {
        let Ok(index) = u8::try_from(to.index()) else {
            warn!(state = ?to, "state index does not fit a payload, change not published");
            return;
        };
        self.queue
            .publish(Event::with_payload(events::DEBUG_SM_STATE_CHANGE, index));
    }
}
