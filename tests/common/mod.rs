#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use hfsm_dispatch::motor::driver::OutputLog;
use hfsm_dispatch::motor::events::{payload, SM_RESET, SW_ESTOP, SW_RUN};
use hfsm_dispatch::motor::regs::Registers;
use hfsm_dispatch::motor::{self, MotorContext, MotorState};
use hfsm_dispatch::{Event, EventId, EventQueue, Runner, TimerService};

/// Timer service that only records what it was asked to schedule
#[derive(Debug, Clone, Default)]
pub struct ScheduledTimers {
    scheduled: Arc<Mutex<Vec<(Duration, Event)>>>,
}

impl ScheduledTimers {
    pub fn all(&self) -> Vec<(Duration, Event)> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn latest(&self) -> Option<(Duration, Event)> {
        self.scheduled.lock().unwrap().last().copied()
    }

    pub fn count(&self) -> usize {
        self.scheduled.lock().unwrap().len()
    }
}

impl TimerService for ScheduledTimers {
    fn schedule(&self, after: Duration, event: Event) {
        self.scheduled.lock().unwrap().push((after, event));
    }
}

pub struct Motor {
    pub runner: Runner<MotorState, MotorContext>,
    pub outputs: OutputLog,
    pub timers: ScheduledTimers,
}

impl Motor {
    /// Built but not yet reset
    pub fn unstarted(regs: Registers) -> Self {
        let queue = EventQueue::new();
        let outputs = OutputLog::new();
        let timers = ScheduledTimers::default();
        let context = MotorContext::new(regs, timers.clone(), outputs.clone(), queue.clone());
        let machine = motor::build_machine(context).unwrap();
        Self {
            runner: Runner::new(machine, queue),
            outputs,
            timers,
        }
    }

    /// Reset and idle, sitting in `Stopping` (or `Estop` if flagged)
    pub fn started(regs: Registers) -> Self {
        let mut motor = Self::unstarted(regs);
        motor.send(Event::new(SM_RESET));
        motor
    }

    pub fn new() -> Self {
        Self::started(Registers::new())
    }

    pub fn state(&self) -> MotorState {
        self.runner.machine().current_state()
    }

    pub fn regs(&self) -> &Registers {
        &self.runner.machine().context().regs
    }

    pub fn queue(&self) -> &EventQueue {
        self.runner.queue()
    }

    pub fn send(&mut self, event: Event) -> usize {
        self.runner.queue().publish(event);
        self.runner.run_until_idle()
    }

    pub fn click(&mut self, id: EventId) -> usize {
        self.send(Event::with_payload(id, payload::SW_CLICK))
    }

    pub fn release(&mut self, id: EventId) -> usize {
        self.send(Event::with_payload(id, payload::SW_RELEASE))
    }

    /// Deliver the most recently scheduled timeout, returning its delay
    pub fn fire_latest_timer(&mut self) -> Duration {
        let (after, event) = self.timers.latest().expect("no timer scheduled");
        self.send(event);
        after
    }

    /// Walk a freshly started machine into `target`
    pub fn drive_to(&mut self, target: MotorState) {
        let path = [
            MotorState::Stopping,
            MotorState::Stop,
            MotorState::SetDir,
            MotorState::Start,
            MotorState::Run,
        ];
        assert_eq!(self.state(), MotorState::Stopping);
        if target == MotorState::Estop {
            self.click(SW_ESTOP);
            return;
        }
        for state in path {
            if self.state() == target {
                return;
            }
            match state {
                MotorState::Stop => {
                    self.click(SW_RUN);
                }
                _ => {
                    self.fire_latest_timer();
                }
            }
        }
        assert_eq!(self.state(), target, "cannot drive to {target:?}");
    }
}

/// Every state the machine can rest in
pub const LEAF_STATES: [MotorState; 6] = [
    MotorState::Stopping,
    MotorState::Stop,
    MotorState::SetDir,
    MotorState::Start,
    MotorState::Run,
    MotorState::Estop,
];

/// Leaf states inside `Normal`
pub const NORMAL_STATES: [MotorState; 5] = [
    MotorState::Stopping,
    MotorState::Stop,
    MotorState::SetDir,
    MotorState::Start,
    MotorState::Run,
];
