use tracing::{debug, trace};

use super::driver::{relays, Colour, Flash, Indicator, RunRelay};
use super::events::{
    payload, REM1_DIR, REM1_RUN, REM2_DIR, REM2_RUN, SW_DIR, SW_ESTOP, SW_RUN,
    TIMEOUT_MOTOR_STOP,
};
use super::regs::{flags, Reg};
use super::{MotorContext, MotorState, RELAY_OPERATE_DELAY};
use crate::{Event, Response, Stateful};

fn is_dir_toggle(event: &Event) -> bool {
    matches!(event.id(), SW_DIR | REM1_DIR | REM2_DIR) && event.payload() == payload::SW_CLICK
}

fn is_run_toggle(event: &Event) -> bool {
    matches!(event.id(), SW_RUN | REM1_RUN | REM2_RUN) && event.payload() == payload::SW_CLICK
}

/// True for an expiry of the motor timer that has not been superseded
fn is_motor_timeout(event: &Event, ctx: &MotorContext) -> bool {
    if event.id() != TIMEOUT_MOTOR_STOP {
        return false;
    }
    let valid = ctx.timers.is_valid(event);
    if !valid {
        trace!(cookie = event.payload(), "stale motor timeout");
    }
    valid
}

pub(super) struct NormalState;

impl Stateful<MotorState, MotorContext> for NormalState {
    fn on_event(&mut self, event: &Event, ctx: &mut MotorContext) -> Response<MotorState> {
        if !event.is(SW_ESTOP, payload::SW_CLICK) {
            return Response::Super;
        }
        debug!("emergency stop");
        ctx.set_run_relay(RunRelay::Stop);
        ctx.outputs
            .indicator_set(Indicator::Run, Colour::Red, Flash::Fast);
        ctx.update_dir_indicator(Flash::Fast);
        Response::Transition(MotorState::Estop)
    }
}

pub(super) struct StoppingState;

impl Stateful<MotorState, MotorContext> for StoppingState {
    fn on_event(&mut self, event: &Event, ctx: &mut MotorContext) -> Response<MotorState> {
        if !is_motor_timeout(event, ctx) {
            return Response::Super;
        }
        ctx.set_run_relay(RunRelay::Stop);
        ctx.outputs.relay_write(relays::DIR, 0);
        ctx.outputs
            .indicator_set(Indicator::Run, Colour::Off, Flash::Solid);
        Response::Transition(MotorState::Stop)
    }
}

pub(super) struct StopState;

impl Stateful<MotorState, MotorContext> for StopState {
    fn on_event(&mut self, event: &Event, ctx: &mut MotorContext) -> Response<MotorState> {
        if is_dir_toggle(event) {
            ctx.regs.toggle_flags(flags::MOTOR_DIR_REVERSE);
            ctx.update_dir_indicator(Flash::Solid);
            Response::Handled
        } else if is_run_toggle(event) {
            let dir = if ctx.is_dir_reversed() {
                relays::DIR_2
            } else {
                relays::DIR_1
            };
            ctx.outputs.relay_write(relays::DIR, dir);
            ctx.start_motor_timer(RELAY_OPERATE_DELAY);
            Response::Transition(MotorState::SetDir)
        } else {
            Response::Super
        }
    }
}

/// Any direction or run button while the motor is starting or running
/// aborts back to `Stopping`.
pub(super) struct RunningState;

impl Stateful<MotorState, MotorContext> for RunningState {
    fn on_event(&mut self, event: &Event, ctx: &mut MotorContext) -> Response<MotorState> {
        if !is_dir_toggle(event) && !is_run_toggle(event) {
            return Response::Super;
        }
        debug!("motor start aborted");
        ctx.run_down();
        Response::Transition(MotorState::Stopping)
    }
}

pub(super) struct SetDirState;

impl Stateful<MotorState, MotorContext> for SetDirState {
    fn on_event(&mut self, event: &Event, ctx: &mut MotorContext) -> Response<MotorState> {
        if !is_motor_timeout(event, ctx) {
            return Response::Super;
        }
        ctx.set_run_relay(RunRelay::Start);
        ctx.outputs
            .indicator_set(Indicator::Run, Colour::Blue, Flash::VFast);
        let soft_start = ctx.regs.duration(Reg::MotorSoftStartDuration);
        ctx.start_motor_timer(soft_start);
        Response::Transition(MotorState::Start)
    }
}

pub(super) struct StartState;

impl Stateful<MotorState, MotorContext> for StartState {
    fn on_event(&mut self, event: &Event, ctx: &mut MotorContext) -> Response<MotorState> {
        if !is_motor_timeout(event, ctx) {
            return Response::Super;
        }
        ctx.set_run_relay(RunRelay::RunStart);
        ctx.start_motor_timer(RELAY_OPERATE_DELAY);
        Response::Transition(MotorState::Run)
    }
}

pub(super) struct RunState;

impl Stateful<MotorState, MotorContext> for RunState {
    fn on_event(&mut self, event: &Event, ctx: &mut MotorContext) -> Response<MotorState> {
        if !is_motor_timeout(event, ctx) {
            return Response::Super;
        }
        // Start relay drops out once the run relay has pulled in
        ctx.set_run_relay(RunRelay::Run);
        ctx.outputs
            .indicator_set(Indicator::Run, Colour::Blue, Flash::Solid);
        Response::Handled
    }
}

pub(super) struct EstopState;

impl Stateful<MotorState, MotorContext> for EstopState {
    fn on_event(&mut self, event: &Event, ctx: &mut MotorContext) -> Response<MotorState> {
        if !event.is(SW_ESTOP, payload::SW_RELEASE) {
            return Response::Super;
        }
        debug!("emergency stop released");
        ctx.restart();
        Response::Transition(MotorState::Stopping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_gates() {
        assert!(is_dir_toggle(&Event::with_payload(REM2_DIR, payload::SW_CLICK)));
        assert!(!is_dir_toggle(&Event::with_payload(REM2_DIR, payload::SW_RELEASE)));
        assert!(!is_dir_toggle(&Event::with_payload(SW_RUN, payload::SW_CLICK)));
        assert!(is_run_toggle(&Event::with_payload(REM1_RUN, payload::SW_CLICK)));
        assert!(!is_run_toggle(&Event::with_payload(SW_ESTOP, payload::SW_CLICK)));
    }
}
