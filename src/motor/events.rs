//! Event namespace of the motor controller.
//!
//! The constants and [`DEFINITIONS`] describe the same namespace; the
//! definition text is what consoles use to name and trace events.

use crate::timer::{TimerEvents, TimerIndex};
use crate::EventId;

/// Event definition text, parsed by [`EventCatalog`](crate::EventCatalog)
pub const DEFINITIONS: &str = "\
# Motor controller events.
SM_RESET                [sm]               Reset the state machine.
DEBUG_SM_STATE_CHANGE   [debug]            State machine changed state, payload is the new state.
SW_ESTOP                [default switch]   Emergency stop switch.
SW_DIR                  [default switch]   Local direction switch.
SW_RUN                  [default switch]   Local run switch.
REM1_DIR                [default remote]   Remote 1 direction button.
REM1_RUN                [default remote]   Remote 1 run button.
REM2_DIR                [default remote]   Remote 2 direction button.
REM2_RUN                [default remote]   Remote 2 run button.
TIMEOUT_[4]             [timer]            State machine timer expired,
    payload is the timer cookie.
";

/// Resets the state machine from any state
pub const SM_RESET: EventId = EventId(0);
/// Published on every state change with the new state as payload
pub const DEBUG_SM_STATE_CHANGE: EventId = EventId(1);
/// Emergency stop switch
pub const SW_ESTOP: EventId = EventId(2);
/// Local direction switch
pub const SW_DIR: EventId = EventId(3);
/// Local run switch
pub const SW_RUN: EventId = EventId(4);
/// Remote 1 direction button
pub const REM1_DIR: EventId = EventId(5);
/// Remote 1 run button
pub const REM1_RUN: EventId = EventId(6);
/// Remote 2 direction button
pub const REM2_DIR: EventId = EventId(7);
/// Remote 2 run button
pub const REM2_RUN: EventId = EventId(8);
/// First timer expiry identity
pub const TIMEOUT_0: EventId = EventId(9);
/// Number of timer slots
pub const TIMER_COUNT: u8 = 4;
/// Total number of events
pub const COUNT: usize = 13;

/// Timer expiry identities
pub const TIMER_EVENTS: TimerEvents = TimerEvents::new(TIMEOUT_0, TIMER_COUNT);

/// The timer used for every motor sequencing delay
pub const TIMER_MOTOR_STOP: TimerIndex = TimerIndex(0);
/// Expiry identity of [`TIMER_MOTOR_STOP`]
pub const TIMEOUT_MOTOR_STOP: EventId = TIMEOUT_0.offset(TIMER_MOTOR_STOP.0);

/// Switch payloads
pub mod payload {
    /// Switch released
    pub const SW_RELEASE: u8 = 0;
    /// Switch pressed
    pub const SW_CLICK: u8 = 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventCatalog;

    #[test]
    fn test_definitions_match_constants() {
        let catalog = EventCatalog::parse(DEFINITIONS).unwrap();
        assert_eq!(catalog.len(), COUNT);

        let named = [
            ("SM_RESET", SM_RESET),
            ("DEBUG_SM_STATE_CHANGE", DEBUG_SM_STATE_CHANGE),
            ("SW_ESTOP", SW_ESTOP),
            ("SW_DIR", SW_DIR),
            ("SW_RUN", SW_RUN),
            ("REM1_DIR", REM1_DIR),
            ("REM1_RUN", REM1_RUN),
            ("REM2_DIR", REM2_DIR),
            ("REM2_RUN", REM2_RUN),
            ("TIMEOUT_0", TIMEOUT_0),
        ];
        for (name, id) in named {
            assert_eq!(catalog.id(name), Some(id), "{name}");
        }
        assert_eq!(catalog.multi_count("TIMEOUT"), Some(TIMER_COUNT as usize));
    }

    #[test]
    fn test_timer_range_ends_the_namespace() {
        assert_eq!(TIMER_EVENTS.id_for(TimerIndex(TIMER_COUNT - 1)), Some(EventId(12)));
        assert_eq!(TIMER_EVENTS.index_of(TIMEOUT_MOTOR_STOP), Some(TIMER_MOTOR_STOP));
        assert_eq!(TIMER_EVENTS.index_of(REM2_RUN), None);
    }
}
