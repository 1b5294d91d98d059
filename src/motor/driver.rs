//! Output device contract: relays and indicator lamps.
//!
//! Commands are fire and forget. The machine never learns whether a relay
//! actually moved.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

/// Relay bits
pub mod relays {
    /// Run relay, full motor current
    pub const RUN: u16 = 1 << 0;
    /// Start relay, via the soft start resistor
    pub const START: u16 = 1 << 1;
    /// Direction relay for forward running
    pub const DIR_1: u16 = 1 << 2;
    /// Direction relay for reverse running
    pub const DIR_2: u16 = 1 << 3;
    /// Both direction relays
    pub const DIR: u16 = DIR_1 | DIR_2;
}

/// Stages of the run relay pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunRelay {
    /// Both off
    Stop,
    /// Start relay only
    Start,
    /// Start and run relays
    RunStart,
    /// Run relay only
    Run,
}

impl RunRelay {
    /// Mask covering the relays the stage controls
    pub const MASK: u16 = relays::RUN | relays::START;

    /// Relay bits for the stage
    pub const fn bits(self) -> u16 {
        match self {
            RunRelay::Stop => 0,
            RunRelay::Start => relays::START,
            RunRelay::RunStart => relays::START | relays::RUN,
            RunRelay::Run => relays::RUN,
        }
    }
}

/// Indicator lamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// Run state
    Run,
    /// Direction
    Dir,
}

/// Lamp colours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colour {
    /// Lamp dark
    Off,
    /// Red
    Red,
    /// Green
    Green,
    /// Blue
    Blue,
}

/// Lamp flash patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    /// Steady
    Solid,
    /// Slow blink
    Slow,
    /// Fast blink
    Fast,
    /// Very fast blink
    VFast,
}

/// Relay and indicator driver.
pub trait OutputDevice: Send {
    /// Set the relays in `mask` to the corresponding bits of `value`
    fn relay_write(&mut self, mask: u16, value: u16);

    /// Set an indicator's colour and flash pattern
    fn indicator_set(&mut self, indicator: Indicator, colour: Colour, flash: Flash);
}

/// One command sent to the output device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCommand {
    /// [`OutputDevice::relay_write`]
    Relay {
        /// Relays affected
        mask: u16,
        /// New relay bits
        value: u16,
    },
    /// [`OutputDevice::indicator_set`]
    Indicator(Indicator, Colour, Flash),
}

/// Output device that keeps the commands it receives and the resulting
/// relay state.
///
/// Clones share the same record, so a test or console can keep a handle
/// while the machine owns another.
#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    inner: Arc<Mutex<OutputState>>,
}

#[derive(Debug, Default)]
struct OutputState {
    relays: u16,
    commands: Vec<OutputCommand>,
}

impl OutputLog {
    /// Create an empty log with all relays off
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut OutputState) -> T) -> T {
        f(&mut self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Current relay bits
    pub fn relays(&self) -> u16 {
        self.with(|state| state.relays)
    }

    /// Commands received so far
    pub fn commands(&self) -> Vec<OutputCommand> {
        self.with(|state| state.commands.clone())
    }

    /// Take the commands received so far, leaving the log empty
    pub fn drain(&self) -> Vec<OutputCommand> {
        self.with(|state| std::mem::take(&mut state.commands))
    }
}

impl OutputDevice for OutputLog {
    fn relay_write(&mut self, mask: u16, value: u16) {
        debug!(mask, value, "relay write");
        self.with(|state| {
            state.relays = (state.relays & !mask) | (value & mask);
            state.commands.push(OutputCommand::Relay { mask, value });
        });
    }

    fn indicator_set(&mut self, indicator: Indicator, colour: Colour, flash: Flash) {
        debug!(?indicator, ?colour, ?flash, "indicator set");
        self.with(|state| {
            state
                .commands
                .push(OutputCommand::Indicator(indicator, colour, flash))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_relay_stages() {
        assert_eq!(RunRelay::Stop.bits(), 0);
        assert_eq!(RunRelay::Start.bits(), relays::START);
        assert_eq!(RunRelay::RunStart.bits(), RunRelay::MASK);
        assert_eq!(RunRelay::Run.bits(), relays::RUN);
    }

    #[test]
    fn test_relay_write_respects_mask() {
        let mut log = OutputLog::new();
        let handle = log.clone();

        log.relay_write(relays::DIR, relays::DIR_1);
        log.relay_write(RunRelay::MASK, RunRelay::RunStart.bits());
        assert_eq!(handle.relays(), relays::DIR_1 | relays::RUN | relays::START);

        // Bits outside the mask are left alone
        log.relay_write(RunRelay::MASK, relays::DIR_2 | relays::RUN);
        assert_eq!(handle.relays(), relays::DIR_1 | relays::RUN);
    }

    #[test]
    fn test_drain_empties_commands() {
        let mut log = OutputLog::new();
        log.indicator_set(Indicator::Run, Colour::Blue, Flash::Solid);
        assert_eq!(
            log.drain(),
            vec![OutputCommand::Indicator(Indicator::Run, Colour::Blue, Flash::Solid)]
        );
        assert!(log.commands().is_empty());
    }
}
