//! Register store for the motor controller.
//!
//! Registers hold the configuration the machine reads (soft start and run
//! down durations) and a small set of flags. The flags are also written by
//! the outside world, e.g. the emergency stop input sets [`flags::ESTOP`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Bits of the [`Reg::Flags`] register
pub mod flags {
    /// Motor direction is reversed
    pub const MOTOR_DIR_REVERSE: u16 = 1 << 0;
    /// Emergency stop input is asserted
    pub const ESTOP: u16 = 1 << 1;
}

/// Register indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    /// Flag bits, see [`flags`]
    Flags,
    /// Soft start duration in milliseconds
    MotorSoftStartDuration,
    /// Motor run down duration in milliseconds
    MotorRunDownDuration,
}

impl Reg {
    /// Number of registers
    pub const COUNT: usize = 3;

    const fn index(self) -> usize {
        self as usize
    }
}

/// Register values as read from configuration.
///
/// Missing fields take their defaults; unknown fields are an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegisterConfig {
    /// Initial flag bits
    pub flags: u16,
    /// Soft start duration in milliseconds
    pub motor_soft_start_duration: u16,
    /// Motor run down duration in milliseconds
    pub motor_run_down_duration: u16,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            flags: 0,
            motor_soft_start_duration: 2000,
            motor_run_down_duration: 1000,
        }
    }
}

/// In-memory register store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    values: [u16; Reg::COUNT],
}

impl Default for Registers {
    fn default() -> Self {
        Self::from_config(&RegisterConfig::default())
    }
}

impl Registers {
    /// Registers holding their default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers initialised from a configuration
    pub fn from_config(config: &RegisterConfig) -> Self {
        let mut values = [0; Reg::COUNT];
        values[Reg::Flags.index()] = config.flags;
        values[Reg::MotorSoftStartDuration.index()] = config.motor_soft_start_duration;
        values[Reg::MotorRunDownDuration.index()] = config.motor_run_down_duration;
        Self { values }
    }

    /// Registers initialised from a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RegisterConfig = serde_json::from_str(json)?;
        Ok(Self::from_config(&config))
    }

    /// Current values as a configuration
    pub fn to_config(&self) -> RegisterConfig {
        RegisterConfig {
            flags: self.read(Reg::Flags),
            motor_soft_start_duration: self.read(Reg::MotorSoftStartDuration),
            motor_run_down_duration: self.read(Reg::MotorRunDownDuration),
        }
    }

    /// Read a register
    pub fn read(&self, reg: Reg) -> u16 {
        self.values[reg.index()]
    }

    /// Write a register
    pub fn write(&mut self, reg: Reg, value: u16) {
        self.values[reg.index()] = value;
    }

    /// A millisecond register as a duration
    pub fn duration(&self, reg: Reg) -> Duration {
        Duration::from_millis(u64::from(self.read(reg)))
    }

    /// The flags register
    pub fn flags(&self) -> u16 {
        self.read(Reg::Flags)
    }

    /// True if any bit of `mask` is set in the flags register
    pub fn is_flag_set(&self, mask: u16) -> bool {
        self.flags() & mask != 0
    }

    /// Set or clear the bits of `mask`
    pub fn set_flags(&mut self, mask: u16, on: bool) {
        let flags = &mut self.values[Reg::Flags.index()];
        if on {
            *flags |= mask;
        } else {
            *flags &= !mask;
        }
    }

    /// Invert the bits of `mask`
    pub fn toggle_flags(&mut self, mask: u16) {
        self.values[Reg::Flags.index()] ^= mask;
    }
}
