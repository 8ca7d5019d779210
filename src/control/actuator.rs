//! Valve actuator controller.
//!
//! One [`ValveChannel`] per valve.  It turns logical commands into actuator
//! writes through the [`ActuatorPort`], clamping every position into the
//! channel's safe range first.
//!
//! ## Safety contract
//!
//! - Every write is clamped; `close_position` is always inside the range
//!   (enforced by [`SystemConfig::validate`](crate::config::SystemConfig::validate)).
//! - No write suppression: repeated `set` calls with the same value re-drive
//!   the actuator, which some servos need as a refresh.

use log::warn;

use crate::app::commands::ValveCommand;
use crate::app::ports::ActuatorPort;
use crate::config::{ChannelConfig, Valve};

/// Inclusive actuator position bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeRange {
    pub min: i32,
    pub max: i32,
}

impl SafeRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, position: i32) -> i32 {
        position.clamp(self.min, self.max)
    }

    pub fn contains(&self, position: i32) -> bool {
        (self.min..=self.max).contains(&position)
    }
}

pub struct ValveChannel {
    valve: Valve,
    range: SafeRange,
    open_position: i32,
    close_position: i32,
    /// Last value written, for telemetry only.
    commanded: i32,
}

impl ValveChannel {
    /// Build a channel from validated config.  Starts at the fail-safe
    /// position; nothing is written until [`close`](Self::close) or
    /// [`set`](Self::set) is called.
    pub fn new(cfg: &ChannelConfig) -> Self {
        let range = SafeRange::new(cfg.safe_min, cfg.safe_max);
        Self {
            valve: cfg.valve,
            range,
            open_position: range.clamp(cfg.open_position),
            close_position: range.clamp(cfg.close_position),
            commanded: range.clamp(cfg.close_position),
        }
    }

    /// Clamp `position` into the safe range and drive the actuator.
    /// Returns the position actually written.
    pub fn set(&mut self, position: i32, hw: &mut impl ActuatorPort) -> i32 {
        let position = self.range.clamp(position);
        self.commanded = position;
        if let Err(e) = hw.write_position(self.valve, position) {
            warn!("{} valve: write {} failed: {}", self.valve.label(), position, e);
        }
        position
    }

    pub fn open(&mut self, hw: &mut impl ActuatorPort) -> i32 {
        self.set(self.open_position, hw)
    }

    /// Drive to the fail-safe position.
    pub fn close(&mut self, hw: &mut impl ActuatorPort) -> i32 {
        self.set(self.close_position, hw)
    }

    pub fn apply(&mut self, cmd: ValveCommand, hw: &mut impl ActuatorPort) -> i32 {
        match cmd {
            ValveCommand::Open => self.open(hw),
            ValveCommand::Close => self.close(hw),
            ValveCommand::Position(p) => self.set(p, hw),
        }
    }

    pub fn valve(&self) -> Valve {
        self.valve
    }

    pub fn commanded(&self) -> i32 {
        self.commanded
    }

    pub fn is_closed(&self) -> bool {
        self.commanded == self.close_position
    }

    pub fn range(&self) -> SafeRange {
        self.range
    }

    pub fn close_position(&self) -> i32 {
        self.close_position
    }

    pub fn open_position(&self) -> i32 {
        self.open_position
    }
}
