//! System configuration parameters
//!
//! All tunable parameters for the valve stand in one structure that is
//! handed to the control loop at start-up.  The firmware embeds
//! `config/stand.json` at build time; anything not set there comes from
//! [`SystemConfig::default`], which carries the reference bench values.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound on valve channels (fuel + oxidizer).
pub const MAX_CHANNELS: usize = 2;

/// Channel identity.  The discriminant is the channel index used for
/// pulse counters, actuator slots and telemetry field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Valve {
    Fuel = 0,
    Oxidizer = 1,
}

impl Valve {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Fuel => "fuel",
            Self::Oxidizer => "oxi",
        }
    }
}

/// Inbound command framing, fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolVariant {
    /// `"<fuel>,<oxi>\n"`, one integer field per channel.
    DelimitedDual,
    /// `'1'` opens every channel, `'0'` closes every channel.
    SingleChar,
}

/// Per-channel actuator and sensor settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub valve: Valve,
    /// Lowest position the actuator may ever be driven to.
    pub safe_min: i32,
    /// Highest position the actuator may ever be driven to.
    pub safe_max: i32,
    /// Position written for an "open" command.
    pub open_position: i32,
    /// Fail-safe position written for "closed" and on watchdog trip.
    pub close_position: i32,
    /// Enable the internal pull-up on the flow sensor input (open-drain
    /// hall sensors idle high and pull low on each pulse).
    pub pull_up: bool,
}

impl ChannelConfig {
    pub const fn reference(valve: Valve) -> Self {
        Self {
            valve,
            safe_min: 115,
            safe_max: 180,
            open_position: 180,
            close_position: 115,
            pull_up: true,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Channels ---
    /// Number of active channels (1 = fuel only, 2 = fuel + oxidizer).
    pub channel_count: u8,
    /// Per-channel settings, indexed by [`Valve::index`].
    pub channels: [ChannelConfig; MAX_CHANNELS],

    // --- Flow sensing ---
    /// Sensor calibration: pulse frequency (Hz) per L/min of flow.
    pub pulses_per_liter_per_minute: f32,
    /// Flow sampling and telemetry period (milliseconds).
    pub sampling_period_ms: u32,

    // --- Safety ---
    /// Command silence after which every valve is forced closed.
    pub watchdog_timeout_ms: u32,

    // --- Link ---
    pub protocol: ProtocolVariant,
    pub baud_rate: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            channel_count: 2,
            channels: [
                ChannelConfig::reference(Valve::Fuel),
                ChannelConfig::reference(Valve::Oxidizer),
            ],

            // YF-S201 class sensors: f(Hz) = 7.5 × Q(L/min)
            pulses_per_liter_per_minute: 7.5,
            sampling_period_ms: 100, // 10 Hz

            watchdog_timeout_ms: 1000,

            protocol: ProtocolVariant::DelimitedDual,
            baud_rate: 115_200,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values.  Nothing is silently clamped: a valve
    /// whose fail-safe position lies outside its own safe range could never
    /// be closed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_count == 0 || self.channel_count as usize > MAX_CHANNELS {
            return Err(ConfigError::ValidationFailed("channel_count must be 1 or 2"));
        }
        for (index, ch) in self.active_channels().iter().enumerate() {
            if ch.valve.index() != index {
                return Err(ConfigError::ValidationFailed("channels out of wire order"));
            }
            if ch.safe_min > ch.safe_max {
                return Err(ConfigError::ValidationFailed("safe_min above safe_max"));
            }
            if !(ch.safe_min..=ch.safe_max).contains(&ch.close_position) {
                return Err(ConfigError::ValidationFailed("close_position outside safe range"));
            }
            if !(ch.safe_min..=ch.safe_max).contains(&ch.open_position) {
                return Err(ConfigError::ValidationFailed("open_position outside safe range"));
            }
        }
        if !self.pulses_per_liter_per_minute.is_finite() || self.pulses_per_liter_per_minute <= 0.0
        {
            return Err(ConfigError::ValidationFailed(
                "pulses_per_liter_per_minute must be positive",
            ));
        }
        if self.sampling_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("sampling_period_ms must be non-zero"));
        }
        if self.watchdog_timeout_ms <= self.sampling_period_ms {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must exceed one sampling period",
            ));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::ValidationFailed("baud_rate must be non-zero"));
        }
        Ok(())
    }

    /// The configured channels, in wire order.
    pub fn active_channels(&self) -> &[ChannelConfig] {
        let count = (self.channel_count as usize).min(MAX_CHANNELS);
        &self.channels[..count]
    }
}

/// Errors from loading or validating a [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The document is not valid JSON for this schema.
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "config malformed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
