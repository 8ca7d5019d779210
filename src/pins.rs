//! GPIO / peripheral pin assignments for the valve stand controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Arrays are indexed by
//! [`Valve::index`](crate::config::Valve::index) (fuel = 0, oxidizer = 1).

use crate::config::MAX_CHANNELS;

// ---------------------------------------------------------------------------
// Valve servos (hobby servo on each ball valve)
// ---------------------------------------------------------------------------

/// LEDC PWM output per valve servo.
pub const SERVO_GPIOS: [i32; MAX_CHANNELS] = [4, 5];

// ---------------------------------------------------------------------------
// Flow sensors (hall-effect, open-collector pulse output)
// ---------------------------------------------------------------------------

/// Pulse input per flow sensor, falling-edge interrupt.
pub const FLOW_GPIOS: [i32; MAX_CHANNELS] = [6, 7];

// ---------------------------------------------------------------------------
// Ground-control link (UART1 through the USB-serial bridge)
// ---------------------------------------------------------------------------

pub const LINK_TX_GPIO: i32 = 17;
pub const LINK_RX_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// Servo PWM configuration
// ---------------------------------------------------------------------------

/// Standard hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC duty resolution for the servo timer.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
/// Frame period at [`SERVO_PWM_FREQ_HZ`].
pub const SERVO_PERIOD_US: u32 = 1_000_000 / SERVO_PWM_FREQ_HZ;
/// Pulse width at 0°.
pub const SERVO_MIN_PULSE_US: u32 = 500;
/// Pulse width at 180°.
pub const SERVO_MAX_PULSE_US: u32 = 2_500;
/// Full mechanical travel.
pub const SERVO_MAX_DEGREES: i32 = 180;
