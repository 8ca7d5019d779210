//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Driven adapters (actuators, event sinks) implement these traits.  The
//! [`ControlLoop`](super::service::ControlLoop) consumes them via generics,
//! so the domain core never touches hardware directly.  The byte link has
//! its own port, [`Transport`](crate::link::transport::Transport).

use crate::config::Valve;
use crate::error::ActuatorError;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to position a valve actuator.
///
/// Positions arrive already clamped to the channel's safe range.  A
/// failure is reported back but the domain defines no recovery beyond
/// logging; the next command or watchdog pass re-drives the actuator.
pub trait ActuatorPort {
    fn write_position(&mut self, valve: Valve, position: i32) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
