//! Outbound application events.
//!
//! The [`ControlLoop`](super::service::ControlLoop) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  The telemetry wire record
//! goes out on the command link regardless; the sink is for operators and
//! logs.

use heapless::Vec;

use crate::config::MAX_CHANNELS;
use crate::sensors::FlowSample;

use super::commands::CommandFrame;

/// Structured events emitted by the control loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Control loop started; every valve has been driven to its fail-safe.
    Started { channels: usize },

    /// A valid frame was applied to the valves.
    CommandApplied(CommandFrame),

    /// Command silence exceeded the timeout; valves forced closed.
    WatchdogTripped { silent_ms: u64 },

    /// A valid frame arrived after a trip; normal command flow resumed.
    WatchdogRearmed,

    /// Per-period telemetry snapshot.
    Telemetry(TelemetrySnapshot),

    /// The link refused a telemetry record.
    TelemetryDropped { total_dropped: u32 },
}

/// Everything published for one sampling period.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    /// Milliseconds since boot.
    pub timestamp_ms: u64,
    /// One sample per active channel, in wire order.
    pub flows: Vec<FlowSample, MAX_CHANNELS>,
    /// Last commanded position per active channel, in wire order.
    pub commanded: Vec<i32, MAX_CHANNELS>,
    /// Watchdog is holding the valves closed.
    pub tripped: bool,
}
