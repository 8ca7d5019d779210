//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to the USB-CDC console in production,
//! separate from the ground-control UART).

use log::{debug, info, warn};

use crate::app::commands::CommandFrame;
use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let (fuel, oxi) = (t.flows.first(), t.flows.get(1));
                info!(
                    "TELEM | t={}ms | fuel={:.2}L/min ({}) oxi={:.2}L/min ({}) | cmd={:?} | tripped={}",
                    t.timestamp_ms,
                    fuel.map_or(0.0, |s| s.rate_lpm),
                    fuel.map_or(0, |s| s.raw_count),
                    oxi.map_or(0.0, |s| s.rate_lpm),
                    oxi.map_or(0, |s| s.raw_count),
                    t.commanded.as_slice(),
                    t.tripped,
                );
            }
            AppEvent::CommandApplied(frame) => match frame {
                CommandFrame::SetPositions(cmds) => debug!("CMD | positions={:?}", cmds.as_slice()),
                CommandFrame::SetSingle(cmd) => debug!("CMD | all={:?}", cmd),
            },
            AppEvent::WatchdogTripped { silent_ms } => {
                warn!("WDOG | tripped after {} ms silence, valves closed", silent_ms);
            }
            AppEvent::WatchdogRearmed => {
                info!("WDOG | re-armed");
            }
            AppEvent::TelemetryDropped { total_dropped } => {
                warn!("TELEM | record dropped (total {})", total_dropped);
            }
            AppEvent::Started { channels } => {
                info!("START | channels={} valves closed", channels);
            }
        }
    }
}
