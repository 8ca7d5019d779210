//! Control loop: the hexagonal core.
//!
//! [`ControlLoop`] owns the valve channels, the comms watchdog, the command
//! parser and the flow sampler.  All I/O flows through the port traits and
//! the [`Transport`] injected at call sites, so the whole loop runs against
//! mocks on the host.
//!
//! ```text
//!   Transport ──▶ ┌──────────────────────────┐ ──▶ Transport (telemetry)
//!                 │       ControlLoop         │
//! ActuatorPort ◀──│ parser · watchdog · flow  │ ──▶ EventSink
//!                 └──────────────────────────┘
//!                         ▲
//!                  PulseCounter (ISR)
//! ```
//!
//! ## Iteration order
//!
//! 1. Poll the link; a valid frame is applied and refreshes the watchdog.
//! 2. Check the watchdog.
//! 3. While tripped, close every valve (every iteration, not only on the
//!    transition).
//! 4. When a sampling period has elapsed: drain the counters, build the
//!    snapshot, write one telemetry record.

use heapless::Vec;
use log::{debug, info};

use crate::config::{MAX_CHANNELS, SystemConfig, Valve};
use crate::control::ValveChannel;
use crate::error::{ConfigError, Error};
use crate::link::{CommandParser, TelemetryStream, Transport, encode_record};
use crate::safety::{CommsWatchdog, WatchdogState, WatchdogTransition};
use crate::sensors::{FlowSampler, PulseCounter};

use super::commands::CommandFrame;
use super::events::{AppEvent, TelemetrySnapshot};
use super::ports::{ActuatorPort, EventSink};

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

pub struct ControlLoop<'a> {
    channels: Vec<ValveChannel, MAX_CHANNELS>,
    sampler: FlowSampler<'a>,
    parser: CommandParser,
    watchdog: CommsWatchdog,
    stream: TelemetryStream,
    iterations: u64,
}

impl<'a> ControlLoop<'a> {
    /// Build the loop from configuration.
    ///
    /// `counters` must hold at least one counter per active channel, in wire
    /// order.  Does **not** touch the actuators; call [`start`](Self::start)
    /// next.
    pub fn new(
        config: &SystemConfig,
        counters: &'a [PulseCounter],
        now_ms: u64,
    ) -> Result<Self, Error> {
        config.validate()?;
        let active = config.active_channels();
        if counters.len() < active.len() {
            return Err(ConfigError::ValidationFailed("fewer pulse counters than channels").into());
        }

        let mut channels = Vec::new();
        for cfg in active {
            // active_channels() is bounded by MAX_CHANNELS.
            let _ = channels.push(ValveChannel::new(cfg));
        }

        Ok(Self {
            channels,
            sampler: FlowSampler::new(
                &counters[..active.len()],
                config.sampling_period_ms,
                config.pulses_per_liter_per_minute,
            ),
            parser: CommandParser::new(config.protocol, active.len()),
            watchdog: CommsWatchdog::new(config.watchdog_timeout_ms, now_ms),
            stream: TelemetryStream::new(config.sampling_period_ms, now_ms),
            iterations: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every valve to its fail-safe position and announce start-up.
    ///
    /// Pulses counted before this call are discarded so the first record
    /// covers only its own sampling period.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.close_all(hw);
        let stale = self.sampler.discard();
        if stale > 0 {
            debug!("discarded {} pulse(s) counted before start", stale);
        }
        sink.emit(&AppEvent::Started {
            channels: self.channels.len(),
        });
        info!(
            "control loop started: {} channel(s), {:?}, watchdog {} ms",
            self.channels.len(),
            self.parser.variant(),
            self.watchdog.timeout_ms()
        );
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one loop iteration.  Never blocks.
    ///
    /// Returns the telemetry snapshot when a sampling period elapsed during
    /// this iteration.
    pub fn tick<T: Transport>(
        &mut self,
        now_ms: u64,
        link: &mut T,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Option<TelemetrySnapshot> {
        self.iterations += 1;

        // 1. Inbound commands
        if let Some(frame) = self.parser.poll(link) {
            self.handle_frame(frame, now_ms, hw, sink);
        }

        // 2. Watchdog
        match self.watchdog.check(now_ms) {
            WatchdogTransition::Tripped { silent_ms } => {
                sink.emit(&AppEvent::WatchdogTripped { silent_ms });
            }
            WatchdogTransition::Rearmed => sink.emit(&AppEvent::WatchdogRearmed),
            WatchdogTransition::None => {}
        }

        // 3. Fail-safe override
        if self.watchdog.is_tripped() {
            self.close_all(hw);
        }

        // 4. Flow sampling and telemetry
        if !self.stream.due(now_ms) {
            return None;
        }
        let snapshot = self.build_snapshot(now_ms);
        self.publish(&snapshot, link, sink);
        Some(snapshot)
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply one valid frame and refresh the watchdog.
    ///
    /// A frame arriving while tripped is applied as well; the watchdog
    /// re-arms on the check that follows in the same iteration.
    pub fn handle_frame(
        &mut self,
        frame: CommandFrame,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        self.watchdog.refresh(now_ms);
        for (index, channel) in self.channels.iter_mut().enumerate() {
            if let Some(cmd) = frame.command_for(index) {
                let position = channel.apply(cmd, hw);
                debug!("{} valve -> {} ({:?})", channel.valve().label(), position, cmd);
            }
        }
        sink.emit(&AppEvent::CommandApplied(frame));
    }

    // ── Queries ───────────────────────────────────────────────

    /// Last commanded position of `valve`, if it is an active channel.
    pub fn commanded(&self, valve: Valve) -> Option<i32> {
        self.channels.get(valve.index()).map(ValveChannel::commanded)
    }

    /// All channels, in wire order.
    pub fn channels(&self) -> &[ValveChannel] {
        &self.channels
    }

    pub fn is_tripped(&self) -> bool {
        self.watchdog.is_tripped()
    }

    pub fn watchdog_state(&self) -> WatchdogState {
        self.watchdog.state()
    }

    /// Loop iterations executed since start-up.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Malformed command lines dropped since start-up.
    pub fn rejected_frames(&self) -> u32 {
        self.parser.rejected_count()
    }

    /// Telemetry records the link refused.
    pub fn dropped_records(&self) -> u32 {
        self.stream.dropped_count()
    }

    /// Sampling periods merged into a later record because the loop ran late.
    pub fn skipped_periods(&self) -> u32 {
        self.stream.skipped_periods()
    }

    // ── Internal ──────────────────────────────────────────────

    fn close_all(&mut self, hw: &mut impl ActuatorPort) {
        for channel in self.channels.iter_mut() {
            channel.close(hw);
        }
    }

    fn build_snapshot(&self, now_ms: u64) -> TelemetrySnapshot {
        let mut commanded = Vec::new();
        for channel in &self.channels {
            let _ = commanded.push(channel.commanded());
        }
        TelemetrySnapshot {
            timestamp_ms: now_ms,
            flows: self.sampler.sample(now_ms),
            commanded,
            tripped: self.watchdog.is_tripped(),
        }
    }

    /// Write one record; a failed or short write counts as a drop.
    fn publish<T: Transport>(
        &mut self,
        snapshot: &TelemetrySnapshot,
        link: &mut T,
        sink: &mut impl EventSink,
    ) {
        let delivered = match encode_record(snapshot) {
            Ok(line) => match link.write(line.as_bytes()) {
                Ok(n) if n == line.len() => {
                    if let Err(e) = link.flush() {
                        debug!("telemetry flush failed: {:?}", e);
                    }
                    true
                }
                Ok(n) => {
                    debug!("telemetry short write: {} of {} bytes", n, line.len());
                    false
                }
                Err(e) => {
                    debug!("telemetry write failed: {:?}", e);
                    false
                }
            },
            Err(_) => false,
        };

        sink.emit(&AppEvent::Telemetry(snapshot.clone()));
        if !delivered {
            self.stream.record_drop();
            sink.emit(&AppEvent::TelemetryDropped {
                total_dropped: self.stream.dropped_count(),
            });
        }
    }
}
