//! Mock adapters for integration tests.
//!
//! Records every actuator write and every emitted event so tests can
//! assert on the full history without touching real PWM registers or a
//! UART.

use std::collections::VecDeque;

use valvestand::app::events::AppEvent;
use valvestand::app::ports::{ActuatorPort, EventSink};
use valvestand::config::Valve;
use valvestand::error::ActuatorError;
use valvestand::link::Transport;

// ── MockActuators ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockActuators {
    pub writes: Vec<(Valve, i32)>,
    /// When set, every write is recorded and then reported as failed.
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockActuators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last position written to `valve`.
    pub fn last(&self, valve: Valve) -> Option<i32> {
        self.writes
            .iter()
            .rev()
            .find(|(v, _)| *v == valve)
            .map(|&(_, p)| p)
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }
}

impl ActuatorPort for MockActuators {
    fn write_position(&mut self, valve: Valve, position: i32) -> Result<(), ActuatorError> {
        self.writes.push((valve, position));
        if self.fail_writes {
            Err(ActuatorError::PwmWriteFailed)
        } else {
            Ok(())
        }
    }
}

// ── MockLink ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLink {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    /// Maximum bytes accepted per write; `None` = unlimited.
    pub write_limit: Option<usize>,
    pub fail_writes: bool,
}

#[derive(Debug)]
pub struct LinkDown;

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Telemetry lines written so far, without their newline.
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.tx)
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl Transport for MockLink {
    type Error = LinkDown;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkDown> {
        let n = buf.len().min(self.rx.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.rx.pop_front().unwrap_or(0);
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, LinkDown> {
        if self.fail_writes {
            return Err(LinkDown);
        }
        let n = self.write_limit.map_or(data.len(), |l| l.min(data.len()));
        self.tx.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), LinkDown> {
        Ok(())
    }

    fn available(&self) -> usize {
        self.rx.len()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
