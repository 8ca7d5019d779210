//! Hall-effect flow sensor pulse accounting.
//!
//! Each sensor raises a falling edge per rotor pulse.  The edge ISR
//! increments the channel's [`PulseCounter`]; the control loop drains every
//! counter once per sampling period and turns the count into L/min.
//!
//! The ISR and the control loop run in different execution contexts, so the
//! counter is an `AtomicU32` and the drain is a single `swap(0)`: an edge
//! lands either before the swap (counted in this sample) or after it
//! (counted in the next), never in between.

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::Vec;

use crate::config::MAX_CHANNELS;

/// Per-channel pulse accumulator shared with interrupt context.
#[derive(Debug)]
pub struct PulseCounter {
    count: AtomicU32,
}

impl PulseCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Record one sensor edge.  ISR-safe: no blocking, no allocation.
    /// Wraps at `u32::MAX`, far beyond any count within one period.
    #[inline]
    pub fn on_edge(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Atomically take the accumulated count and reset it to zero.
    pub fn drain(&self) -> u32 {
        self.count.swap(0, Ordering::AcqRel)
    }

    /// Current count without resetting (diagnostics only).
    pub fn pending(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters written by the GPIO ISRs, indexed by [`Valve::index`](crate::config::Valve::index).
/// `static` because ISR callbacks in ESP-IDF cannot capture closures.
pub static FLOW_PULSES: [PulseCounter; MAX_CHANNELS] = [const { PulseCounter::new() }; MAX_CHANNELS];

/// Called from the GPIO ISR of flow sensor `channel`.
pub fn flow_isr_handler(channel: usize) {
    if let Some(counter) = FLOW_PULSES.get(channel) {
        counter.on_edge();
    }
}

/// One channel's flow over one sampling period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSample {
    /// Milliseconds since boot at the end of the period.
    pub timestamp_ms: u64,
    /// Flow rate (L/min).
    pub rate_lpm: f32,
    /// Pulses counted in the period.
    pub raw_count: u32,
}

/// `raw_count` pulses over `period_ms` → L/min, given the sensor constant
/// in Hz per L/min.
pub fn flow_rate_lpm(raw_count: u32, period_ms: u32, pulses_per_liter_per_minute: f32) -> f32 {
    let frequency_hz = raw_count as f32 * (1000.0 / period_ms as f32);
    frequency_hz / pulses_per_liter_per_minute
}

/// Drains every active pulse counter once per sampling period.
pub struct FlowSampler<'a> {
    counters: &'a [PulseCounter],
    period_ms: u32,
    pulses_per_liter_per_minute: f32,
}

impl<'a> FlowSampler<'a> {
    /// `counters` holds one counter per active channel, in wire order.
    pub fn new(counters: &'a [PulseCounter], period_ms: u32, pulses_per_liter_per_minute: f32) -> Self {
        Self {
            counters: &counters[..counters.len().min(MAX_CHANNELS)],
            period_ms,
            pulses_per_liter_per_minute,
        }
    }

    /// Drain all channels in one pass and compute their flow rates.
    pub fn sample(&self, now_ms: u64) -> Vec<FlowSample, MAX_CHANNELS> {
        let mut samples = Vec::new();
        for counter in self.counters {
            let raw_count = counter.drain();
            // Capacity equals MAX_CHANNELS and counters is truncated to it.
            let _ = samples.push(FlowSample {
                timestamp_ms: now_ms,
                rate_lpm: flow_rate_lpm(raw_count, self.period_ms, self.pulses_per_liter_per_minute),
                raw_count,
            });
        }
        samples
    }

    /// Drain every channel without sampling; returns the pulses dropped.
    pub fn discard(&self) -> u32 {
        self.counters
            .iter()
            .fold(0u32, |total, counter| total.saturating_add(counter.drain()))
    }
}
