//! Telemetry pacing.
//!
//! The `TelemetryStream` decides when a sampling period has elapsed and
//! keeps the backpressure counters.  Deadlines advance on a fixed grid from
//! start-up, so a late loop iteration does not shift every later sample; if
//! an iteration overran one or more whole periods, those are counted as
//! skipped and a single record covers them.

pub struct TelemetryStream {
    period_ms: u64,
    next_due_ms: u64,
    /// Periods with no record because the loop ran late.
    skipped_periods: u32,
    /// Records the transport refused or only partly accepted.
    dropped_count: u32,
}

impl TelemetryStream {
    pub fn new(period_ms: u32, start_ms: u64) -> Self {
        let period_ms = u64::from(period_ms.max(1));
        Self {
            period_ms,
            next_due_ms: start_ms + period_ms,
            skipped_periods: 0,
            dropped_count: 0,
        }
    }

    /// Returns `true` once per elapsed period.
    pub fn due(&mut self, now_ms: u64) -> bool {
        if now_ms < self.next_due_ms {
            return false;
        }
        let missed = (now_ms - self.next_due_ms) / self.period_ms;
        self.skipped_periods = self
            .skipped_periods
            .saturating_add(u32::try_from(missed).unwrap_or(u32::MAX));
        self.next_due_ms += (missed + 1) * self.period_ms;
        true
    }

    /// Record a dropped frame (transport couldn't keep up).
    pub fn record_drop(&mut self) {
        self.dropped_count = self.dropped_count.saturating_add(1);
    }

    pub fn dropped_count(&self) -> u32 {
        self.dropped_count
    }

    pub fn skipped_periods(&self) -> u32 {
        self.skipped_periods
    }

    pub fn next_due_ms(&self) -> u64 {
        self.next_due_ms
    }
}
