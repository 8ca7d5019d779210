//! Telemetry record encoder and decoder.
//!
//! One newline-terminated CSV line per sampling period.  Field order is the
//! wire contract with the ground-control plotter and must not change:
//!
//! ```text
//! timestamp_s, flow_fuel, flow_oxi, raw_fuel, raw_oxi, cmd_fuel, cmd_oxi, tripped
//! 12.300,16.00,0.00,12,0,180,115,0
//! ```
//!
//! Each group (flows, raw counts, commanded positions) holds one field per
//! active channel, so a single-channel stand sends 5 fields and the
//! two-channel stand always sends 8.

use core::fmt::{self, Write};

use heapless::{String, Vec};

use crate::app::events::TelemetrySnapshot;
use crate::config::MAX_CHANNELS;

/// Capacity of one encoded record, newline included.
pub const MAX_RECORD_LEN: usize = 128;

/// Field count for `channels` active channels.
pub const fn field_count(channels: usize) -> usize {
    2 + 3 * channels
}

/// Serialize one snapshot into a CSV line.
pub fn encode_record(snap: &TelemetrySnapshot) -> Result<String<MAX_RECORD_LEN>, fmt::Error> {
    let mut out = String::new();
    write!(out, "{}.{:03}", snap.timestamp_ms / 1000, snap.timestamp_ms % 1000)?;
    for flow in &snap.flows {
        write!(out, ",{:.2}", flow.rate_lpm)?;
    }
    for flow in &snap.flows {
        write!(out, ",{}", flow.raw_count)?;
    }
    for position in &snap.commanded {
        write!(out, ",{}", position)?;
    }
    writeln!(out, ",{}", u8::from(snap.tripped))?;
    Ok(out)
}

/// One decoded record, as seen by the ground station.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub timestamp_s: f64,
    pub flow_lpm: Vec<f64, MAX_CHANNELS>,
    pub raw_counts: Vec<u32, MAX_CHANNELS>,
    pub commanded: Vec<i32, MAX_CHANNELS>,
    pub tripped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    /// Field count does not match any supported channel count.
    FieldCount(usize),
    /// A numeric field failed to parse; carries the field name.
    BadNumber(&'static str),
    /// The tripped flag was not `0` or `1`.
    BadFlag,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldCount(n) => write!(f, "unexpected number of values: {n}"),
            Self::BadNumber(field) => write!(f, "{field} parse error"),
            Self::BadFlag => write!(f, "tripped flag must be 0 or 1"),
        }
    }
}

impl TelemetryRecord {
    /// Decode one line (trailing newline optional).
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let line = line.trim();
        let fields: Vec<&str, { field_count(MAX_CHANNELS) }> = line
            .split(',')
            .try_fold(Vec::new(), |mut acc, f| acc.push(f).map(|()| acc))
            .map_err(|_| RecordError::FieldCount(line.split(',').count()))?;

        let n = fields.len();
        let channels = (1..=MAX_CHANNELS)
            .find(|&c| field_count(c) == n)
            .ok_or(RecordError::FieldCount(n))?;

        let timestamp_s: f64 = fields[0]
            .trim()
            .parse()
            .map_err(|_| RecordError::BadNumber("time"))?;

        let mut flow_lpm = Vec::new();
        let mut raw_counts = Vec::new();
        let mut commanded = Vec::new();
        for ch in 0..channels {
            let flow: f64 = fields[1 + ch]
                .trim()
                .parse()
                .map_err(|_| RecordError::BadNumber("flow"))?;
            let raw: u32 = fields[1 + channels + ch]
                .trim()
                .parse()
                .map_err(|_| RecordError::BadNumber("pulse"))?;
            let pos: i32 = fields[1 + 2 * channels + ch]
                .trim()
                .parse()
                .map_err(|_| RecordError::BadNumber("pos"))?;
            // Capacity is MAX_CHANNELS and channels <= MAX_CHANNELS.
            let _ = flow_lpm.push(flow);
            let _ = raw_counts.push(raw);
            let _ = commanded.push(pos);
        }

        let tripped = match fields[n - 1].trim() {
            "0" => false,
            "1" => true,
            _ => return Err(RecordError::BadFlag),
        };

        Ok(Self {
            timestamp_s,
            flow_lpm,
            raw_counts,
            commanded,
            tripped,
        })
    }
}
