//! Fuzz target: `TelemetryRecord::parse`
//!
//! Feeds arbitrary text to the ground-side record decoder.  It must never
//! panic, and any record it accepts must carry one value per channel in
//! every group.
//!
//! cargo fuzz run fuzz_telemetry_record

#![no_main]

use libfuzzer_sys::fuzz_target;
use valvestand::link::TelemetryRecord;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(rec) = TelemetryRecord::parse(text) {
        assert_eq!(rec.flow_lpm.len(), rec.raw_counts.len());
        assert_eq!(rec.raw_counts.len(), rec.commanded.len());
        assert!(!rec.commanded.is_empty());
    }
});
