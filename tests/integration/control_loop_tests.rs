//! Integration tests for the link → ControlLoop → actuators / telemetry
//! pipeline.
//!
//! These run on the host (x86_64) with mock adapters and local pulse
//! counters, so tests stay independent of the ISR statics.

use crate::mock_hw::{MockActuators, MockLink, RecordingSink};

use valvestand::app::events::AppEvent;
use valvestand::config::{ProtocolVariant, SystemConfig, Valve};
use valvestand::link::TelemetryRecord;
use valvestand::sensors::PulseCounter;
use valvestand::ControlLoop;

const CLOSED: i32 = 115;
const OPEN: i32 = 180;

struct Rig<'a> {
    ctl: ControlLoop<'a>,
    hw: MockActuators,
    link: MockLink,
    sink: RecordingSink,
}

impl<'a> Rig<'a> {
    fn new(config: &SystemConfig, counters: &'a [PulseCounter]) -> Self {
        let mut ctl = ControlLoop::new(config, counters, 0).expect("valid config");
        let mut hw = MockActuators::new();
        let mut sink = RecordingSink::new();
        ctl.start(&mut hw, &mut sink);
        Self {
            ctl,
            hw,
            link: MockLink::new(),
            sink,
        }
    }

    fn tick(&mut self, now_ms: u64) -> Option<valvestand::app::events::TelemetrySnapshot> {
        self.ctl
            .tick(now_ms, &mut self.link, &mut self.hw, &mut self.sink)
    }
}

fn counters() -> [PulseCounter; 2] {
    [PulseCounter::new(), PulseCounter::new()]
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_drives_every_valve_closed() {
    let c = counters();
    let rig = Rig::new(&SystemConfig::default(), &c);

    assert_eq!(rig.hw.writes, vec![(Valve::Fuel, CLOSED), (Valve::Oxidizer, CLOSED)]);
    assert!(matches!(
        rig.sink.events.first(),
        Some(AppEvent::Started { channels: 2 })
    ));
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn delimited_command_positions_each_valve() {
    let c = counters();
    let mut rig = Rig::new(&SystemConfig::default(), &c);

    rig.link.send(b"1,0\n");
    rig.tick(10);
    assert_eq!(rig.hw.last(Valve::Fuel), Some(OPEN));
    assert_eq!(rig.hw.last(Valve::Oxidizer), Some(CLOSED));

    rig.link.send(b"0,1\n");
    rig.tick(20);
    assert_eq!(rig.ctl.commanded(Valve::Fuel), Some(CLOSED));
    assert_eq!(rig.ctl.commanded(Valve::Oxidizer), Some(OPEN));

    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::CommandApplied(_))),
        2
    );
}

#[test]
fn backlog_after_first_frame_is_discarded() {
    let c = counters();
    let mut rig = Rig::new(&SystemConfig::default(), &c);

    rig.link.send(b"1,1\n0,0\n0,0\n");
    rig.tick(10);

    assert_eq!(rig.ctl.commanded(Valve::Fuel), Some(OPEN));
    assert_eq!(rig.ctl.commanded(Valve::Oxidizer), Some(OPEN));
    assert!(rig.link.rx.is_empty(), "stale frames must not replay next poll");

    rig.tick(20);
    assert_eq!(rig.ctl.commanded(Valve::Fuel), Some(OPEN));
}

#[test]
fn malformed_line_changes_nothing() {
    let c = counters();
    let mut rig = Rig::new(&SystemConfig::default(), &c);
    rig.hw.clear();

    rig.link.send(b"abc\n");
    rig.tick(10);

    assert!(rig.hw.writes.is_empty());
    assert_eq!(rig.ctl.rejected_frames(), 1);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::CommandApplied(_))),
        0
    );
}

#[test]
fn malformed_then_valid_in_same_poll() {
    let c = counters();
    let mut rig = Rig::new(&SystemConfig::default(), &c);

    rig.link.send(b"junk\n1,0\n");
    rig.tick(10);

    assert_eq!(rig.ctl.commanded(Valve::Fuel), Some(OPEN));
    assert_eq!(rig.ctl.rejected_frames(), 1);
}

#[test]
fn single_char_variant_drives_both_valves() {
    let c = counters();
    let config = SystemConfig {
        protocol: ProtocolVariant::SingleChar,
        ..SystemConfig::default()
    };
    let mut rig = Rig::new(&config, &c);

    rig.link.send(b"x\r\n1");
    rig.tick(10);
    assert_eq!(rig.ctl.commanded(Valve::Fuel), Some(OPEN));
    assert_eq!(rig.ctl.commanded(Valve::Oxidizer), Some(OPEN));

    rig.link.send(b"0");
    rig.tick(20);
    assert_eq!(rig.ctl.commanded(Valve::Fuel), Some(CLOSED));
    assert_eq!(rig.ctl.commanded(Valve::Oxidizer), Some(CLOSED));
}

#[test]
fn actuator_failure_does_not_stop_the_loop() {
    let c = counters();
    let mut rig = Rig::new(&SystemConfig::default(), &c);
    rig.hw.fail_writes = true;

    rig.link.send(b"1,1\n");
    rig.tick(10);
    assert_eq!(rig.ctl.commanded(Valve::Fuel), Some(OPEN));

    let snap = rig.tick(100).expect("telemetry due");
    assert_eq!(snap.commanded.as_slice(), &[OPEN, OPEN]);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn one_record_per_sampling_period() {
    let c = counters();
    let mut rig = Rig::new(&SystemConfig::default(), &c);

    for now in (10..=300).step_by(10) {
        rig.link.send(b"0,0\n");
        rig.tick(now);
    }

    let lines = rig.link.lines();
    assert_eq!(lines.len(), 3);
    for line in &lines {
        assert_eq!(line.split(',').count(), 8, "bad record: {line}");
    }
    assert!(lines[0].starts_with("0.100,"));
    assert!(lines[2].starts_with("0.300,"));
}

#[test]
fn record_carries_flow_counts_and_positions() {
    let c = counters();
    let mut rig = Rig::new(&SystemConfig::default(), &c);

    rig.link.send(b"1,0\n");
    rig.tick(10);
    for _ in 0..12 {
        c[0].on_edge();
    }
    for _ in 0..3 {
        c[1].on_edge();
    }
    let snap = rig.tick(100).expect("telemetry due");

    assert_eq!(snap.flows[0].raw_count, 12);
    assert!((snap.flows[0].rate_lpm - 16.0).abs() < 1e-4);
    assert!((snap.flows[1].rate_lpm - 4.0).abs() < 1e-4);

    let rec = TelemetryRecord::parse(&rig.link.lines()[0]).expect("decodable");
    assert_eq!(rec.raw_counts.as_slice(), &[12, 3]);
    assert_eq!(rec.commanded.as_slice(), &[OPEN, CLOSED]);
    assert!(!rec.tripped);

    // Drained: the next period starts from zero.
    let snap = rig.tick(200).expect("telemetry due");
    assert_eq!(snap.flows[0].raw_count, 0);
}

#[test]
fn late_iteration_merges_periods() {
    let c = counters();
    let mut rig = Rig::new(&SystemConfig::default(), &c);

    assert!(rig.tick(350).is_some());
    assert_eq!(rig.ctl.skipped_periods(), 2);
    assert!(rig.tick(399).is_none());
    assert!(rig.tick(400).is_some());
}

#[test]
fn refused_write_counts_as_drop() {
    let c = counters();
    let mut rig = Rig::new(&SystemConfig::default(), &c);
    rig.link.fail_writes = true;

    assert!(rig.tick(100).is_some());
    assert_eq!(rig.ctl.dropped_records(), 1);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::TelemetryDropped { total_dropped: 1 }
    )));
}

#[test]
fn short_write_counts_as_drop() {
    let c = counters();
    let mut rig = Rig::new(&SystemConfig::default(), &c);
    rig.link.write_limit = Some(5);

    rig.tick(100);
    assert_eq!(rig.ctl.dropped_records(), 1);
}

#[test]
fn single_channel_stand_sends_five_fields() {
    let c = [PulseCounter::new()];
    let config = SystemConfig {
        channel_count: 1,
        ..SystemConfig::default()
    };
    let mut rig = Rig::new(&config, &c);

    rig.link.send(b"1\n");
    rig.tick(10);
    rig.tick(100);

    let lines = rig.link.lines();
    assert_eq!(lines[0].split(',').count(), 5);
    assert_eq!(rig.hw.last(Valve::Oxidizer), None);
}
