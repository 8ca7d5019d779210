//! Integration tests for the comms watchdog fail-safe.
//!
//! Drive the full control loop with a scripted link and assert that
//! command silence closes every valve, keeps them closed on every
//! iteration, and that only a valid frame restores command flow.

use crate::mock_hw::{MockActuators, MockLink, RecordingSink};

use valvestand::app::events::AppEvent;
use valvestand::config::{ProtocolVariant, SystemConfig, Valve};
use valvestand::safety::WatchdogState;
use valvestand::sensors::PulseCounter;
use valvestand::ControlLoop;

const CLOSED: i32 = 115;
const OPEN: i32 = 180;

fn setup<'a>(
    config: &SystemConfig,
    counters: &'a [PulseCounter],
) -> (ControlLoop<'a>, MockActuators, MockLink, RecordingSink) {
    let mut ctl = ControlLoop::new(config, counters, 0).expect("valid config");
    let mut hw = MockActuators::new();
    let mut sink = RecordingSink::new();
    ctl.start(&mut hw, &mut sink);
    (ctl, hw, MockLink::new(), sink)
}

#[test]
fn silent_link_trips_one_timeout_after_boot() {
    let c = [PulseCounter::new(), PulseCounter::new()];
    let config = SystemConfig::default();
    let (mut ctl, mut hw, mut link, mut sink) = setup(&config, &c);

    ctl.tick(1000, &mut link, &mut hw, &mut sink);
    assert!(!ctl.is_tripped());

    ctl.tick(1001, &mut link, &mut hw, &mut sink);
    assert!(ctl.is_tripped());
    assert_eq!(ctl.watchdog_state(), WatchdogState::Tripped);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::WatchdogTripped { silent_ms: 1001 }
    )));
}

#[test]
fn open_valves_close_after_timeout() {
    let c = [PulseCounter::new(), PulseCounter::new()];
    let config = SystemConfig::default();
    let (mut ctl, mut hw, mut link, mut sink) = setup(&config, &c);

    link.send(b"1,1\n");
    ctl.tick(500, &mut link, &mut hw, &mut sink);
    assert_eq!(hw.last(Valve::Fuel), Some(OPEN));

    ctl.tick(1500, &mut link, &mut hw, &mut sink);
    assert!(!ctl.is_tripped(), "exactly timeout is not yet silence");

    ctl.tick(1501, &mut link, &mut hw, &mut sink);
    assert_eq!(hw.last(Valve::Fuel), Some(CLOSED));
    assert_eq!(hw.last(Valve::Oxidizer), Some(CLOSED));
}

#[test]
fn tripped_loop_closes_on_every_iteration() {
    let c = [PulseCounter::new(), PulseCounter::new()];
    let config = SystemConfig::default();
    let (mut ctl, mut hw, mut link, mut sink) = setup(&config, &c);

    ctl.tick(1001, &mut link, &mut hw, &mut sink);
    for now in 1002..1012 {
        hw.clear();
        ctl.tick(now, &mut link, &mut hw, &mut sink);
        assert_eq!(
            hw.writes,
            vec![(Valve::Fuel, CLOSED), (Valve::Oxidizer, CLOSED)],
            "close must be re-issued at t={now}"
        );
    }
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::WatchdogTripped { .. })),
        1,
        "transition is reported once"
    );
}

#[test]
fn malformed_frames_do_not_hold_valves_open() {
    let c = [PulseCounter::new(), PulseCounter::new()];
    let config = SystemConfig::default();
    let (mut ctl, mut hw, mut link, mut sink) = setup(&config, &c);

    link.send(b"1,1\n");
    ctl.tick(0, &mut link, &mut hw, &mut sink);

    for now in [300, 600, 900] {
        link.send(b"1;1\n");
        ctl.tick(now, &mut link, &mut hw, &mut sink);
    }
    link.send(b"abc\n");
    ctl.tick(1001, &mut link, &mut hw, &mut sink);

    assert!(ctl.is_tripped());
    assert_eq!(ctl.commanded(Valve::Fuel), Some(CLOSED));
    assert_eq!(ctl.commanded(Valve::Oxidizer), Some(CLOSED));
}

#[test]
fn valid_frame_rearms_and_applies() {
    let c = [PulseCounter::new(), PulseCounter::new()];
    let config = SystemConfig::default();
    let (mut ctl, mut hw, mut link, mut sink) = setup(&config, &c);

    ctl.tick(2000, &mut link, &mut hw, &mut sink);
    assert!(ctl.is_tripped());

    link.send(b"1,0\n");
    ctl.tick(2050, &mut link, &mut hw, &mut sink);

    assert!(!ctl.is_tripped());
    assert_eq!(ctl.commanded(Valve::Fuel), Some(OPEN));
    assert_eq!(ctl.commanded(Valve::Oxidizer), Some(CLOSED));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::WatchdogRearmed)), 1);
}

#[test]
fn heartbeat_keeps_watchdog_armed() {
    let c = [PulseCounter::new(), PulseCounter::new()];
    let config = SystemConfig::default();
    let (mut ctl, mut hw, mut link, mut sink) = setup(&config, &c);

    for now in (0..10_000).step_by(100) {
        link.send(b"1,1\n");
        ctl.tick(now, &mut link, &mut hw, &mut sink);
        assert!(!ctl.is_tripped(), "tripped at t={now}");
    }
    assert_eq!(ctl.commanded(Valve::Fuel), Some(OPEN));
}

#[test]
fn wide_integer_frame_refreshes_watchdog() {
    let c = [PulseCounter::new(), PulseCounter::new()];
    let config = SystemConfig::default();
    let (mut ctl, mut hw, mut link, mut sink) = setup(&config, &c);

    link.send(b"10000000000,0\n");
    ctl.tick(900, &mut link, &mut hw, &mut sink);
    assert_eq!(ctl.commanded(Valve::Fuel), Some(OPEN));
    assert_eq!(ctl.commanded(Valve::Oxidizer), Some(CLOSED));

    ctl.tick(1500, &mut link, &mut hw, &mut sink);
    assert!(!ctl.is_tripped());
}

#[test]
fn telemetry_reports_tripped_flag() {
    let c = [PulseCounter::new(), PulseCounter::new()];
    let config = SystemConfig::default();
    let (mut ctl, mut hw, mut link, mut sink) = setup(&config, &c);

    let before = ctl.tick(900, &mut link, &mut hw, &mut sink).expect("due");
    assert!(!before.tripped);

    ctl.tick(1001, &mut link, &mut hw, &mut sink);
    let after = ctl.tick(1100, &mut link, &mut hw, &mut sink).expect("due");
    assert!(after.tripped);
    assert!(link.lines().last().is_some_and(|l| l.ends_with(",1")));
}

#[test]
fn ignored_single_char_bytes_do_not_refresh() {
    let c = [PulseCounter::new(), PulseCounter::new()];
    let config = SystemConfig {
        protocol: ProtocolVariant::SingleChar,
        ..SystemConfig::default()
    };
    let (mut ctl, mut hw, mut link, mut sink) = setup(&config, &c);

    link.send(b"1");
    ctl.tick(0, &mut link, &mut hw, &mut sink);
    for now in [400, 800] {
        link.send(b"xyz\n");
        ctl.tick(now, &mut link, &mut hw, &mut sink);
    }
    ctl.tick(1001, &mut link, &mut hw, &mut sink);
    assert!(ctl.is_tripped());
}
