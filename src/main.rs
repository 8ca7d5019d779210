//! Valve stand firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                    │
//! │                                                            │
//! │  ValveHardware   LogEventSink   UartTransport   Clock      │
//! │  (ActuatorPort)  (EventSink)    (Transport)                │
//! │                                                            │
//! │  ─────────────── Port Trait Boundary ──────────────────    │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │          ControlLoop (pure logic)                     │  │
//! │  │  parser · watchdog · valves · flow · telemetry       │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │                          ▲                                 │
//! │            FLOW_PULSES ◀─┘ GPIO ISR (falling edge)         │
//! └────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::peripherals::Peripherals;

use valvestand::adapters::uart::UartTransport;
use valvestand::adapters::{LogEventSink, MonotonicClock, ValveHardware};
use valvestand::drivers::hw_init;
use valvestand::pins;
use valvestand::sensors::FLOW_PULSES;
use valvestand::{ControlLoop, SystemConfig};

/// Stand configuration baked in at build time.
const STAND_CONFIG: &str = include_str!("../config/stand.json");

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("valvestand v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = match SystemConfig::from_json(STAND_CONFIG) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("stand config rejected ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    let active = config.active_channels();

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let servos = hw_init::init_servo_pwm(active.len())?;
    let mut hw = ValveHardware::new(servos);
    hw_init::init_flow_inputs(active)?;

    // SAFETY: the link pins are claimed nowhere else; pins.rs keeps them
    // distinct from the servo and flow GPIOs.
    let (tx, rx) = unsafe {
        (
            AnyIOPin::new(pins::LINK_TX_GPIO),
            AnyIOPin::new(pins::LINK_RX_GPIO),
        )
    };
    let mut link = UartTransport::new(peripherals.uart1, tx, rx, config.baud_rate)?;

    // ── 4. Control loop ───────────────────────────────────────
    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();
    let mut control = ControlLoop::new(&config, &FLOW_PULSES, clock.uptime_ms())?;
    control.start(&mut hw, &mut sink);

    loop {
        control.tick(clock.uptime_ms(), &mut link, &mut hw, &mut sink);
        // Yield one tick so the idle task can feed the task watchdog.
        FreeRtos::delay_ms(1);
    }
}
