//! Valve stand firmware library.
//!
//! Two-valve propellant test-stand controller: flow-sensor pulse
//! accounting, clamped valve actuation, a serial command link guarded by a
//! fail-safe comms watchdog, and per-period CSV telemetry.
//!
//! Exposes the pure-logic modules for host testing.  All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod link;
pub mod pins;
pub mod safety;
pub mod sensors;

pub mod adapters;
pub mod drivers;

pub use app::service::ControlLoop;
pub use config::SystemConfig;
pub use error::{Error, Result};
