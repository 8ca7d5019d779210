//! Application core: pure domain logic, zero I/O.
//!
//! The control loop composes the valve channels, flow sampler, command
//! parser, communication watchdog and telemetry encoder.  All interaction
//! with hardware happens through **port traits** defined in [`ports`] and
//! the link [`Transport`](crate::link::transport::Transport), keeping this
//! layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
