//! Actuator control.

pub mod actuator;

pub use actuator::{SafeRange, ValveChannel};
