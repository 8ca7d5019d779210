//! Sensor subsystem.
//!
//! Only flow sensing lives here: pulse counters written from interrupt
//! context and the [`flow::FlowSampler`] that drains them each period.

pub mod flow;

pub use flow::{FLOW_PULSES, FlowSample, FlowSampler, PulseCounter};
