//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements   | Connects to                  |
//! |-------------|--------------|------------------------------|
//! | `hardware`  | ActuatorPort | Valve servos (LEDC PWM)      |
//! | `log_sink`  | EventSink    | Serial log output            |
//! | `time`      | (clock)      | ESP32 system timer           |
//! | `uart`      | Transport    | Ground-control UART link     |

pub mod hardware;
pub mod log_sink;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod uart;

pub use hardware::ValveHardware;
pub use log_sink::LogEventSink;
pub use time::MonotonicClock;
