//! Communication watchdog.
//!
//! The watchdog runs **every loop iteration after command parsing** and
//! decides whether the valves may follow commands or must be held closed.
//!
//! ## Lifecycle
//!
//! 1. Boot: `Armed`, with the last-command time set to boot time, so a
//!    stand that never hears from ground control trips exactly one timeout
//!    after power-on.
//! 2. A valid command frame calls [`CommsWatchdog::refresh`].
//! 3. [`CommsWatchdog::check`] trips once `now - last_command > timeout`.
//! 4. While `Tripped`, the control loop closes every valve on every
//!    iteration, not only on the transition, so a stale open command can
//!    never re-assert itself.
//! 5. The first check after a refresh re-arms.
//!
//! Malformed frames never refresh, so garbage on the link cannot hold the
//! valves open.

use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Armed,
    Tripped,
}

/// Result of one [`CommsWatchdog::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogTransition {
    None,
    /// Armed → Tripped; carries the command silence that caused it.
    Tripped { silent_ms: u64 },
    /// Tripped → Armed.
    Rearmed,
}

pub struct CommsWatchdog {
    timeout_ms: u64,
    last_command_ms: u64,
    state: WatchdogState,
}

impl CommsWatchdog {
    pub fn new(timeout_ms: u32, boot_ms: u64) -> Self {
        Self {
            timeout_ms: timeout_ms as u64,
            last_command_ms: boot_ms,
            state: WatchdogState::Armed,
        }
    }

    /// Record a successfully parsed command frame.
    pub fn refresh(&mut self, now_ms: u64) {
        self.last_command_ms = now_ms;
    }

    /// Evaluate the timeout predicate and update the state.
    pub fn check(&mut self, now_ms: u64) -> WatchdogTransition {
        let silent_ms = self.silence_ms(now_ms);
        let expired = silent_ms > self.timeout_ms;

        match (self.state, expired) {
            (WatchdogState::Armed, true) => {
                warn!("WATCHDOG TRIPPED: no command for {} ms, closing valves", silent_ms);
                self.state = WatchdogState::Tripped;
                WatchdogTransition::Tripped { silent_ms }
            }
            (WatchdogState::Tripped, false) => {
                info!("WATCHDOG RE-ARMED: command link restored");
                self.state = WatchdogState::Armed;
                WatchdogTransition::Rearmed
            }
            _ => WatchdogTransition::None,
        }
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    pub fn is_tripped(&self) -> bool {
        self.state == WatchdogState::Tripped
    }

    /// Time since the last valid frame (or boot).
    pub fn silence_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_command_ms)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}
