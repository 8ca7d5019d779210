//! Inbound commands to the control loop.
//!
//! A [`CommandFrame`] is one successfully parsed unit from the command
//! link.  It is consumed immediately into valve updates and never stored.

use heapless::Vec;

use crate::config::MAX_CHANNELS;

/// Requested state for one valve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValveCommand {
    Open,
    Close,
    /// Raw actuator position, still clamped to the channel's safe range.
    Position(i32),
}

impl ValveCommand {
    /// Wire truthiness of one integer field: non-zero opens, zero closes.
    ///
    /// Any width is accepted (optional sign, then digits), so a value that
    /// would overflow a machine integer still reads as open.
    pub fn from_flag(field: &str) -> Option<Self> {
        let digits = field.strip_prefix(&['+', '-'][..]).unwrap_or(field);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if digits.bytes().all(|b| b == b'0') {
            Some(Self::Close)
        } else {
            Some(Self::Open)
        }
    }
}

/// One parsed command frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFrame {
    /// One command per channel, in wire order (fuel, then oxidizer).
    SetPositions(Vec<ValveCommand, MAX_CHANNELS>),
    /// Same command for every channel.
    SetSingle(ValveCommand),
}

impl CommandFrame {
    /// Command for channel `index`, if the frame addresses it.
    pub fn command_for(&self, index: usize) -> Option<ValveCommand> {
        match self {
            Self::SetPositions(cmds) => cmds.get(index).copied(),
            Self::SetSingle(cmd) => Some(*cmd),
        }
    }
}
