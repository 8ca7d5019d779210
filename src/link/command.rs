//! Inbound command parser.
//!
//! Two framings, chosen at build time through
//! [`ProtocolVariant`](crate::config::ProtocolVariant):
//!
//! ```text
//! DelimitedDual:  "<fuel>,<oxi>\n"   non-zero = open, zero = closed
//! SingleChar:     '1' | '0'          open / close every valve, other bytes ignored
//! ```
//!
//! [`CommandParser::poll`] never waits: it reads only what the transport
//! reports as available.  Partial lines are kept across polls.  The first
//! valid frame ends the poll and everything still buffered is thrown away,
//! so a backlog from a slow loop iteration cannot replay stale commands.
//! Malformed input is dropped without an error path; the watchdog is the
//! only recovery mechanism for a noisy link.

use core::fmt::{self, Write};

use heapless::{String, Vec};
use log::{debug, warn};

use crate::app::commands::{CommandFrame, ValveCommand};
use crate::config::{MAX_CHANNELS, ProtocolVariant};

use super::transport::Transport;

/// Longest accepted command line, excluding the newline.
pub const MAX_LINE_LEN: usize = 32;

/// Bytes pulled from the transport per read call.
const READ_CHUNK: usize = 64;

/// Why a line or byte sequence was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// No comma in a multi-channel line.
    MissingDelimiter,
    /// Field count differs from the configured channel count.
    FieldCount,
    /// A field is not an integer.
    BadField,
    /// Line exceeded [`MAX_LINE_LEN`] before its newline.
    LineTooLong,
    /// Line is not valid UTF-8.
    NotUtf8,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDelimiter => write!(f, "missing delimiter"),
            Self::FieldCount => write!(f, "wrong field count"),
            Self::BadField => write!(f, "non-integer field"),
            Self::LineTooLong => write!(f, "line too long"),
            Self::NotUtf8 => write!(f, "not UTF-8"),
        }
    }
}

/// Streaming command parser.
pub struct CommandParser {
    variant: ProtocolVariant,
    channels: usize,
    line: Vec<u8, MAX_LINE_LEN>,
    overflowed: bool,
    rejected: u32,
}

impl CommandParser {
    pub fn new(variant: ProtocolVariant, channels: usize) -> Self {
        Self {
            variant,
            channels: channels.clamp(1, MAX_CHANNELS),
            line: Vec::new(),
            overflowed: false,
            rejected: 0,
        }
    }

    /// Read whatever the link has buffered and return the first valid frame.
    pub fn poll<T: Transport>(&mut self, link: &mut T) -> Option<CommandFrame> {
        let mut buf = [0u8; READ_CHUNK];
        while link.available() > 0 {
            let n = match link.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!("link read failed: {:?}", e);
                    break;
                }
            };
            for &byte in &buf[..n] {
                match self.push_byte(byte) {
                    Some(Ok(frame)) => {
                        self.discard_backlog(link);
                        return Some(frame);
                    }
                    Some(Err(e)) => {
                        self.rejected = self.rejected.wrapping_add(1);
                        debug!("command dropped: {}", e);
                    }
                    None => {}
                }
            }
        }
        None
    }

    /// Feed one byte.
    ///
    /// Returns `Some(Ok(_))` when a frame completes, `Some(Err(_))` when a
    /// complete line was rejected, `None` otherwise (byte buffered or
    /// ignored).
    pub fn push_byte(&mut self, byte: u8) -> Option<Result<CommandFrame, ParseError>> {
        match self.variant {
            ProtocolVariant::SingleChar => match byte {
                b'1' => Some(Ok(CommandFrame::SetSingle(ValveCommand::Open))),
                b'0' => Some(Ok(CommandFrame::SetSingle(ValveCommand::Close))),
                _ => None,
            },
            ProtocolVariant::DelimitedDual => {
                if byte == b'\n' {
                    let result = if self.overflowed {
                        Err(ParseError::LineTooLong)
                    } else {
                        parse_line(&self.line, self.channels)
                    };
                    self.line.clear();
                    self.overflowed = false;
                    return Some(result);
                }
                if self.line.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    /// Drop the partial line and every byte still waiting on the link.
    fn discard_backlog<T: Transport>(&mut self, link: &mut T) {
        self.line.clear();
        self.overflowed = false;
        let mut sink = [0u8; READ_CHUNK];
        while link.available() > 0 {
            match link.read(&mut sink) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    }

    /// Lines and bytes dropped as malformed since start-up.
    pub fn rejected_count(&self) -> u32 {
        self.rejected
    }

    pub fn variant(&self) -> ProtocolVariant {
        self.variant
    }
}

/// Parse one delimited line (without its newline) for `channels` fields.
pub fn parse_line(line: &[u8], channels: usize) -> Result<CommandFrame, ParseError> {
    let text = core::str::from_utf8(line).map_err(|_| ParseError::NotUtf8)?;
    let text = text.trim_end_matches('\r');
    if channels > 1 && !text.contains(',') {
        return Err(ParseError::MissingDelimiter);
    }

    let mut cmds: Vec<ValveCommand, MAX_CHANNELS> = Vec::new();
    for field in text.split(',') {
        let cmd = ValveCommand::from_flag(field.trim()).ok_or(ParseError::BadField)?;
        cmds.push(cmd).map_err(|_| ParseError::FieldCount)?;
    }
    if cmds.len() != channels {
        return Err(ParseError::FieldCount);
    }
    Ok(CommandFrame::SetPositions(cmds))
}

/// Ground-side encoder: `"1,0\n"` for fuel open, oxidizer closed.
pub fn encode_delimited(open: &[bool]) -> String<MAX_LINE_LEN> {
    let mut out = String::new();
    for (i, &is_open) in open.iter().take(MAX_CHANNELS).enumerate() {
        if i > 0 {
            let _ = out.push(',');
        }
        let _ = out.push(if is_open { '1' } else { '0' });
    }
    let _ = out.write_char('\n');
    out
}
