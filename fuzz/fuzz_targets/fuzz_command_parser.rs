//! Fuzz target: `CommandParser::push_byte`
//!
//! Drives arbitrary byte sequences through both protocol variants and
//! asserts that the parser never panics and that every frame it yields
//! addresses exactly the configured channels.
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use valvestand::config::ProtocolVariant;
use valvestand::link::CommandParser;

fuzz_target!(|data: &[u8]| {
    for channels in 1..=2 {
        let mut parser = CommandParser::new(ProtocolVariant::DelimitedDual, channels);
        for &b in data {
            if let Some(Ok(frame)) = parser.push_byte(b) {
                assert!(frame.command_for(channels - 1).is_some());
                assert!(frame.command_for(channels).is_none());
            }
        }
    }

    let mut parser = CommandParser::new(ProtocolVariant::SingleChar, 2);
    let frames = data
        .iter()
        .filter_map(|&b| parser.push_byte(b))
        .count();
    let commands = data.iter().filter(|&&b| b == b'0' || b == b'1').count();
    assert_eq!(frames, commands, "single-char frames must map 1:1 to command bytes");
});
