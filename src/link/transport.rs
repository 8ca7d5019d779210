//! Transport abstraction: any byte-oriented channel.
//!
//! Concrete implementations:
//! - UART serial to the ground-control station ([`UartTransport`](crate::adapters::uart))
//! - In-memory mocks in the host test suite
//!
//! The command parser and telemetry writer are generic over `Transport`,
//! so swapping the link requires zero changes to the control loop.

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Number of received bytes waiting to be read.
    fn available(&self) -> usize;
}
