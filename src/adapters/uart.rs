//! UART transport to the ground-control station.
//!
//! Implements [`Transport`] over an ESP-IDF [`UartDriver`].  Reads never
//! wait: they use a zero-tick timeout and are gated on the driver's RX
//! ring-buffer fill level.  Writes go into the driver's TX ring buffer.

use esp_idf_svc::hal::delay::NON_BLOCK;
use esp_idf_svc::hal::gpio::{AnyIOPin, InputPin, OutputPin};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{self, Uart, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::EspError;

use crate::error::HwInitError;
use crate::link::transport::Transport;

pub struct UartTransport<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartTransport<'d> {
    /// Install the UART driver at `baud_rate`, 8N1, no flow control.
    pub fn new(
        uart: impl Peripheral<P = impl Uart> + 'd,
        tx: impl Peripheral<P = impl OutputPin> + 'd,
        rx: impl Peripheral<P = impl InputPin> + 'd,
        baud_rate: u32,
    ) -> Result<Self, HwInitError> {
        let config = uart::config::Config::default().baudrate(Hertz(baud_rate));
        let uart = UartDriver::new(
            uart,
            tx,
            rx,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &config,
        )
        .map_err(|e| HwInitError::UartInitFailed(e.code()))?;
        log::info!("uart: link up at {} baud", baud_rate);
        Ok(Self { uart })
    }
}

impl Transport for UartTransport<'_> {
    type Error = EspError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, EspError> {
        self.uart.read(buf, NON_BLOCK)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, EspError> {
        self.uart.write(data)
    }

    fn flush(&mut self) -> Result<(), EspError> {
        // The driver drains its TX ring buffer in the background.
        Ok(())
    }

    fn available(&self) -> usize {
        self.uart.remaining_read().unwrap_or(0)
    }
}
