//! Arduino-based 433 MHz transmitter.
//!
//! The board runs a small sketch that reads one command per line over USB
//! serial: ASCII `0`/`1` symbols terminated by `\n`, which it replays on the
//! radio module with the protocol's pulse timings.
//!
//! Every frame also starts with `\n`. A write cut short by a send timeout
//! leaves a partial line in the sketch's buffer; the leading newline makes the
//! sketch drop it instead of merging it with the retried frame.
//!
//! Opening the port toggles DTR, which resets most Arduino boards, so the
//! transmitter waits `reset_delay` and drops whatever the bootloader printed
//! before accepting commands.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};

use super::{DeviceDescriptor, Transmitter, TransmitterDriver};
use crate::config::Rf433Config;
use crate::error::{DeviceUnavailable, TransmitError, UnavailableCause};
use crate::protocol::BitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArduinoSettings {
    pub baud_rate: u32,
    /// Serial read/write timeout.
    pub io_timeout: Duration,
    pub reset_delay: Duration,
}

impl From<&Rf433Config> for ArduinoSettings {
    fn from(config: &Rf433Config) -> Self {
        Self {
            baud_rate: config.baud_rate,
            io_timeout: Duration::from_millis(config.send_timeout_ms),
            reset_delay: config.reset_delay(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArduinoDriver {
    settings: ArduinoSettings,
}

impl ArduinoDriver {
    #[must_use]
    pub fn new(settings: ArduinoSettings) -> Self {
        Self { settings }
    }
}

impl TransmitterDriver for ArduinoDriver {
    type Transmitter = ArduinoTransmitter;

    fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, TransmitError> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(DeviceDescriptor::from).collect())
    }

    fn open(&self, device: &str) -> Result<ArduinoTransmitter, DeviceUnavailable> {
        let stream = tokio_serial::new(device, self.settings.baud_rate)
            .timeout(self.settings.io_timeout)
            .open_native_async()
            .map_err(|err| DeviceUnavailable {
                device: device.to_string(),
                cause: UnavailableCause::from(&err),
            })?;
        tracing::debug!(device, baud_rate = self.settings.baud_rate, "serial port opened");

        Ok(ArduinoTransmitter {
            device: device.to_string(),
            stream,
            reset_delay: self.settings.reset_delay,
            ready: false,
        })
    }
}

#[derive(Debug)]
pub struct ArduinoTransmitter {
    device: String,
    stream: SerialStream,
    reset_delay: Duration,
    ready: bool,
}

impl Transmitter for ArduinoTransmitter {
    fn device(&self) -> &str {
        &self.device
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn open_for_transmit(&mut self) -> Result<(), TransmitError> {
        self.stream.write_data_terminal_ready(true)?;
        tokio::time::sleep(self.reset_delay).await;
        self.stream.clear(ClearBuffer::All)?;
        self.ready = true;
        tracing::info!(device = %self.device, "transmitter ready");
        Ok(())
    }

    async fn send(&mut self, code: &BitCode) -> Result<(), TransmitError> {
        if !self.ready {
            return Err(TransmitError::NotReady);
        }
        let frame = encode_frame(code);
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }
}

/// Serialize a code the way the sketch expects it: one ASCII symbol per bit
/// on a line of its own.
#[must_use]
pub fn encode_frame(code: &BitCode) -> Vec<u8> {
    std::iter::once(b'\n')
        .chain(code.iter().map(|bit| if bit { b'1' } else { b'0' }))
        .chain(std::iter::once(b'\n'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_encode_symbols_as_ascii_line() {
        let code: BitCode = [true, false, false, true].into_iter().collect();
        assert_eq!(encode_frame(&code), b"\n1001\n");
    }

    #[test]
    fn should_encode_empty_code_as_blank_lines() {
        assert_eq!(encode_frame(&BitCode::default()), b"\n\n");
    }

    #[test]
    fn should_isolate_retried_frame_from_truncated_write() {
        let code: BitCode = [true, true, false, true].into_iter().collect();
        let frame = encode_frame(&code);

        // the first attempt only got two bytes out before timing out
        let mut wire = frame[..2].to_vec();
        wire.extend_from_slice(&frame);

        let lines: Vec<_> = wire
            .split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .collect();
        assert_eq!(lines, vec![&b"1"[..], &b"1101"[..]]);
        assert!(lines.iter().all(|line| line.len() <= code.len()));
    }

    #[test]
    fn should_derive_settings_from_config() {
        let mut config = Rf433Config::new("/dev/ttyACM0");
        config.baud_rate = 115_200;
        config.reset_delay_ms = 500;

        let settings = ArduinoSettings::from(&config);

        assert_eq!(settings.baud_rate, 115_200);
        assert_eq!(settings.io_timeout, Duration::from_secs(1));
        assert_eq!(settings.reset_delay, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn should_report_missing_device_as_unavailable() {
        let driver = ArduinoDriver::new(ArduinoSettings::from(&Rf433Config::new("unused")));

        let Err(err) = driver.open("/dev/rfhub-does-not-exist") else {
            panic!("missing device should not open");
        };

        assert_eq!(err.device, "/dev/rfhub-does-not-exist");
        assert_eq!(err.cause, UnavailableCause::Missing);
    }
}
