//! Transmitter port and the shared, retrying handle switches send through.
//!
//! A [`TransmitterDriver`] enumerates and opens devices; the [`Transmitter`]
//! it returns puts symbol sequences on air. Every switch of the integration
//! shares one [`SharedTransmitter`], which serializes access to the device
//! and applies the [`SendPolicy`].

mod arduino;
#[cfg(test)]
pub(crate) mod fake;

pub use arduino::{ArduinoDriver, ArduinoSettings, ArduinoTransmitter, encode_frame};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serialport::{SerialPortInfo, SerialPortType};
use tokio::sync::Mutex;

use crate::error::{DeviceUnavailable, Rf433Error, TransmitError};
use crate::protocol::BitCode;

/// A serial device seen during enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Port name (e.g. `/dev/ttyUSB0`, `COM3`)
    pub path: String,
    pub product: Option<String>,
    pub manufacturer: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

impl From<SerialPortInfo> for DeviceDescriptor {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                path: info.port_name,
                product: usb.product,
                manufacturer: usb.manufacturer,
                serial_number: usb.serial_number,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
            },
            _ => Self {
                path: info.port_name,
                ..Self::default()
            },
        }
    }
}

/// Opens transmitters.
pub trait TransmitterDriver: Send + Sync {
    type Transmitter: Transmitter + 'static;

    /// Serial devices currently present on the host.
    ///
    /// # Errors
    ///
    /// Returns a [`TransmitError`] when the platform cannot enumerate ports.
    fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, TransmitError>;

    /// Open the transmitter attached to `device`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceUnavailable`] when the device is missing, busy or not
    /// accessible.
    fn open(&self, device: &str) -> Result<Self::Transmitter, DeviceUnavailable>;
}

/// An opened radio transmitter.
pub trait Transmitter: Send {
    fn device(&self) -> &str;

    /// Whether [`open_for_transmit`](Self::open_for_transmit) has completed.
    fn is_ready(&self) -> bool;

    /// Prepare the device for sending. Must succeed before [`send`](Self::send).
    fn open_for_transmit(&mut self) -> impl Future<Output = Result<(), TransmitError>> + Send;

    /// Put one command on air.
    ///
    /// Returns [`TransmitError::NotReady`] if the device was never prepared.
    fn send(&mut self, code: &BitCode) -> impl Future<Output = Result<(), TransmitError>> + Send;
}

/// Retry and timeout rules applied to every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendPolicy {
    /// Upper bound of one attempt, including the wait for the device.
    pub timeout: Duration,
    /// Attempts made after the first failure.
    pub retries: u8,
}

impl Default for SendPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            retries: 2,
        }
    }
}

/// One transmitter shared by every switch of the integration.
pub struct SharedTransmitter<T> {
    inner: Arc<Mutex<T>>,
    policy: SendPolicy,
}

impl<T> Clone for SharedTransmitter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            policy: self.policy,
        }
    }
}

impl<T: Transmitter> SharedTransmitter<T> {
    #[must_use]
    pub fn new(transmitter: T, policy: SendPolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(transmitter)),
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> SendPolicy {
        self.policy
    }

    pub async fn is_ready(&self) -> bool {
        self.inner.lock().await.is_ready()
    }

    /// Prepare the device. Not bounded by the send timeout: board resets can
    /// take longer than a single transmission.
    ///
    /// # Errors
    ///
    /// Returns [`Rf433Error::NotReady`] when the device refuses.
    pub async fn open_for_transmit(&self) -> Result<(), Rf433Error> {
        let mut transmitter = self.inner.lock().await;
        tracing::debug!(device = transmitter.device(), "preparing transmitter");
        transmitter
            .open_for_transmit()
            .await
            .map_err(Rf433Error::NotReady)
    }

    /// Send `code`, retrying up to the policy's limit.
    ///
    /// Waiting for another switch's transmission counts toward the attempt's
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Rf433Error::Transmit`] with the last failure once every
    /// attempt failed. A transmitter that is not ready fails immediately.
    pub async fn send(&self, code: &BitCode) -> Result<(), Rf433Error> {
        let max_attempts = u32::from(self.policy.retries) + 1;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = tokio::time::timeout(self.policy.timeout, async {
                self.inner.lock().await.send(code).await
            })
            .await
            .unwrap_or(Err(TransmitError::Timeout(self.policy.timeout)));

            let source = match result {
                Ok(()) => {
                    tracing::trace!(attempt, symbols = code.len(), "code sent");
                    return Ok(());
                }
                Err(err) => err,
            };

            if matches!(source, TransmitError::NotReady) || attempt >= max_attempts {
                return Err(Rf433Error::Transmit {
                    attempts: attempt,
                    source,
                });
            }
            tracing::debug!(attempt, max_attempts, error = %source, "send failed, retrying");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serialport::UsbPortInfo;

    use super::fake::FakeDriver;
    use super::*;

    fn code() -> BitCode {
        [true, false, true].into_iter().collect()
    }

    fn policy(retries: u8) -> SendPolicy {
        SendPolicy {
            timeout: Duration::from_millis(100),
            retries,
        }
    }

    async fn ready(driver: &FakeDriver, retries: u8) -> SharedTransmitter<fake::FakeTransmitter> {
        let shared = SharedTransmitter::new(driver.open("/dev/fake").unwrap(), policy(retries));
        shared.open_for_transmit().await.unwrap();
        shared
    }

    #[test]
    fn should_describe_usb_port() {
        let info = SerialPortInfo {
            port_name: "/dev/ttyUSB0".to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x2341,
                pid: 0x0043,
                serial_number: Some("7563".to_string()),
                manufacturer: Some("Arduino".to_string()),
                product: Some("Uno".to_string()),
            }),
        };

        let descriptor = DeviceDescriptor::from(info);

        assert_eq!(descriptor.path, "/dev/ttyUSB0");
        assert_eq!(descriptor.vid, Some(0x2341));
        assert_eq!(descriptor.product.as_deref(), Some("Uno"));
    }

    #[test]
    fn should_describe_non_usb_port_by_path_only() {
        let info = SerialPortInfo {
            port_name: "/dev/ttyS0".to_string(),
            port_type: SerialPortType::Unknown,
        };
        assert_eq!(
            DeviceDescriptor::from(info),
            DeviceDescriptor {
                path: "/dev/ttyS0".to_string(),
                ..DeviceDescriptor::default()
            }
        );
    }

    #[tokio::test]
    async fn should_send_once_when_device_accepts() {
        let driver = FakeDriver::default();
        let shared = ready(&driver, 2).await;

        shared.send(&code()).await.unwrap();

        assert_eq!(driver.sends(), vec!["101"]);
    }

    #[tokio::test]
    async fn should_retry_until_success() {
        let driver = FakeDriver::default();
        let shared = ready(&driver, 2).await;
        driver.fail_next(2);

        shared.send(&code()).await.unwrap();

        assert_eq!(driver.sends(), vec!["101"]);
        assert_eq!(driver.attempts(), 3);
    }

    #[tokio::test]
    async fn should_give_up_after_retries() {
        let driver = FakeDriver::default();
        let shared = ready(&driver, 1).await;
        driver.fail_next(5);

        let err = shared.send(&code()).await.unwrap_err();

        assert!(matches!(
            err,
            Rf433Error::Transmit {
                attempts: 2,
                source: TransmitError::Io(_)
            }
        ));
        assert!(driver.sends().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_time_out_hanging_device() {
        let driver = FakeDriver::default();
        let shared = ready(&driver, 0).await;
        driver.hang(true);

        let err = shared.send(&code()).await.unwrap_err();

        assert!(matches!(
            err,
            Rf433Error::Transmit {
                attempts: 1,
                source: TransmitError::Timeout(_)
            }
        ));
    }

    #[tokio::test]
    async fn should_not_retry_unprepared_device() {
        let driver = FakeDriver::default();
        let shared = SharedTransmitter::new(driver.open("/dev/fake").unwrap(), policy(2));

        let err = shared.send(&code()).await.unwrap_err();

        assert!(matches!(
            err,
            Rf433Error::Transmit {
                attempts: 1,
                source: TransmitError::NotReady
            }
        ));
        assert!(!shared.is_ready().await);
    }

    #[tokio::test]
    async fn should_surface_prepare_failure_as_not_ready() {
        let driver = FakeDriver::default();
        driver.fail_prepare(true);
        let shared = SharedTransmitter::new(driver.open("/dev/fake").unwrap(), policy(2));

        let err = shared.open_for_transmit().await.unwrap_err();

        assert!(matches!(err, Rf433Error::NotReady(_)));
    }
}
