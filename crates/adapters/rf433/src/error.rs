//! RF433 adapter error types.

use std::io;
use std::time::Duration;

use rfhub_domain::error::HubError;

use crate::protocol::EncoderError;

/// Errors specific to the RF433 adapter.
#[derive(Debug, thiserror::Error)]
pub enum Rf433Error {
    /// The `[rf433]` configuration was rejected before touching hardware.
    #[error("invalid rf433 configuration")]
    Config(#[from] ConfigError),

    /// The serial transmitter could not be opened.
    #[error("transmitter unavailable")]
    DeviceUnavailable(#[from] DeviceUnavailable),

    /// The transmitter opened but could not be readied for sending.
    #[error("transmitter not ready")]
    NotReady(#[source] TransmitError),

    /// Every attempt to send a command failed.
    #[error("transmission failed after {attempts} attempt(s)")]
    Transmit {
        attempts: u32,
        #[source]
        source: TransmitError,
    },

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[from] HubError),
}

impl Rf433Error {
    /// Convert into a [`HubError::Integration`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> HubError {
        match self {
            Self::Domain(err) => err,
            other => HubError::Integration(Box::new(other)),
        }
    }
}

impl From<Rf433Error> for HubError {
    fn from(err: Rf433Error) -> Self {
        err.into_domain()
    }
}

/// Configuration problems, detected before any hardware access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("device must not be empty")]
    EmptyDevice,

    #[error("switch {switch:?} has an empty {field}")]
    EmptyField {
        switch: String,
        field: &'static str,
    },

    #[error("switch key {0:?} does not produce a usable entity id")]
    InvalidKey(String),

    #[error("switch {0:?} is configured more than once")]
    DuplicateSwitch(String),

    #[error("switch {switch:?} uses unknown protocol {protocol:?}")]
    UnknownProtocol { switch: String, protocol: String },

    #[error("switch {switch:?} is invalid")]
    InvalidSwitch {
        switch: String,
        #[source]
        source: EncoderError,
    },
}

/// Why the transmitter device could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnavailableCause {
    #[error("device is busy")]
    Busy,
    #[error("device does not exist")]
    Missing,
    #[error("permission denied")]
    PermissionDenied,
    #[error("{0}")]
    Other(String),
}

impl From<&serialport::Error> for UnavailableCause {
    fn from(err: &serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice | serialport::ErrorKind::Io(io::ErrorKind::NotFound) => {
                Self::Missing
            }
            serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => Self::PermissionDenied,
            serialport::ErrorKind::Io(io::ErrorKind::ResourceBusy | io::ErrorKind::WouldBlock) => {
                Self::Busy
            }
            // EBUSY from the exclusive lock has no dedicated kind
            _ if err.description.to_lowercase().contains("busy") => Self::Busy,
            _ => Self::Other(err.description.clone()),
        }
    }
}

/// The transmitter bound to `device` could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("device {device} is unavailable: {cause}")]
pub struct DeviceUnavailable {
    pub device: String,
    pub cause: UnavailableCause,
}

/// A single transmission (or transmit preparation) failed.
#[derive(Debug, thiserror::Error)]
pub enum TransmitError {
    #[error("serial I/O error")]
    Io(#[from] io::Error),

    #[error("serial port error")]
    Serial(#[from] serialport::Error),

    #[error("transmission timed out after {0:?}")]
    Timeout(Duration),

    #[error("transmitter is not open for transmit")]
    NotReady,
}
