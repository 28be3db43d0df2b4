use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{DeviceDescriptor, Transmitter, TransmitterDriver};
use crate::error::{DeviceUnavailable, TransmitError, UnavailableCause};
use crate::protocol::BitCode;

#[derive(Debug, Default)]
struct FakeState {
    sends: Vec<String>,
    attempts: u32,
    fail_next: u32,
    hang: bool,
    fail_prepare: bool,
    prepare_calls: u32,
    opened: Vec<String>,
    open_error: Option<UnavailableCause>,
    list_error: bool,
}

/// In-memory transmitter recording every code it is asked to send.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn sends(&self) -> Vec<String> {
        self.state().sends.clone()
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.state().attempts
    }

    pub(crate) fn prepare_calls(&self) -> u32 {
        self.state().prepare_calls
    }

    pub(crate) fn opened(&self) -> Vec<String> {
        self.state().opened.clone()
    }

    pub(crate) fn fail_next(&self, count: u32) {
        self.state().fail_next = count;
    }

    pub(crate) fn hang(&self, hang: bool) {
        self.state().hang = hang;
    }

    pub(crate) fn fail_prepare(&self, fail: bool) {
        self.state().fail_prepare = fail;
    }

    pub(crate) fn fail_open(&self, cause: UnavailableCause) {
        self.state().open_error = Some(cause);
    }

    pub(crate) fn fail_listing(&self) {
        self.state().list_error = true;
    }
}

impl TransmitterDriver for FakeDriver {
    type Transmitter = FakeTransmitter;

    fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, TransmitError> {
        let state = self.state();
        if state.list_error {
            return Err(TransmitError::Io(io::Error::other("enumeration failed")));
        }
        Ok(vec![DeviceDescriptor {
            path: "/dev/fake".to_string(),
            product: Some("Fake transmitter".to_string()),
            ..DeviceDescriptor::default()
        }])
    }

    fn open(&self, device: &str) -> Result<FakeTransmitter, DeviceUnavailable> {
        let mut state = self.state();
        if let Some(cause) = state.open_error.clone() {
            return Err(DeviceUnavailable {
                device: device.to_string(),
                cause,
            });
        }
        state.opened.push(device.to_string());
        Ok(FakeTransmitter {
            device: device.to_string(),
            ready: false,
            driver: self.clone(),
        })
    }
}

#[derive(Debug)]
pub(crate) struct FakeTransmitter {
    device: String,
    ready: bool,
    driver: FakeDriver,
}

impl Transmitter for FakeTransmitter {
    fn device(&self) -> &str {
        &self.device
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn open_for_transmit(&mut self) -> Result<(), TransmitError> {
        let mut state = self.driver.state();
        state.prepare_calls += 1;
        if state.fail_prepare {
            return Err(TransmitError::Io(io::Error::other("reset failed")));
        }
        self.ready = true;
        Ok(())
    }

    async fn send(&mut self, code: &BitCode) -> Result<(), TransmitError> {
        if !self.ready {
            return Err(TransmitError::NotReady);
        }
        let hang = {
            let mut state = self.driver.state();
            state.attempts += 1;
            if state.fail_next > 0 {
                state.fail_next -= 1;
                return Err(TransmitError::Io(io::Error::other("write failed")));
            }
            if !state.hang {
                state.sends.push(code.to_string());
            }
            state.hang
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}
