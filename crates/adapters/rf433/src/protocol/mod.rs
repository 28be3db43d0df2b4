//! Remote-switch protocol encoders.
//!
//! An encoder turns a logical (address, sub-device, on/off) tuple into the
//! symbol sequence a remote-switch protocol expects over the air. Encoders are
//! looked up by protocol name through an [`EncoderRegistry`], so adding a
//! protocol never touches the switch controller.

mod home_easy;

pub use home_easy::HomeEasy;

use std::collections::BTreeMap;
use std::fmt;

/// Radio symbols ready to be handed to a transmitter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitCode(Vec<bool>);

impl BitCode {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<bool> for BitCode {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for BitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Errors raised while building an encoder from configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncoderError {
    #[error("unknown protocol {0:?}")]
    UnknownProtocol(String),

    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },

    #[error("invalid sub-device {sub_device:?}: {reason}")]
    InvalidSubDevice {
        sub_device: String,
        reason: &'static str,
    },
}

/// Stateful encoder for one remote switch.
///
/// Usage mirrors the radio workflow: [`set_on_off`](Self::set_on_off), then
/// [`generate_bit_code`](Self::generate_bit_code), then read
/// [`transmit_data`](Self::transmit_data).
pub trait ProtocolEncoder: Send + Sync + fmt::Debug {
    /// Protocol name, as used for configuration keys (e.g. `home_easy`).
    fn protocol(&self) -> &'static str;

    fn set_on_off(&mut self, on: bool);

    /// Regenerate the transmit buffer from the current state.
    fn generate_bit_code(&mut self);

    /// The last generated transmit buffer.
    fn transmit_data(&self) -> &BitCode;
}

/// Builds an encoder from the configured `(address, sub_device)` strings.
pub type EncoderFactory = fn(&str, &str) -> Result<Box<dyn ProtocolEncoder>, EncoderError>;

/// Maps protocol names to encoder factories.
#[derive(Debug, Clone)]
pub struct EncoderRegistry {
    factories: BTreeMap<&'static str, EncoderFactory>,
}

impl EncoderRegistry {
    /// A registry with no protocol at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register (or replace) the factory for `protocol`.
    #[must_use]
    pub fn with(mut self, protocol: &'static str, factory: EncoderFactory) -> Self {
        self.factories.insert(protocol, factory);
        self
    }

    #[must_use]
    pub fn supports(&self, protocol: &str) -> bool {
        self.factories.contains_key(protocol)
    }

    pub fn protocols(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Build the encoder for one switch.
    ///
    /// # Errors
    ///
    /// Returns [`EncoderError::UnknownProtocol`] when no factory is registered
    /// for `protocol`, or the factory's own error when the address or
    /// sub-device is invalid.
    pub fn build(
        &self,
        protocol: &str,
        address: &str,
        sub_device: &str,
    ) -> Result<Box<dyn ProtocolEncoder>, EncoderError> {
        let factory = self
            .factories
            .get(protocol)
            .ok_or_else(|| EncoderError::UnknownProtocol(protocol.to_string()))?;
        factory(address, sub_device)
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self::empty().with(HomeEasy::PROTOCOL, HomeEasy::boxed)
    }
}
