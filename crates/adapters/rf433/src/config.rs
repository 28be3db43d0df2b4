//! RF433 integration configuration.
//!
//! ```toml
//! device = "/dev/ttyUSB0"
//!
//! [switches.home_easy.lamp]
//! name = "Desk lamp"
//! address = "A1"
//! device = "1"
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::Deserialize;

use rfhub_domain::entity::slugify;

use crate::error::ConfigError;
use crate::transmitter::SendPolicy;

/// Configuration for the RF433 integration.
#[derive(Debug, Clone, Deserialize)]
pub struct Rf433Config {
    /// Serial device of the Arduino transmitter (e.g. `/dev/ttyUSB0`).
    pub device: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Upper bound for a single transmission attempt, in milliseconds.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Additional attempts after a failed transmission.
    #[serde(default = "default_send_retries")]
    pub send_retries: u8,
    /// How long the board needs after the port opens (Arduino auto-reset).
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
    /// Protocol name → switch key → switch entry.
    pub switches: BTreeMap<String, BTreeMap<String, SwitchConfig>>,
}

/// One configured remote switch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchConfig {
    /// Display name; defaults to the switch key.
    #[serde(default)]
    pub name: Option<String>,
    /// Protocol-specific address of the remote.
    pub address: String,
    /// Protocol-specific sub-device (unit/channel).
    pub device: String,
}

/// A validated switch entry with its display name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchSpec {
    pub key: String,
    pub name: String,
    pub protocol: String,
    pub address: String,
    pub sub_device: String,
}

impl SwitchSpec {
    /// The hub entity id for this switch, e.g. `switch.desk_lamp`.
    #[must_use]
    pub fn entity_id(&self) -> String {
        format!("switch.{}", slugify(&self.key))
    }

    /// Identifier of the device within the integration.
    #[must_use]
    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.protocol, slugify(&self.key))
    }
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_send_timeout_ms() -> u64 {
    1000
}

fn default_send_retries() -> u8 {
    2
}

fn default_reset_delay_ms() -> u64 {
    2000
}

impl Rf433Config {
    /// A configuration for `device` with default tuning and no switch.
    #[must_use]
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            baud_rate: default_baud_rate(),
            send_timeout_ms: default_send_timeout_ms(),
            send_retries: default_send_retries(),
            reset_delay_ms: default_reset_delay_ms(),
            switches: BTreeMap::new(),
        }
    }

    /// Add a switch under `protocol`.
    #[must_use]
    pub fn with_switch(
        mut self,
        protocol: impl Into<String>,
        key: impl Into<String>,
        switch: SwitchConfig,
    ) -> Self {
        self.switches
            .entry(protocol.into())
            .or_default()
            .insert(key.into(), switch);
        self
    }

    #[must_use]
    pub fn send_policy(&self) -> SendPolicy {
        SendPolicy {
            timeout: Duration::from_millis(self.send_timeout_ms),
            retries: self.send_retries,
        }
    }

    #[must_use]
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    /// Validate the structure and resolve every switch entry.
    ///
    /// Protocol names are not checked here; the encoder registry does that.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an empty device, an empty address or
    /// sub-device, or two keys that map to the same entity id.
    pub fn switch_specs(&self) -> Result<Vec<SwitchSpec>, ConfigError> {
        if self.device.trim().is_empty() {
            return Err(ConfigError::EmptyDevice);
        }

        let mut seen = BTreeSet::new();
        let mut specs = Vec::new();
        for (protocol, switches) in &self.switches {
            for (key, entry) in switches {
                let empty = |field: &'static str| ConfigError::EmptyField {
                    switch: key.clone(),
                    field,
                };
                if entry.address.trim().is_empty() {
                    return Err(empty("address"));
                }
                if entry.device.trim().is_empty() {
                    return Err(empty("device"));
                }

                let slug = slugify(key);
                if slug.is_empty() {
                    return Err(ConfigError::InvalidKey(key.clone()));
                }
                if !seen.insert(slug) {
                    return Err(ConfigError::DuplicateSwitch(key.clone()));
                }

                let name = entry
                    .name
                    .as_deref()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(key)
                    .to_string();
                specs.push(SwitchSpec {
                    key: key.clone(),
                    name,
                    protocol: protocol.clone(),
                    address: entry.address.trim().to_string(),
                    sub_device: entry.device.trim().to_string(),
                });
            }
        }
        Ok(specs)
    }
}
