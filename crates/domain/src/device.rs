//! Device: a physical thing registered by an integration.
//!
//! A device groups one or more entities. Integrations identify their devices
//! by the pair (`integration`, `unique_id`) so a re-discovered device can be
//! matched with the one already registered.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::DeviceId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    /// Name of the integration that registered this device (e.g. `"rf433"`).
    pub integration: String,
    /// Identifier unique within `integration`.
    pub unique_id: String,
}

impl Device {
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the name, integration, or unique id
    /// is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.integration.is_empty() {
            return Err(ValidationError::EmptyIntegration);
        }
        if self.unique_id.is_empty() {
            return Err(ValidationError::MissingField("unique_id"));
        }
        Ok(())
    }
}

/// Builder for [`Device`]. A fresh [`DeviceId`] is generated unless one is set.
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    manufacturer: Option<String>,
    model: Option<String>,
    integration: Option<String>,
    unique_id: Option<String>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn integration(mut self, integration: impl Into<String>) -> Self {
        self.integration = Some(integration.into());
        self
    }

    #[must_use]
    pub fn unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    /// Build and validate the device.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a required field is missing or
    /// violates an invariant.
    pub fn build(self) -> Result<Device, ValidationError> {
        let device = Device {
            id: self.id.unwrap_or_default(),
            name: self.name.ok_or(ValidationError::EmptyName)?,
            manufacturer: self.manufacturer,
            model: self.model,
            integration: self.integration.ok_or(ValidationError::EmptyIntegration)?,
            unique_id: self
                .unique_id
                .ok_or(ValidationError::MissingField("unique_id"))?,
        };
        device.validate()?;
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> DeviceBuilder {
        Device::builder()
            .name("Desk lamp")
            .integration("rf433")
            .unique_id("home_easy_lamp")
    }

    #[test]
    fn should_build_device_when_required_fields_present() {
        let device = builder().model("HomeEasy").build().unwrap();
        assert_eq!(device.name, "Desk lamp");
        assert_eq!(device.integration, "rf433");
        assert_eq!(device.model.as_deref(), Some("HomeEasy"));
        assert!(device.manufacturer.is_none());
    }

    #[test]
    fn should_keep_provided_id() {
        let id = DeviceId::new();
        let device = builder().id(id).build().unwrap();
        assert_eq!(device.id, id);
    }

    #[test]
    fn should_reject_blank_name() {
        let result = builder().name("   ").build();
        assert_eq!(result.unwrap_err(), ValidationError::EmptyName);
    }

    #[test]
    fn should_reject_missing_integration() {
        let result = Device::builder().name("x").unique_id("y").build();
        assert_eq!(result.unwrap_err(), ValidationError::EmptyIntegration);
    }

    #[test]
    fn should_reject_missing_unique_id() {
        let result = Device::builder().name("x").integration("rf433").build();
        assert_eq!(
            result.unwrap_err(),
            ValidationError::MissingField("unique_id")
        );
    }
}
