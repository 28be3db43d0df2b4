//! Entity: the central state-holding concept in rfhub.
//!
//! An entity represents a single controllable aspect of a device (e.g. a
//! remote switch's on/off state). Entity ids follow the
//! `<domain>.<object_id>` convention, e.g. `switch.desk_lamp`.

mod attribute_value;
mod state;

pub use attribute_value::AttributeValue;
pub use state::EntityState;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{DeviceId, EntityId};
use crate::time::{Timestamp, now};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub device_id: DeviceId,
    /// Human-readable identifier, e.g. `switch.desk_lamp`.
    pub entity_id: String,
    pub friendly_name: String,
    pub state: EntityState,
    pub attributes: HashMap<String, AttributeValue>,
    pub last_changed: Timestamp,
    pub last_updated: Timestamp,
}

impl Entity {
    #[must_use]
    pub fn builder() -> EntityBuilder {
        EntityBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the entity id is empty or malformed,
    /// or the friendly name is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_entity_id(&self.entity_id)?;
        if self.friendly_name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }

    /// Record a new state. `last_changed` only moves when the state differs.
    pub fn update_state(&mut self, state: EntityState, at: Timestamp) {
        if self.state != state {
            self.last_changed = at;
        }
        self.state = state;
        self.last_updated = at;
    }

    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// The part of `entity_id` before the dot (e.g. `switch`).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map_or(self.entity_id.as_str(), |(domain, _)| domain)
    }
}

fn validate_entity_id(entity_id: &str) -> Result<(), ValidationError> {
    if entity_id.is_empty() {
        return Err(ValidationError::EmptyEntityId);
    }
    let valid = entity_id.split_once('.').is_some_and(|(domain, object)| {
        !domain.is_empty() && !object.is_empty() && !object.contains('.')
    });
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEntityId(entity_id.to_string()))
    }
}

/// Turn an arbitrary key into an `object_id`: lowercase ASCII alphanumerics
/// separated by single underscores.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

/// Builder for [`Entity`]. Timestamps default to now, state to `Unknown`.
#[derive(Debug, Default)]
pub struct EntityBuilder {
    id: Option<EntityId>,
    device_id: Option<DeviceId>,
    entity_id: Option<String>,
    friendly_name: Option<String>,
    state: EntityState,
    attributes: HashMap<String, AttributeValue>,
}

impl EntityBuilder {
    #[must_use]
    pub fn id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn device_id(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self
    }

    #[must_use]
    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn state(mut self, state: EntityState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Build and validate the entity.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a required field is missing or
    /// violates an invariant.
    pub fn build(self) -> Result<Entity, ValidationError> {
        let ts = now();
        let entity = Entity {
            id: self.id.unwrap_or_default(),
            device_id: self
                .device_id
                .ok_or(ValidationError::MissingField("device_id"))?,
            entity_id: self.entity_id.ok_or(ValidationError::EmptyEntityId)?,
            friendly_name: self.friendly_name.ok_or(ValidationError::EmptyName)?,
            state: self.state,
            attributes: self.attributes,
            last_changed: ts,
            last_updated: ts,
        };
        entity.validate()?;
        Ok(entity)
    }
}
