//! In-memory registry of the devices and entities integrations expose.
//!
//! [`InMemoryRegistry`] is the hub's [`IntegrationContext`]: integrations
//! register their discoveries here during setup and the hub looks entities up
//! by their `entity_id` when dispatching service calls. Nothing is persisted
//! across restarts.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rfhub_domain::device::Device;
use rfhub_domain::entity::Entity;
use rfhub_domain::error::HubError;
use rfhub_domain::event::{Event, EventType};
use rfhub_domain::id::{DeviceId, EntityId};

use crate::ports::{EventPublisher, IntegrationContext};

/// Registry keeping every discovered device and entity in memory.
///
/// Publishes [`EventType::DeviceRegistered`] / [`EventType::EntityCreated`]
/// the first time it sees a device or entity. State changes are published by
/// the integrations themselves, not here.
pub struct InMemoryRegistry<P> {
    devices: Mutex<HashMap<DeviceId, Device>>,
    entities: Mutex<HashMap<EntityId, Entity>>,
    publisher: P,
}

impl<P> InMemoryRegistry<P> {
    #[must_use]
    pub fn new(publisher: P) -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            entities: Mutex::new(HashMap::new()),
            publisher,
        }
    }

    /// All registered devices, ordered by name.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        let mut devices: Vec<_> = self.lock_devices().values().cloned().collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name));
        devices
    }

    /// All registered entities, ordered by `entity_id`.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        let mut entities: Vec<_> = self.lock_entities().values().cloned().collect();
        entities.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        entities
    }

    /// Look an entity up by its human-readable id (e.g. `switch.desk_lamp`).
    #[must_use]
    pub fn find_entity(&self, entity_id: &str) -> Option<Entity> {
        self.lock_entities()
            .values()
            .find(|entity| entity.entity_id == entity_id)
            .cloned()
    }

    fn lock_devices(&self) -> MutexGuard<'_, HashMap<DeviceId, Device>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_entities(&self) -> MutexGuard<'_, HashMap<EntityId, Entity>> {
        self.entities.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P> IntegrationContext for InMemoryRegistry<P>
where
    P: EventPublisher + Send + Sync,
{
    async fn upsert_device(&self, mut device: Device) -> Result<Device, HubError> {
        device.validate()?;

        let created = {
            let mut devices = self.lock_devices();
            let existing = devices
                .values()
                .find(|d| d.integration == device.integration && d.unique_id == device.unique_id)
                .map(|d| d.id);
            if let Some(id) = existing {
                device.id = id;
            }
            devices.insert(device.id, device.clone());
            existing.is_none()
        };

        if created {
            tracing::debug!(
                integration = %device.integration,
                unique_id = %device.unique_id,
                "device registered"
            );
            let event = Event::new(
                EventType::DeviceRegistered,
                None,
                serde_json::json!({
                    "device_id": device.id.to_string(),
                    "integration": device.integration,
                    "unique_id": device.unique_id,
                    "name": device.name,
                }),
            );
            self.publisher.publish(event).await?;
        }

        Ok(device)
    }

    async fn upsert_entity(&self, entity: Entity) -> Result<Entity, HubError> {
        entity.validate()?;

        let created = {
            let mut entities = self.lock_entities();
            let existing = entities
                .values()
                .find(|e| e.entity_id == entity.entity_id)
                .map(|e| e.id);
            if let Some(stale) = existing.filter(|id| *id != entity.id) {
                entities.remove(&stale);
            }
            entities.insert(entity.id, entity.clone());
            existing.is_none()
        };

        if created {
            tracing::debug!(entity_id = %entity.entity_id, state = %entity.state, "entity created");
            let event = Event::new(
                EventType::EntityCreated,
                Some(entity.id),
                serde_json::json!({
                    "entity_id": entity.entity_id,
                    "state": entity.state.to_string(),
                }),
            );
            self.publisher.publish(event).await?;
        }

        Ok(entity)
    }
}
