//! Integration port.
//!
//! An integration bridges one external protocol into the hub: it registers
//! the devices and entities it exposes, then executes service calls for them.

use std::future::Future;

use rfhub_domain::device::Device;
use rfhub_domain::entity::Entity;
use rfhub_domain::error::HubError;
use rfhub_domain::id::EntityId;

/// A device together with the entities it exposes.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub device: Device,
    pub entities: Vec<Entity>,
}

/// Where integrations record what they discovered.
///
/// Implemented by the hub (see [`InMemoryRegistry`](crate::registry::InMemoryRegistry)).
pub trait IntegrationContext: Send + Sync {
    /// Insert a device, or update the one with the same `integration` and
    /// `unique_id`. Returns the stored device.
    fn upsert_device(&self, device: Device) -> impl Future<Output = Result<Device, HubError>> + Send;

    /// Insert an entity, or replace the one with the same `entity_id`.
    /// Returns the stored entity.
    fn upsert_entity(&self, entity: Entity) -> impl Future<Output = Result<Entity, HubError>> + Send;

    /// Record a device, then each of its entities re-attached to the stored
    /// device id. Returns what was stored, so callers can adopt the ids the
    /// hub already knew.
    fn persist_discovered(
        &self,
        discovered: DiscoveredDevice,
    ) -> impl Future<Output = Result<DiscoveredDevice, HubError>> + Send {
        async move {
            let device = self.upsert_device(discovered.device).await?;
            let mut entities = Vec::with_capacity(discovered.entities.len());
            for mut entity in discovered.entities {
                entity.device_id = device.id;
                entities.push(self.upsert_entity(entity).await?);
            }
            Ok(DiscoveredDevice { device, entities })
        }
    }
}

/// A pluggable device integration.
///
/// Lifecycle: [`setup`](Self::setup) once, any number of
/// [`handle_service_call`](Self::handle_service_call), then
/// [`teardown`](Self::teardown).
pub trait Integration {
    fn name(&self) -> &'static str;

    /// Validate configuration, acquire hardware and register discoveries
    /// through `ctx`.
    ///
    /// An error disables this integration only; nothing it discovered so far
    /// is kept by the integration itself.
    fn setup(
        &mut self,
        ctx: &impl IntegrationContext,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Run `service` (e.g. `turn_on`) against an entity this integration
    /// owns and return its new state.
    fn handle_service_call(
        &self,
        entity_id: EntityId,
        service: &str,
        data: serde_json::Value,
    ) -> impl Future<Output = Result<Entity, HubError>> + Send;

    /// Release hardware on shutdown.
    fn teardown(&mut self) -> impl Future<Output = Result<(), HubError>> + Send;
}
