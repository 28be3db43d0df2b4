//! One remote switch: cached state, encoder and the shared transmitter.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use rfhub_app::ports::{DiscoveredDevice, EventPublisher};
use rfhub_domain::device::Device;
use rfhub_domain::entity::{AttributeValue, Entity, EntityState};
use rfhub_domain::error::HubError;
use rfhub_domain::event::{Event, EventType};
use rfhub_domain::id::{DeviceId, EntityId};
use rfhub_domain::service::SwitchService;

use crate::INTEGRATION_NAME;
use crate::config::SwitchSpec;
use crate::error::Rf433Error;
use crate::protocol::ProtocolEncoder;
use crate::transmitter::{SharedTransmitter, Transmitter};

/// A write-only remote switch.
///
/// The radio link carries no feedback, so [`is_on`](Self::is_on) is the
/// switch's belief about the physical device, not a reading. Every command
/// is sent, even when it matches the cached state.
pub struct Rf433Switch<T, P> {
    spec: SwitchSpec,
    device_id: DeviceId,
    entity_id: EntityId,
    on: AtomicBool,
    encoder: Mutex<Box<dyn ProtocolEncoder>>,
    transmitter: SharedTransmitter<T>,
    publisher: Arc<P>,
}

impl<T, P> Rf433Switch<T, P>
where
    T: Transmitter,
    P: EventPublisher + Send + Sync,
{
    /// A switch that starts out off.
    #[must_use]
    pub fn new(
        spec: SwitchSpec,
        encoder: Box<dyn ProtocolEncoder>,
        transmitter: SharedTransmitter<T>,
        publisher: Arc<P>,
    ) -> Self {
        Self {
            spec,
            device_id: DeviceId::new(),
            entity_id: EntityId::new(),
            on: AtomicBool::new(false),
            encoder: Mutex::new(encoder),
            transmitter,
            publisher,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.spec.key
    }

    #[must_use]
    pub fn spec(&self) -> &SwitchSpec {
        &self.spec
    }

    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Point the switch at the device id the hub stored for it.
    pub(crate) fn adopt_device_id(&mut self, device_id: DeviceId) {
        self.device_id = device_id;
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    /// State is pushed by commands, never polled.
    #[must_use]
    pub fn should_poll(&self) -> bool {
        false
    }

    /// # Errors
    ///
    /// Returns [`Rf433Error::Transmit`] when the command could not be sent;
    /// the cached state is left unchanged.
    pub async fn turn_on(&self) -> Result<Entity, Rf433Error> {
        self.command(|_| true).await
    }

    /// # Errors
    ///
    /// See [`turn_on`](Self::turn_on).
    pub async fn turn_off(&self) -> Result<Entity, Rf433Error> {
        self.command(|_| false).await
    }

    /// # Errors
    ///
    /// See [`turn_on`](Self::turn_on).
    pub async fn toggle(&self) -> Result<Entity, Rf433Error> {
        self.command(|on| !on).await
    }

    /// # Errors
    ///
    /// See [`turn_on`](Self::turn_on).
    pub async fn handle_service(&self, service: SwitchService) -> Result<Entity, Rf433Error> {
        match service {
            SwitchService::TurnOn => self.turn_on().await,
            SwitchService::TurnOff => self.turn_off().await,
            SwitchService::Toggle => self.toggle().await,
        }
    }

    /// The device and entity to register with the hub.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the configured name is unusable.
    pub fn discover(&self) -> Result<DiscoveredDevice, HubError> {
        let device = Device::builder()
            .id(self.device_id)
            .name(&self.spec.name)
            .model(&self.spec.protocol)
            .integration(INTEGRATION_NAME)
            .unique_id(self.spec.unique_id())
            .build()?;
        Ok(DiscoveredDevice {
            device,
            entities: vec![self.snapshot()?],
        })
    }

    /// The entity as currently believed.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the configured name is unusable.
    pub fn snapshot(&self) -> Result<Entity, HubError> {
        let entity = Entity::builder()
            .id(self.entity_id)
            .device_id(self.device_id)
            .entity_id(self.spec.entity_id())
            .friendly_name(&self.spec.name)
            .state(EntityState::from(self.is_on()))
            .attribute("protocol", AttributeValue::from(self.spec.protocol.as_str()))
            .attribute("address", AttributeValue::from(self.spec.address.as_str()))
            .attribute(
                "sub_device",
                AttributeValue::from(self.spec.sub_device.as_str()),
            )
            .attribute("assumed_state", AttributeValue::from(true))
            .build()?;
        Ok(entity)
    }

    // The encoder lock pairs each state flip with its transmission.
    async fn command(&self, target: impl FnOnce(bool) -> bool + Send) -> Result<Entity, Rf433Error> {
        let mut encoder = self.encoder.lock().await;
        let previous = self.is_on();
        let on = target(previous);

        self.on.store(on, Ordering::SeqCst);
        encoder.set_on_off(on);
        encoder.generate_bit_code();
        let code = encoder.transmit_data().clone();

        if let Err(err) = self.transmitter.send(&code).await {
            self.on.store(previous, Ordering::SeqCst);
            encoder.set_on_off(previous);
            encoder.generate_bit_code();
            tracing::warn!(
                switch = %self.spec.name,
                error = %err,
                "command failed, state reverted"
            );
            return Err(err);
        }
        drop(encoder);

        tracing::debug!(switch = %self.spec.name, on, "command sent");
        self.notify(previous, on).await;
        Ok(self.snapshot()?)
    }

    async fn notify(&self, from: bool, to: bool) {
        let event = Event::new(
            EventType::StateChanged,
            Some(self.entity_id),
            serde_json::json!({
                "entity_id": self.spec.entity_id(),
                "from": EntityState::from(from).to_string(),
                "to": EntityState::from(to).to_string(),
            }),
        );
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(switch = %self.spec.name, error = %err, "unable to publish state change");
        }
    }
}

#[cfg(test)]
mod tests {
    use rfhub_app::event_bus::InProcessEventBus;

    use super::*;
    use crate::protocol::HomeEasy;
    use crate::transmitter::fake::{FakeDriver, FakeTransmitter};
    use crate::transmitter::{SendPolicy, TransmitterDriver};

    fn spec(key: &str, address: &str, unit: &str) -> SwitchSpec {
        SwitchSpec {
            key: key.to_string(),
            name: key.to_string(),
            protocol: HomeEasy::PROTOCOL.to_string(),
            address: address.to_string(),
            sub_device: unit.to_string(),
        }
    }

    async fn transmitter(driver: &FakeDriver) -> SharedTransmitter<FakeTransmitter> {
        let shared = SharedTransmitter::new(driver.open("/dev/fake").unwrap(), SendPolicy::default());
        shared.open_for_transmit().await.unwrap();
        shared
    }

    fn switch(
        spec: SwitchSpec,
        transmitter: SharedTransmitter<FakeTransmitter>,
        bus: &InProcessEventBus,
    ) -> Rf433Switch<FakeTransmitter, InProcessEventBus> {
        let encoder = HomeEasy::new(&spec.address, &spec.sub_device).unwrap();
        Rf433Switch::new(spec, Box::new(encoder), transmitter, Arc::new(bus.clone()))
    }

    fn expected_code(address: &str, unit: &str, on: bool) -> String {
        let mut encoder = HomeEasy::new(address, unit).unwrap();
        encoder.set_on_off(on);
        encoder.generate_bit_code();
        encoder.transmit_data().to_string()
    }

    #[tokio::test]
    async fn should_start_off_and_never_poll() {
        let driver = FakeDriver::default();
        let bus = InProcessEventBus::new(16);
        let lamp = switch(spec("lamp", "A1", "1"), transmitter(&driver).await, &bus);

        assert!(!lamp.is_on());
        assert!(!lamp.should_poll());
        assert_eq!(lamp.name(), "lamp");
        assert!(driver.sends().is_empty());
    }

    #[tokio::test]
    async fn should_send_on_code_when_turned_on() {
        let driver = FakeDriver::default();
        let bus = InProcessEventBus::new(16);
        let lamp = switch(spec("lamp", "A1", "1"), transmitter(&driver).await, &bus);

        let entity = lamp.turn_on().await.unwrap();

        assert!(lamp.is_on());
        assert_eq!(entity.state, EntityState::On);
        assert_eq!(driver.sends(), vec![expected_code("A1", "1", true)]);
    }

    #[tokio::test]
    async fn should_send_off_code_when_turned_off() {
        let driver = FakeDriver::default();
        let bus = InProcessEventBus::new(16);
        let lamp = switch(spec("lamp", "A1", "1"), transmitter(&driver).await, &bus);

        lamp.turn_on().await.unwrap();
        lamp.turn_off().await.unwrap();

        assert!(!lamp.is_on());
        assert_eq!(
            driver.sends(),
            vec![expected_code("A1", "1", true), expected_code("A1", "1", false)]
        );
    }

    #[tokio::test]
    async fn should_send_even_when_state_is_unchanged() {
        let driver = FakeDriver::default();
        let bus = InProcessEventBus::new(16);
        let lamp = switch(spec("lamp", "A1", "1"), transmitter(&driver).await, &bus);

        lamp.turn_off().await.unwrap();
        lamp.turn_off().await.unwrap();

        assert_eq!(driver.sends().len(), 2);
        assert!(!lamp.is_on());
    }

    #[tokio::test]
    async fn should_toggle_between_states() {
        let driver = FakeDriver::default();
        let bus = InProcessEventBus::new(16);
        let lamp = switch(spec("lamp", "A1", "1"), transmitter(&driver).await, &bus);

        lamp.handle_service(SwitchService::Toggle).await.unwrap();
        assert!(lamp.is_on());
        lamp.handle_service(SwitchService::Toggle).await.unwrap();
        assert!(!lamp.is_on());
    }

    #[tokio::test]
    async fn should_publish_state_changed_event() {
        let driver = FakeDriver::default();
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();
        let lamp = switch(spec("lamp", "A1", "1"), transmitter(&driver).await, &bus);

        lamp.turn_on().await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::StateChanged);
        assert_eq!(event.entity_id, Some(lamp.entity_id()));
        assert_eq!(event.data["entity_id"], "switch.lamp");
        assert_eq!(event.data["from"], "off");
        assert_eq!(event.data["to"], "on");
    }

    #[tokio::test]
    async fn should_revert_state_and_stay_silent_when_send_fails() {
        let driver = FakeDriver::default();
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();
        let lamp = switch(spec("lamp", "A1", "1"), transmitter(&driver).await, &bus);
        driver.fail_next(u32::MAX);

        let err = lamp.turn_on().await.unwrap_err();

        assert!(matches!(err, Rf433Error::Transmit { attempts: 3, .. }));
        assert!(!lamp.is_on());
        assert!(rx.try_recv().is_err());
        assert_eq!(lamp.snapshot().unwrap().state, EntityState::Off);
    }

    #[tokio::test]
    async fn should_keep_state_independent_between_switches() {
        let driver = FakeDriver::default();
        let bus = InProcessEventBus::new(16);
        let shared = transmitter(&driver).await;
        let lamp = switch(spec("lamp", "A1", "1"), shared.clone(), &bus);
        let fan = switch(spec("fan", "A1", "2"), shared, &bus);

        lamp.turn_on().await.unwrap();

        assert!(lamp.is_on());
        assert!(!fan.is_on());
        assert_eq!(driver.opened(), vec!["/dev/fake"]);
    }

    #[tokio::test]
    async fn should_serialize_concurrent_commands() {
        let driver = FakeDriver::default();
        let bus = InProcessEventBus::new(16);
        let shared = transmitter(&driver).await;
        let lamp = switch(spec("lamp", "A1", "1"), shared.clone(), &bus);
        let fan = switch(spec("fan", "A1", "2"), shared, &bus);

        let (a, b, c) = tokio::join!(lamp.turn_on(), fan.turn_on(), lamp.toggle());

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert!(!lamp.is_on());
        assert!(fan.is_on());
        assert_eq!(driver.sends().len(), 3);
    }

    #[tokio::test]
    async fn should_describe_device_and_entity() {
        let driver = FakeDriver::default();
        let bus = InProcessEventBus::new(16);
        let mut lamp_spec = spec("desk lamp", "A1", "1");
        lamp_spec.name = "Desk lamp".to_string();
        let lamp = switch(lamp_spec, transmitter(&driver).await, &bus);

        let discovered = lamp.discover().unwrap();

        assert_eq!(discovered.device.name, "Desk lamp");
        assert_eq!(discovered.device.integration, "rf433");
        assert_eq!(discovered.device.unique_id, "home_easy_desk_lamp");
        assert_eq!(discovered.device.model.as_deref(), Some("home_easy"));
        let entity = &discovered.entities[0];
        assert_eq!(entity.entity_id, "switch.desk_lamp");
        assert_eq!(entity.device_id, discovered.device.id);
        assert_eq!(
            entity.get_attribute("assumed_state"),
            Some(&AttributeValue::Bool(true))
        );
        assert_eq!(
            entity.get_attribute("address"),
            Some(&AttributeValue::String("A1".to_string()))
        );
    }
}
