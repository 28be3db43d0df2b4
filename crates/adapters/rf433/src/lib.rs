//! # rfhub-adapter-rf433
//!
//! 433 MHz integration: drives self-learning remote power switches through
//! an Arduino transmitter attached over USB serial.
//!
//! ## Flow
//!
//! 1. [`Rf433Config`] is validated and every switch's [`ProtocolEncoder`] is
//!    built before any hardware access.
//! 2. The [`TransmitterDriver`] opens the configured serial device once; all
//!    switches share it through a [`SharedTransmitter`].
//! 3. Each switch is registered with the hub as a device with one
//!    `switch.<key>` entity, initially off.
//!
//! The radio link is write-only: switch state is what the hub last sent.
//!
//! ## Dependency rule
//!
//! Depends on `rfhub-app` (port traits) and `rfhub-domain` only.

pub mod config;
pub mod error;
pub mod protocol;
pub mod switch;
pub mod transmitter;

use std::sync::Arc;

use rfhub_app::ports::{EventPublisher, Integration, IntegrationContext};
use rfhub_domain::entity::Entity;
use rfhub_domain::error::{HubError, NotFoundError};
use rfhub_domain::id::EntityId;
use rfhub_domain::service::SwitchService;

pub use config::{Rf433Config, SwitchConfig, SwitchSpec};
pub use error::{ConfigError, DeviceUnavailable, Rf433Error, TransmitError, UnavailableCause};
pub use protocol::{BitCode, EncoderRegistry, ProtocolEncoder};
pub use switch::Rf433Switch;
pub use transmitter::{
    ArduinoDriver, ArduinoSettings, DeviceDescriptor, SendPolicy, SharedTransmitter, Transmitter,
    TransmitterDriver,
};

use protocol::EncoderError;

/// Name under which devices of this integration are registered.
pub const INTEGRATION_NAME: &str = "rf433";

type SwitchOf<D, P> = Rf433Switch<<D as TransmitterDriver>::Transmitter, P>;

/// RF433 integration.
pub struct Rf433Integration<D: TransmitterDriver, P> {
    config: Rf433Config,
    driver: D,
    encoders: EncoderRegistry,
    publisher: Arc<P>,
    switches: Vec<SwitchOf<D, P>>,
}

impl<D, P> Rf433Integration<D, P>
where
    D: TransmitterDriver,
    P: EventPublisher + Send + Sync,
{
    #[must_use]
    pub fn new(config: Rf433Config, driver: D, publisher: Arc<P>) -> Self {
        Self {
            config,
            driver,
            encoders: EncoderRegistry::default(),
            publisher,
            switches: Vec::new(),
        }
    }

    /// Replace the protocols available to the configuration.
    #[must_use]
    pub fn with_encoders(mut self, encoders: EncoderRegistry) -> Self {
        self.encoders = encoders;
        self
    }

    /// Switches loaded by the last successful setup.
    #[must_use]
    pub fn switches(&self) -> &[SwitchOf<D, P>] {
        &self.switches
    }

    #[must_use]
    pub fn switch(&self, entity_id: EntityId) -> Option<&SwitchOf<D, P>> {
        self.switches.iter().find(|s| s.entity_id() == entity_id)
    }

    /// Check whether this integration owns the given entity.
    #[must_use]
    pub fn owns_entity(&self, entity_id: EntityId) -> bool {
        self.switch(entity_id).is_some()
    }

    /// Validate the configuration, open the transmitter and build every
    /// switch. Nothing is kept on failure.
    async fn load(&self) -> Result<Vec<SwitchOf<D, P>>, Rf433Error> {
        let mut prepared = Vec::new();
        for spec in self.config.switch_specs()? {
            let encoder = self
                .encoders
                .build(&spec.protocol, &spec.address, &spec.sub_device)
                .map_err(|source| match source {
                    EncoderError::UnknownProtocol(protocol) => ConfigError::UnknownProtocol {
                        switch: spec.key.clone(),
                        protocol,
                    },
                    source => ConfigError::InvalidSwitch {
                        switch: spec.key.clone(),
                        source,
                    },
                })?;
            prepared.push((spec, encoder));
        }

        match self.driver.list_devices() {
            Ok(devices) => {
                for device in &devices {
                    tracing::info!(
                        path = %device.path,
                        product = device.product.as_deref().unwrap_or("unknown"),
                        "serial device found"
                    );
                }
            }
            Err(err) => tracing::warn!(error = %err, "unable to enumerate serial devices"),
        }

        let transmitter = self.driver.open(&self.config.device).inspect_err(|err| {
            tracing::error!(device = %err.device, cause = %err.cause, "unable to open transmitter");
        })?;
        let shared = SharedTransmitter::new(transmitter, self.config.send_policy());

        let switches: Vec<_> = prepared
            .into_iter()
            .map(|(spec, encoder)| {
                Rf433Switch::new(spec, encoder, shared.clone(), Arc::clone(&self.publisher))
            })
            .collect();

        if switches.is_empty() {
            tracing::warn!(device = %self.config.device, "no switch configured");
        } else {
            shared.open_for_transmit().await?;
        }
        Ok(switches)
    }
}

impl<D, P> Integration for Rf433Integration<D, P>
where
    D: TransmitterDriver,
    P: EventPublisher + Send + Sync,
{
    fn name(&self) -> &'static str {
        INTEGRATION_NAME
    }

    async fn setup(&mut self, ctx: &impl IntegrationContext) -> Result<(), HubError> {
        let mut switches = self.load().await.inspect_err(|err| {
            tracing::error!(error = %err, "rf433 setup failed");
        })?;

        // Everything is built before the first write. A context failure
        // midway still leaves the earlier switches in the hub, the context
        // has no removal; the integration itself keeps none of them.
        let discovered = switches
            .iter()
            .map(Rf433Switch::discover)
            .collect::<Result<Vec<_>, _>>()?;
        for (switch, found) in switches.iter_mut().zip(discovered) {
            let stored = ctx.persist_discovered(found).await?;
            switch.adopt_device_id(stored.device.id);
        }
        tracing::info!(
            device = %self.config.device,
            count = switches.len(),
            "rf433 switches loaded"
        );
        self.switches = switches;
        Ok(())
    }

    async fn handle_service_call(
        &self,
        entity_id: EntityId,
        service: &str,
        _data: serde_json::Value,
    ) -> Result<Entity, HubError> {
        let switch = self.switch(entity_id).ok_or_else(|| NotFoundError {
            entity: "Entity",
            id: entity_id.to_string(),
        })?;
        let service: SwitchService = service.parse()?;
        Ok(switch.handle_service(service).await?)
    }

    async fn teardown(&mut self) -> Result<(), HubError> {
        let count = self.switches.len();
        self.switches.clear();
        tracing::info!(count, "rf433 transmitter released");
        Ok(())
    }
}
