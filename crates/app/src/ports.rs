//! Ports: the traits adapters implement or consume.
//!
//! Living in `app` lets adapters and the daemon share them without either
//! depending on the other.

pub mod event_bus;
pub mod integration;

pub use event_bus::EventPublisher;
pub use integration::{DiscoveredDevice, Integration, IntegrationContext};
