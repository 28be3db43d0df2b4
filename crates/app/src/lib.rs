//! # rfhub-app
//!
//! Application layer: **port definitions** (traits) and in-process
//! infrastructure.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement or consume:
//!   - `Integration`: lifecycle and service calls of a device integration
//!   - `IntegrationContext`: where integrations persist their discoveries
//!   - `EventPublisher`: publish domain events
//! - Provide **in-process infrastructure** that doesn't need IO:
//!   - `InProcessEventBus`: broadcast channel for events
//!   - `InMemoryRegistry`: devices and entities discovered at runtime
//!
//! ## Dependency rule
//! Depends on `rfhub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod ports;
pub mod registry;
