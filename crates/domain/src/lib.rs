//! # rfhub-domain
//!
//! The hub's vocabulary, free of IO.
//!
//! - [`device::Device`]: a physical thing an integration registered (one
//!   remote socket, one receiver, …)
//! - [`entity::Entity`]: the controllable side of a device, with a state
//! - [`service::SwitchService`]: what can be asked of a switch entity
//! - [`event::Event`]: a record of something that happened
//!
//! Ids, timestamps and errors live in [`id`], [`time`] and [`error`].
//! Nothing here depends on `app`, the adapters or any IO crate; boundaries
//! are traits in `rfhub-app`.

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod entity;
pub mod event;
pub mod service;
