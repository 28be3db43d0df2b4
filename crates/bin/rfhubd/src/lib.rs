//! # rfhubd: rfhub daemon
//!
//! Composition root: loads `rfhub.toml`, wires the rf433 integration to the
//! in-memory registry and event bus, and serves a command console on stdin.
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

pub mod config;
pub mod console;
