//! # mycohub-domain
//!
//! Pure domain model for the mycohub climate-control engine.
//!
//! ## Responsibilities
//! - Foundational types: client identifiers, error taxonomy, timestamps
//! - Define **Readings** (temperature/humidity telemetry from a client)
//! - Define **Ideal ranges** (per-client acceptable band for each metric)
//! - Define **Actuators** (light, fan, humidifier, motor) and their states
//! - Define **Events** (free-text audit records tagged by topic)
//! - Route inbound broker topics to a typed [`topic::Route`]
//! - Decide desired actuator states from a reading ([`automation::decide`])
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod actuator;
pub mod automation;
pub mod client;
pub mod event;
pub mod ideal_range;
pub mod mode;
pub mod reading;
pub mod topic;
