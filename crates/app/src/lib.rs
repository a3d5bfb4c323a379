//! # mycohub-app
//!
//! Application layer: the ingestion engine and its **port definitions**
//! (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - storage repositories for readings, ideal ranges, actuator states,
//!     audit events and operating modes
//!   - `ClientDirectory`, the client CRUD collaborator
//!   - `MessagePublisher`, the outbound side of the broker
//! - Wrap every store access in the retrying [`gateway::PersistenceGateway`]
//! - Own the in-memory state of the engine: config cache, telemetry buffer,
//!   cooldowns, actuator debouncer and publish spooler
//! - Dispatch routed messages in [`engine::Engine`] and host it on the
//!   dedicated single-threaded [`scheduler::Scheduler`]
//!
//! ## Dependency rule
//! Depends on `mycohub-domain` only (plus `tokio` for time, channels and the
//! scheduler runtime). Never imports adapter crates.

pub mod actuator_cache;
pub mod batch;
pub mod config_cache;
pub mod engine;
pub mod gateway;
pub mod ports;
pub mod scheduler;
pub mod spooler;
pub mod throttle;
pub mod write_buffer;

#[cfg(test)]
pub(crate) mod test_support;
