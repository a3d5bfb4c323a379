//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the engine and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod client_directory;
pub mod event_store;
pub mod publisher;
pub mod storage;

pub use client_directory::ClientDirectory;
pub use event_store::EventStore;
pub use publisher::MessagePublisher;
pub use storage::{
    ActuatorRepository, AppStateRepository, IdealRangeRepository, ReadingRepository, Storage,
};
