//! # mycohub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository and client-directory ports defined in
//!   `mycohub-app::ports`
//! - Manage the `SQLite` connection pool lifecycle
//! - Run the embedded migrations
//! - Map between domain types and database rows, classifying lock
//!   contention as a transient error
//!
//! ## Dependency rule
//! Depends on `mycohub-app` (for port traits) and `mycohub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;

mod actuators;
mod app_state;
mod clients;
mod events;
mod ideal_ranges;
mod readings;
mod store;

pub use store::SqliteStore;
