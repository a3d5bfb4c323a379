//! Storage port: repository traits for persistence.
//!
//! Implementations must not hold a connection or transaction across calls:
//! each method acquires what it needs and releases it before returning.
//! Lock contention must surface as [`MycoError::Busy`] so the gateway can
//! retry it.

use std::future::Future;

use mycohub_domain::actuator::{ActuatorKind, ActuatorState};
use mycohub_domain::client::ClientId;
use mycohub_domain::error::MycoError;
use mycohub_domain::ideal_range::{IdealRange, ParameterKind};
use mycohub_domain::mode::OperatingMode;
use mycohub_domain::reading::Reading;

use super::{ClientDirectory, EventStore};

/// Append-only telemetry storage.
pub trait ReadingRepository {
    /// Persist a batch of readings as one write. Returns the number stored.
    fn insert_batch(
        &self,
        readings: Vec<Reading>,
    ) -> impl Future<Output = Result<usize, MycoError>> + Send;

    /// Most recent readings of a client, newest first.
    fn recent_readings(
        &self,
        client_id: &ClientId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Reading>, MycoError>> + Send;
}

/// Per-client ideal ranges. The latest row per kind is the current one.
pub trait IdealRangeRepository {
    fn latest_ideal_range(
        &self,
        client_id: &ClientId,
        kind: ParameterKind,
    ) -> impl Future<Output = Result<Option<IdealRange>, MycoError>> + Send;

    /// Record a new current range.
    fn save_ideal_range(
        &self,
        range: IdealRange,
    ) -> impl Future<Output = Result<IdealRange, MycoError>> + Send;
}

/// Actuator history. The latest row per actuator is the current state.
pub trait ActuatorRepository {
    fn latest_actuator_state(
        &self,
        client_id: &ClientId,
        actuator: ActuatorKind,
    ) -> impl Future<Output = Result<Option<ActuatorState>, MycoError>> + Send;

    fn record_actuator_state(
        &self,
        state: ActuatorState,
    ) -> impl Future<Output = Result<ActuatorState, MycoError>> + Send;
}

/// Operating mode per client, owned by the CRUD layer.
pub trait AppStateRepository {
    fn current_mode(
        &self,
        client_id: &ClientId,
    ) -> impl Future<Output = Result<Option<OperatingMode>, MycoError>> + Send;
}

/// Everything the engine needs from a store, as one bound.
pub trait Storage:
    ReadingRepository
    + IdealRangeRepository
    + ActuatorRepository
    + AppStateRepository
    + EventStore
    + ClientDirectory
{
}

impl<T> Storage for T where
    T: ReadingRepository
        + IdealRangeRepository
        + ActuatorRepository
        + AppStateRepository
        + EventStore
        + ClientDirectory
{
}
