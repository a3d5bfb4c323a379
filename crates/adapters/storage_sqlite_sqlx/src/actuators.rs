//! `SQLite` implementation of [`ActuatorRepository`].
//!
//! Actuator rows are append-only; the newest row per actuator is its state.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use mycohub_app::ports::ActuatorRepository;
use mycohub_domain::actuator::{ActuatorKind, ActuatorState};
use mycohub_domain::client::ClientId;
use mycohub_domain::error::MycoError;
use mycohub_domain::time;

use crate::error::StorageError;
use crate::store::{SqliteStore, get_client_id, get_parsed, get_timestamp};

struct Wrapper(ActuatorState);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(ActuatorState {
            client_id: get_client_id(row, "client_id")?,
            actuator: get_parsed(row, "name")?,
            on: row.try_get("state")?,
            timestamp: get_timestamp(row, "timestamp")?,
        }))
    }
}

pub(crate) const INSERT: &str =
    "INSERT INTO actuators (client_id, name, state, timestamp) VALUES (?, ?, ?, ?)";

const SELECT_LATEST: &str = r"
    SELECT * FROM actuators
    WHERE client_id = ? AND name = ?
    ORDER BY timestamp DESC, id DESC
    LIMIT 1
";

impl ActuatorRepository for SqliteStore {
    async fn latest_actuator_state(
        &self,
        client_id: &ClientId,
        actuator: ActuatorKind,
    ) -> Result<Option<ActuatorState>, MycoError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_LATEST)
            .bind(client_id.as_str())
            .bind(actuator.stored_name())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn record_actuator_state(
        &self,
        state: ActuatorState,
    ) -> Result<ActuatorState, MycoError> {
        sqlx::query(INSERT)
            .bind(state.client_id.as_str())
            .bind(state.actuator.stored_name())
            .bind(state.on)
            .bind(time::format(state.timestamp))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(state)
    }
}
