//! `SQLite` implementation of [`AppStateRepository`].

use mycohub_app::ports::AppStateRepository;
use mycohub_domain::client::ClientId;
use mycohub_domain::error::MycoError;
use mycohub_domain::mode::OperatingMode;
use mycohub_domain::time::{self, now};

use crate::error::StorageError;
use crate::store::SqliteStore;

pub(crate) const INSERT: &str =
    "INSERT INTO app_state (client_id, mode, timestamp) VALUES (?, ?, ?)";

const SELECT_CURRENT: &str = r"
    SELECT mode FROM app_state
    WHERE client_id = ?
    ORDER BY timestamp DESC, id DESC
    LIMIT 1
";

impl AppStateRepository for SqliteStore {
    async fn current_mode(
        &self,
        client_id: &ClientId,
    ) -> Result<Option<OperatingMode>, MycoError> {
        let mode: Option<(String,)> = sqlx::query_as(SELECT_CURRENT)
            .bind(client_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        mode.map(|(mode,)| mode.parse::<OperatingMode>().map_err(MycoError::from))
            .transpose()
    }
}

impl SqliteStore {
    /// Switch a client's operating mode.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the insert fails.
    pub async fn set_mode(
        &self,
        client_id: &ClientId,
        mode: OperatingMode,
    ) -> Result<(), MycoError> {
        sqlx::query(INSERT)
            .bind(client_id.as_str())
            .bind(mode.as_str())
            .bind(time::format(now()))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
