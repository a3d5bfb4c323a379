//! `SQLite` implementation of [`ClientDirectory`].
//!
//! A client switched off by an operator stays offline until re-enabled,
//! whatever it reports.

use sqlx::{Sqlite, Transaction};

use mycohub_app::ports::ClientDirectory;
use mycohub_domain::actuator::ActuatorKind;
use mycohub_domain::client::{ClientId, ClientStatus, Registration};
use mycohub_domain::error::MycoError;
use mycohub_domain::ideal_range::ParameterKind;
use mycohub_domain::mode::OperatingMode;
use mycohub_domain::time::{self, now};

use crate::error::StorageError;
use crate::store::SqliteStore;
use crate::{actuators, app_state, ideal_ranges};

const DEFAULT_RANGES: [(ParameterKind, f64, f64); 2] = [
    (ParameterKind::Temperature, 15.0, 30.0),
    (ParameterKind::Humidity, 30.0, 100.0),
];

const SELECT_EXISTS: &str = "SELECT COUNT(*) FROM clients WHERE client_id = ?";

const SELECT_DISABLED: &str = "SELECT manually_disabled FROM clients WHERE client_id = ?";

const INSERT: &str = r"
    INSERT INTO clients (client_id, name, description, last_seen, status, created_at, manually_disabled)
    VALUES (?, ?, ?, ?, 'online', ?, 0)
";

const UPDATE_REGISTRATION: &str = r"
    UPDATE clients
    SET name = ?, description = ?, last_seen = ?,
        status = CASE WHEN manually_disabled = 1 THEN status ELSE 'online' END
    WHERE client_id = ?
";

const DISABLE: &str = r"
    UPDATE clients
    SET status = 'offline', last_seen = ?, manually_disabled = 1
    WHERE client_id = ?
";

const TOUCH: &str = "UPDATE clients SET last_seen = ? WHERE client_id = ?";

const ENABLE: &str = r"
    UPDATE clients
    SET status = 'online', last_seen = ?, manually_disabled = 0
    WHERE client_id = ?
";

impl ClientDirectory for SqliteStore {
    async fn client_exists(&self, client_id: &ClientId) -> Result<bool, MycoError> {
        let (count,): (i64,) = sqlx::query_as(SELECT_EXISTS)
            .bind(client_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(count > 0)
    }

    async fn register_client(
        &self,
        client_id: &ClientId,
        registration: &Registration,
    ) -> Result<(), MycoError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        let stamp = time::format(now());

        let updated = sqlx::query(UPDATE_REGISTRATION)
            .bind(&registration.name)
            .bind(&registration.description)
            .bind(&stamp)
            .bind(client_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?
            .rows_affected();

        if updated == 0 {
            sqlx::query(INSERT)
                .bind(client_id.as_str())
                .bind(&registration.name)
                .bind(&registration.description)
                .bind(&stamp)
                .bind(&stamp)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            provision(&mut tx, client_id, &stamp)
                .await
                .map_err(StorageError::from)?;
            tracing::info!(client_id = %client_id, "new client provisioned with defaults");
        }

        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }

    async fn update_client_status(
        &self,
        client_id: &ClientId,
        status: ClientStatus,
    ) -> Result<(), MycoError> {
        let stamp = time::format(now());
        let query = match status {
            ClientStatus::Offline => DISABLE,
            ClientStatus::Online => {
                let disabled: Option<(i64,)> = sqlx::query_as(SELECT_DISABLED)
                    .bind(client_id.as_str())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(StorageError::from)?;
                if disabled.is_some_and(|(flag,)| flag != 0) {
                    TOUCH
                } else {
                    ENABLE
                }
            }
        };

        sqlx::query(query)
            .bind(&stamp)
            .bind(client_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}

/// Default ranges, actuators (all off) and automatic mode for a new client.
async fn provision(
    tx: &mut Transaction<'_, Sqlite>,
    client_id: &ClientId,
    stamp: &str,
) -> Result<(), sqlx::Error> {
    for (kind, min, max) in DEFAULT_RANGES {
        sqlx::query(ideal_ranges::INSERT)
            .bind(client_id.as_str())
            .bind(kind.as_str())
            .bind(min)
            .bind(max)
            .bind(stamp)
            .execute(&mut **tx)
            .await?;
    }
    for actuator in ActuatorKind::ALL {
        sqlx::query(actuators::INSERT)
            .bind(client_id.as_str())
            .bind(actuator.stored_name())
            .bind(false)
            .bind(stamp)
            .execute(&mut **tx)
            .await?;
    }
    sqlx::query(app_state::INSERT)
        .bind(client_id.as_str())
        .bind(OperatingMode::Automatic.as_str())
        .bind(stamp)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
