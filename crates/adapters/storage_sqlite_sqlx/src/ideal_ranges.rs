//! `SQLite` implementation of [`IdealRangeRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use mycohub_app::ports::IdealRangeRepository;
use mycohub_domain::client::ClientId;
use mycohub_domain::error::MycoError;
use mycohub_domain::ideal_range::{IdealRange, ParameterKind};
use mycohub_domain::time;

use crate::error::StorageError;
use crate::store::{SqliteStore, get_client_id, get_parsed, get_timestamp};

struct Wrapper(IdealRange);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(IdealRange {
            client_id: get_client_id(row, "client_id")?,
            kind: get_parsed(row, "param_type")?,
            min: row.try_get("min_value")?,
            max: row.try_get("max_value")?,
            timestamp: get_timestamp(row, "timestamp")?,
        }))
    }
}

pub(crate) const INSERT: &str = r"
    INSERT INTO ideal_params (client_id, param_type, min_value, max_value, timestamp)
    VALUES (?, ?, ?, ?, ?)
";

const SELECT_LATEST: &str = r"
    SELECT * FROM ideal_params
    WHERE client_id = ? AND param_type = ?
    ORDER BY timestamp DESC, id DESC
    LIMIT 1
";

impl IdealRangeRepository for SqliteStore {
    async fn latest_ideal_range(
        &self,
        client_id: &ClientId,
        kind: ParameterKind,
    ) -> Result<Option<IdealRange>, MycoError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_LATEST)
            .bind(client_id.as_str())
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn save_ideal_range(&self, range: IdealRange) -> Result<IdealRange, MycoError> {
        sqlx::query(INSERT)
            .bind(range.client_id.as_str())
            .bind(range.kind.as_str())
            .bind(range.min)
            .bind(range.max)
            .bind(time::format(range.timestamp))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{client, memory_store};

    #[tokio::test]
    async fn should_return_none_without_configuration() {
        let store = memory_store().await;

        let range = store
            .latest_ideal_range(&client("nobody"), ParameterKind::Humidity)
            .await
            .unwrap();

        assert!(range.is_none());
    }

    #[tokio::test]
    async fn should_return_latest_saved_range_per_kind() {
        let store = memory_store().await;
        let id = client("mushroom1");
        store
            .save_ideal_range(IdealRange::new(id.clone(), ParameterKind::Temperature, 15.0, 30.0))
            .await
            .unwrap();
        store
            .save_ideal_range(IdealRange::new(id.clone(), ParameterKind::Humidity, 30.0, 100.0))
            .await
            .unwrap();
        let newest = store
            .save_ideal_range(IdealRange::new(id.clone(), ParameterKind::Temperature, 18.0, 24.0))
            .await
            .unwrap();

        let temperature = store
            .latest_ideal_range(&id, ParameterKind::Temperature)
            .await
            .unwrap();
        let humidity = store
            .latest_ideal_range(&id, ParameterKind::Humidity)
            .await
            .unwrap();

        assert_eq!(temperature, Some(newest));
        assert_eq!(humidity.unwrap().max, 100.0);
    }

    #[tokio::test]
    async fn should_store_kind_with_stored_vocabulary() {
        let store = memory_store().await;
        store
            .save_ideal_range(IdealRange::new(
                client("mushroom1"),
                ParameterKind::Temperature,
                15.0,
                30.0,
            ))
            .await
            .unwrap();

        let (param_type,): (String,) = sqlx::query_as("SELECT param_type FROM ideal_params")
            .fetch_one(&store.pool)
            .await
            .unwrap();

        assert_eq!(param_type, "temperatura");
    }
}
