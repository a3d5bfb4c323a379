//! `SQLite` implementation of [`ReadingRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite};

use mycohub_app::ports::ReadingRepository;
use mycohub_domain::client::ClientId;
use mycohub_domain::error::MycoError;
use mycohub_domain::reading::Reading;
use mycohub_domain::time;

use crate::error::StorageError;
use crate::store::{SqliteStore, get_client_id, get_timestamp, limit};

struct Wrapper(Reading);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Reading {
            client_id: get_client_id(row, "client_id")?,
            timestamp: get_timestamp(row, "timestamp")?,
            temperature: row.try_get("temperature")?,
            humidity: row.try_get("humidity")?,
        }))
    }
}

const INSERT_PREFIX: &str = "INSERT INTO sht3x_data (client_id, timestamp, temperature, humidity) ";

const SELECT_RECENT_BY_CLIENT: &str = r"
    SELECT * FROM sht3x_data
    WHERE client_id = ?
    ORDER BY timestamp DESC, id DESC
    LIMIT ?
";

impl ReadingRepository for SqliteStore {
    async fn insert_batch(&self, readings: Vec<Reading>) -> Result<usize, MycoError> {
        if readings.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new(INSERT_PREFIX);
        builder.push_values(readings.iter(), |mut row, reading| {
            row.push_bind(reading.client_id.to_string())
                .push_bind(time::format(reading.timestamp))
                .push_bind(reading.temperature)
                .push_bind(reading.humidity);
        });
        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(usize::try_from(result.rows_affected()).unwrap_or(usize::MAX))
    }

    async fn recent_readings(
        &self,
        client_id: &ClientId,
        count: usize,
    ) -> Result<Vec<Reading>, MycoError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT_BY_CLIENT)
            .bind(client_id.as_str())
            .bind(limit(count))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
