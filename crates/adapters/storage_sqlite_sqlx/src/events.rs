//! `SQLite` implementation of [`EventStore`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use mycohub_app::ports::EventStore;
use mycohub_domain::client::ClientId;
use mycohub_domain::error::MycoError;
use mycohub_domain::event::Event;
use mycohub_domain::time;

use crate::error::StorageError;
use crate::store::{SqliteStore, get_client_id, get_parsed, get_timestamp, limit};

struct Wrapper(Event);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Event {
            client_id: get_client_id(row, "client_id")?,
            message: row.try_get("message")?,
            topic: get_parsed(row, "topic")?,
            timestamp: get_timestamp(row, "timestamp")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO events (client_id, message, timestamp, topic)
    VALUES (?, ?, ?, ?)
";

const SELECT_BY_CLIENT: &str = r"
    SELECT * FROM events
    WHERE client_id = ?
    ORDER BY timestamp DESC, id DESC
    LIMIT ?
";

impl EventStore for SqliteStore {
    async fn store(&self, event: Event) -> Result<Event, MycoError> {
        sqlx::query(INSERT)
            .bind(event.client_id.as_str())
            .bind(&event.message)
            .bind(time::format(event.timestamp))
            .bind(event.topic.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(event)
    }

    async fn recent_events(
        &self,
        client_id: &ClientId,
        count: usize,
    ) -> Result<Vec<Event>, MycoError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_CLIENT)
            .bind(client_id.as_str())
            .bind(limit(count))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
