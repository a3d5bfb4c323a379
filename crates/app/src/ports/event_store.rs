//! Event store port: persistence for the audit trail.

use std::future::Future;

use mycohub_domain::client::ClientId;
use mycohub_domain::error::MycoError;
use mycohub_domain::event::Event;

/// Repository for persisting and querying audit [`Event`]s.
pub trait EventStore {
    /// Persist a new event.
    fn store(&self, event: Event) -> impl Future<Output = Result<Event, MycoError>> + Send;

    /// Find events for a client, ordered newest-first.
    fn recent_events(
        &self,
        client_id: &ClientId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, MycoError>> + Send;
}
