//! Actuator debouncer.
//!
//! Remembers the last known state of every actuator for a short TTL and
//! only acts when the desired state differs from it. Acting means: record
//! the new state, queue the control message, and store an audit event.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use mycohub_domain::actuator::{ActuatorKind, ActuatorState, control_payload};
use mycohub_domain::automation::DesiredState;
use mycohub_domain::client::ClientId;
use mycohub_domain::error::MycoError;
use mycohub_domain::event::Event;
use tokio::time::Instant;

use crate::gateway::PersistenceGateway;
use crate::ports::{ActuatorRepository, EventStore, MessagePublisher};
use crate::spooler::PublishSpooler;

type Key = (ClientId, ActuatorKind);

pub struct ActuatorDebouncer<S, P> {
    gateway: Rc<PersistenceGateway<S>>,
    spooler: Rc<PublishSpooler<P>>,
    ttl: Duration,
    known: RefCell<HashMap<Key, (Option<bool>, Instant)>>,
}

impl<S, P> ActuatorDebouncer<S, P>
where
    S: ActuatorRepository + EventStore,
    P: MessagePublisher,
{
    pub fn new(
        gateway: Rc<PersistenceGateway<S>>,
        spooler: Rc<PublishSpooler<P>>,
        ttl: Duration,
    ) -> Self {
        Self {
            gateway,
            spooler,
            ttl,
            known: RefCell::new(HashMap::new()),
        }
    }

    /// Last known state, `None` when the actuator has no history.
    ///
    /// # Errors
    ///
    /// Propagates the store error once the gateway gives up.
    pub async fn current_state(
        &self,
        client_id: &ClientId,
        actuator: ActuatorKind,
    ) -> Result<Option<bool>, MycoError> {
        let key = (client_id.clone(), actuator);
        if let Some(state) = self.fresh(&key) {
            return Ok(state);
        }

        let state = self
            .gateway
            .read("latest_actuator_state", async |store| {
                store.latest_actuator_state(client_id, actuator).await
            })
            .await?
            .map(|s| s.on);
        self.known.borrow_mut().insert(key, (state, Instant::now()));
        Ok(state)
    }

    /// Drive `actuator` to `desired` if it is not already there.
    ///
    /// Returns whether a change was made. All steps of a change are
    /// attempted even if one fails; the cached state is only updated when
    /// the new state was persisted.
    ///
    /// # Errors
    ///
    /// Returns the first error among the lookup, the persist and the audit
    /// write.
    pub async fn set_if_changed(
        &self,
        client_id: &ClientId,
        desired: &DesiredState,
    ) -> Result<bool, MycoError> {
        let actuator = desired.actuator;
        if self.current_state(client_id, actuator).await? == Some(desired.on) {
            return Ok(false);
        }

        let state = ActuatorState::new(client_id.clone(), actuator, desired.on);
        let persisted = self
            .gateway
            .write("record_actuator_state", async |store| {
                store.record_actuator_state(state.clone()).await
            })
            .await;

        self.spooler
            .enqueue(
                actuator.control_topic(client_id),
                control_payload(desired.on),
            )
            .await;

        let event = Event::actuator_changed(client_id.clone(), desired.reason);
        let audited = self
            .gateway
            .write("store_event", async |store| store.store(event.clone()).await)
            .await;

        let key = (client_id.clone(), actuator);
        if persisted.is_ok() {
            self.known
                .borrow_mut()
                .insert(key, (Some(desired.on), Instant::now()));
            tracing::info!(
                client_id = %client_id,
                actuator = %actuator,
                on = desired.on,
                reason = desired.reason,
                "actuator changed"
            );
        } else {
            self.known.borrow_mut().remove(&key);
        }

        persisted?;
        audited?;
        Ok(true)
    }

    fn fresh(&self, key: &Key) -> Option<Option<bool>> {
        let known = self.known.borrow();
        let (state, loaded_at) = known.get(key)?;
        (loaded_at.elapsed() < self.ttl).then_some(*state)
    }
}
