//! In-memory doubles for the ports, shared by the unit tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mycohub_domain::actuator::{ActuatorKind, ActuatorState};
use mycohub_domain::client::{ClientId, ClientStatus, Registration};
use mycohub_domain::error::MycoError;
use mycohub_domain::event::Event;
use mycohub_domain::ideal_range::{IdealRange, ParameterKind};
use mycohub_domain::mode::OperatingMode;
use mycohub_domain::reading::Reading;

use crate::ports::{
    ActuatorRepository, AppStateRepository, ClientDirectory, EventStore, IdealRangeRepository,
    MessagePublisher, ReadingRepository,
};

pub fn client(id: &str) -> ClientId {
    ClientId::new(id).unwrap()
}

#[derive(Default)]
struct Inner {
    readings: Mutex<Vec<Reading>>,
    ranges: Mutex<Vec<IdealRange>>,
    actuators: Mutex<Vec<ActuatorState>>,
    events: Mutex<Vec<Event>>,
    modes: Mutex<HashMap<ClientId, OperatingMode>>,
    clients: Mutex<HashMap<ClientId, (Registration, ClientStatus)>>,
    status_updates: Mutex<Vec<(ClientId, ClientStatus)>>,
    range_reads: AtomicUsize,
    actuator_reads: AtomicUsize,
    batch_writes: AtomicUsize,
    busy_failures: AtomicU32,
    fail_actuator_writes: AtomicBool,
}

/// Store double. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    /// A store holding `id` with default ranges (15-30 C, 30-100 %),
    /// automatic mode and no actuator history.
    pub fn with_client(id: &str) -> Self {
        let store = Self::default();
        let id = client(id);
        store.set_range(&id, ParameterKind::Temperature, 15.0, 30.0);
        store.set_range(&id, ParameterKind::Humidity, 30.0, 100.0);
        store.set_mode(&id, OperatingMode::Automatic);
        store
    }

    pub fn set_range(&self, id: &ClientId, kind: ParameterKind, min: f64, max: f64) {
        self.inner
            .ranges
            .lock()
            .unwrap()
            .push(IdealRange::new(id.clone(), kind, min, max));
    }

    pub fn set_mode(&self, id: &ClientId, mode: OperatingMode) {
        self.inner.modes.lock().unwrap().insert(id.clone(), mode);
    }

    pub fn set_actuator(&self, id: &ClientId, actuator: ActuatorKind, on: bool) {
        self.inner
            .actuators
            .lock()
            .unwrap()
            .push(ActuatorState::new(id.clone(), actuator, on));
    }

    /// Fail the next `count` operations with [`MycoError::Busy`].
    pub fn fail_busy(&self, count: u32) {
        self.inner.busy_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_actuator_writes(&self, fail: bool) {
        self.inner.fail_actuator_writes.store(fail, Ordering::SeqCst);
    }

    pub fn readings(&self) -> Vec<Reading> {
        self.inner.readings.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.events.lock().unwrap().clone()
    }

    pub fn actuator_history(&self) -> Vec<ActuatorState> {
        self.inner.actuators.lock().unwrap().clone()
    }

    pub fn status_updates(&self) -> Vec<(ClientId, ClientStatus)> {
        self.inner.status_updates.lock().unwrap().clone()
    }

    pub fn registration(&self, id: &ClientId) -> Option<(Registration, ClientStatus)> {
        self.inner.clients.lock().unwrap().get(id).cloned()
    }

    pub fn range_reads(&self) -> usize {
        self.inner.range_reads.load(Ordering::SeqCst)
    }

    pub fn actuator_reads(&self) -> usize {
        self.inner.actuator_reads.load(Ordering::SeqCst)
    }

    pub fn batch_writes(&self) -> usize {
        self.inner.batch_writes.load(Ordering::SeqCst)
    }

    fn check_busy(&self) -> Result<(), MycoError> {
        let remaining = self.inner.busy_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.inner
                .busy_failures
                .store(remaining - 1, Ordering::SeqCst);
            return Err(MycoError::Busy("database is locked".into()));
        }
        Ok(())
    }

    fn latest_range(&self, id: &ClientId, kind: ParameterKind) -> Option<IdealRange> {
        self.inner
            .ranges
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| &r.client_id == id && r.kind == kind)
            .cloned()
    }
}

impl ReadingRepository for InMemoryStore {
    fn insert_batch(
        &self,
        readings: Vec<Reading>,
    ) -> impl Future<Output = Result<usize, MycoError>> + Send {
        let result = self.check_busy().map(|()| {
            self.inner.batch_writes.fetch_add(1, Ordering::SeqCst);
            let count = readings.len();
            self.inner.readings.lock().unwrap().extend(readings);
            count
        });
        async { result }
    }

    fn recent_readings(
        &self,
        client_id: &ClientId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Reading>, MycoError>> + Send {
        let result: Vec<Reading> = self
            .inner
            .readings
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|r| &r.client_id == client_id)
            .take(limit)
            .cloned()
            .collect();
        async { Ok(result) }
    }
}

impl IdealRangeRepository for InMemoryStore {
    fn latest_ideal_range(
        &self,
        client_id: &ClientId,
        kind: ParameterKind,
    ) -> impl Future<Output = Result<Option<IdealRange>, MycoError>> + Send {
        let result = self.check_busy().map(|()| {
            self.inner.range_reads.fetch_add(1, Ordering::SeqCst);
            self.latest_range(client_id, kind)
        });
        async { result }
    }

    fn save_ideal_range(
        &self,
        range: IdealRange,
    ) -> impl Future<Output = Result<IdealRange, MycoError>> + Send {
        let result = self.check_busy().map(|()| {
            self.inner.ranges.lock().unwrap().push(range.clone());
            range
        });
        async { result }
    }
}

impl ActuatorRepository for InMemoryStore {
    fn latest_actuator_state(
        &self,
        client_id: &ClientId,
        actuator: ActuatorKind,
    ) -> impl Future<Output = Result<Option<ActuatorState>, MycoError>> + Send {
        let result = self.check_busy().map(|()| {
            self.inner.actuator_reads.fetch_add(1, Ordering::SeqCst);
            self.inner
                .actuators
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|s| &s.client_id == client_id && s.actuator == actuator)
                .cloned()
        });
        async { result }
    }

    fn record_actuator_state(
        &self,
        state: ActuatorState,
    ) -> impl Future<Output = Result<ActuatorState, MycoError>> + Send {
        let result = if self.inner.fail_actuator_writes.load(Ordering::SeqCst) {
            Err(MycoError::Storage("disk I/O error".into()))
        } else {
            self.check_busy().map(|()| {
                self.inner.actuators.lock().unwrap().push(state.clone());
                state
            })
        };
        async { result }
    }
}

impl AppStateRepository for InMemoryStore {
    fn current_mode(
        &self,
        client_id: &ClientId,
    ) -> impl Future<Output = Result<Option<OperatingMode>, MycoError>> + Send {
        let result = self
            .check_busy()
            .map(|()| self.inner.modes.lock().unwrap().get(client_id).copied());
        async { result }
    }
}

impl EventStore for InMemoryStore {
    fn store(&self, event: Event) -> impl Future<Output = Result<Event, MycoError>> + Send {
        let result = self.check_busy().map(|()| {
            self.inner.events.lock().unwrap().push(event.clone());
            event
        });
        async { result }
    }

    fn recent_events(
        &self,
        client_id: &ClientId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, MycoError>> + Send {
        let result: Vec<Event> = self
            .inner
            .events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| &e.client_id == client_id)
            .take(limit)
            .cloned()
            .collect();
        async { Ok(result) }
    }
}

impl ClientDirectory for InMemoryStore {
    fn client_exists(
        &self,
        client_id: &ClientId,
    ) -> impl Future<Output = Result<bool, MycoError>> + Send {
        let exists = self.inner.clients.lock().unwrap().contains_key(client_id);
        async move { Ok(exists) }
    }

    fn register_client(
        &self,
        client_id: &ClientId,
        registration: &Registration,
    ) -> impl Future<Output = Result<(), MycoError>> + Send {
        let result = self.check_busy().map(|()| {
            let is_new = self
                .inner
                .clients
                .lock()
                .unwrap()
                .insert(
                    client_id.clone(),
                    (registration.clone(), ClientStatus::Online),
                )
                .is_none();
            if is_new && self.latest_range(client_id, ParameterKind::Temperature).is_none() {
                self.set_range(client_id, ParameterKind::Temperature, 15.0, 30.0);
                self.set_range(client_id, ParameterKind::Humidity, 30.0, 100.0);
                self.set_mode(client_id, OperatingMode::Automatic);
                for actuator in ActuatorKind::ALL {
                    self.set_actuator(client_id, actuator, false);
                }
            }
        });
        async { result }
    }

    fn update_client_status(
        &self,
        client_id: &ClientId,
        status: ClientStatus,
    ) -> impl Future<Output = Result<(), MycoError>> + Send {
        let result = self.check_busy().map(|()| {
            self.inner
                .status_updates
                .lock()
                .unwrap()
                .push((client_id.clone(), status));
            if let Some(entry) = self.inner.clients.lock().unwrap().get_mut(client_id) {
                entry.1 = status;
            }
        });
        async { result }
    }
}

#[derive(Default)]
struct PublisherInner {
    disconnected: AtomicBool,
    sent: Mutex<Vec<(String, String)>>,
    attempts: AtomicUsize,
}

/// Publisher double recording every delivered message.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    inner: Arc<PublisherInner>,
}

impl RecordingPublisher {
    pub fn set_connected(&self, connected: bool) {
        self.inner.disconnected.store(!connected, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.inner.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }
}

impl MessagePublisher for RecordingPublisher {
    fn publish(
        &self,
        topic: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), MycoError>> + Send {
        self.inner.attempts.fetch_add(1, Ordering::SeqCst);
        let result = if self.inner.disconnected.load(Ordering::SeqCst) {
            Err(MycoError::Transport("not connected".into()))
        } else {
            self.inner
                .sent
                .lock()
                .unwrap()
                .push((topic.to_string(), payload.to_string()));
            Ok(())
        };
        async { result }
    }
}
