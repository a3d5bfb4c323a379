//! Ingestion engine: dispatches routed broker messages.
//!
//! The engine owns every piece of in-memory state (ranges cache, telemetry
//! buffer, cooldowns, actuator debouncer and publish spooler) and is meant
//! to live on a single thread: see [`crate::scheduler`]. Handlers for
//! different messages interleave at await points, so no `RefCell` borrow is
//! ever held across one.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use mycohub_domain::automation::decide;
use mycohub_domain::client::{ClientId, ClientStatus, Registration};
use mycohub_domain::error::MycoError;
use mycohub_domain::event::Event;
use mycohub_domain::ideal_range::{IdealRange, ParameterKind};
use mycohub_domain::mode::OperatingMode;
use mycohub_domain::reading::{Measurement, Reading};
use mycohub_domain::topic::{Route, parse_connected_count, route};
use tokio::time::Instant;

use crate::actuator_cache::ActuatorDebouncer;
use crate::batch::BatchLimits;
use crate::config_cache::ConfigCache;
use crate::gateway::{PersistenceGateway, RetryPolicy};
use crate::ports::{MessagePublisher, Storage};
use crate::spooler::PublishSpooler;
use crate::throttle::Cooldown;
use crate::write_buffer::TelemetryBuffer;

/// Timings and limits of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub retry: RetryPolicy,
    pub config_ttl: Duration,
    pub actuator_ttl: Duration,
    pub alert_cooldown: Duration,
    pub status_interval: Duration,
    pub buffer: BatchLimits,
    pub spool: BatchLimits,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            config_ttl: Duration::from_secs(60),
            actuator_ttl: Duration::from_secs(5),
            alert_cooldown: Duration::from_secs(60),
            status_interval: Duration::from_secs(60),
            buffer: BatchLimits::new(10, Duration::from_secs(5)),
            spool: BatchLimits::new(10, Duration::from_millis(100)),
        }
    }
}

/// How a message was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    TelemetryHandled,
    RegisterHandled,
    PresenceHandled,
}

pub struct Engine<S, P> {
    gateway: Rc<PersistenceGateway<S>>,
    ranges: ConfigCache<S>,
    buffer: TelemetryBuffer<S>,
    alerts: RefCell<Cooldown<(ClientId, ParameterKind)>>,
    status: RefCell<Cooldown<ClientId>>,
    actuators: ActuatorDebouncer<S, P>,
    spooler: Rc<PublishSpooler<P>>,
    external_clients: Cell<bool>,
}

impl<S, P> Engine<S, P>
where
    S: Storage,
    P: MessagePublisher,
{
    pub fn new(store: S, publisher: P, settings: EngineSettings) -> Self {
        let gateway = Rc::new(PersistenceGateway::new(store, settings.retry));
        let spooler = Rc::new(PublishSpooler::new(publisher, settings.spool));
        Self {
            ranges: ConfigCache::new(Rc::clone(&gateway), settings.config_ttl),
            buffer: TelemetryBuffer::new(Rc::clone(&gateway), settings.buffer),
            alerts: RefCell::new(Cooldown::new(settings.alert_cooldown)),
            status: RefCell::new(Cooldown::new(settings.status_interval)),
            actuators: ActuatorDebouncer::new(
                Rc::clone(&gateway),
                Rc::clone(&spooler),
                settings.actuator_ttl,
            ),
            spooler,
            gateway,
            external_clients: Cell::new(false),
        }
    }

    /// Route and handle one inbound message.
    ///
    /// Unrecognized topics are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the handler: a malformed payload or a
    /// store error the gateway gave up on. Side effects that already
    /// happened are kept.
    pub async fn handle(&self, topic: &str, payload: &[u8]) -> Result<Outcome, MycoError> {
        let text = String::from_utf8_lossy(payload);
        match route(topic) {
            Route::Telemetry { client_id } => {
                self.on_telemetry(&client_id, &text).await?;
                Ok(Outcome::TelemetryHandled)
            }
            Route::Register { client_id } => {
                self.on_register(&client_id, &text).await?;
                Ok(Outcome::RegisterHandled)
            }
            Route::BrokerPresence => {
                self.on_presence(&text)?;
                Ok(Outcome::PresenceHandled)
            }
            Route::Unrecognized => {
                tracing::debug!(topic, "ignoring message on unrecognized topic");
                Ok(Outcome::Ignored)
            }
        }
    }

    async fn on_telemetry(&self, client_id: &ClientId, payload: &str) -> Result<(), MycoError> {
        // The reading is buffered before the first await, so readings of a
        // client keep delivery order whatever the other awaits take.
        let measurement = match Measurement::parse(payload) {
            Ok(measurement) => measurement,
            Err(err) => {
                self.refresh_status(client_id).await;
                return Err(err.into());
            }
        };
        if let Err(err) = self
            .buffer
            .append(Reading::new(client_id.clone(), measurement))
            .await
        {
            tracing::warn!(client_id = %client_id, error = %err, "telemetry flush failed");
        }
        self.refresh_status(client_id).await;

        let temperature = self
            .ranges
            .ideal_range(client_id, ParameterKind::Temperature)
            .await?;
        let humidity = self
            .ranges
            .ideal_range(client_id, ParameterKind::Humidity)
            .await?;
        let (Some(temperature), Some(humidity)) = (temperature, humidity) else {
            tracing::debug!(client_id = %client_id, "no ideal ranges yet, skipping evaluation");
            return Ok(());
        };

        let mut first_error = None;
        for (range, value) in [
            (&temperature, measurement.temperature),
            (&humidity, measurement.humidity),
        ] {
            if let Err(err) = self.check_range(range, value).await {
                tracing::warn!(
                    client_id = %client_id,
                    kind = %range.kind,
                    error = %err,
                    "alert not recorded"
                );
                first_error.get_or_insert(err);
            }
        }

        let mode = self
            .gateway
            .read("current_mode", async |store| {
                store.current_mode(client_id).await
            })
            .await?;
        if mode != Some(OperatingMode::Automatic) {
            tracing::trace!(client_id = %client_id, ?mode, "automation not active");
            return first_error.map_or(Ok(()), Err);
        }

        let [light, fan, humidifier, motor] = decide(measurement, &temperature, &humidity);
        let results = tokio::join!(
            self.actuators.set_if_changed(client_id, &light),
            self.actuators.set_if_changed(client_id, &fan),
            self.actuators.set_if_changed(client_id, &humidifier),
            self.actuators.set_if_changed(client_id, &motor),
        );
        for result in [results.0, results.1, results.2, results.3] {
            if let Err(err) = result {
                tracing::warn!(client_id = %client_id, error = %err, "actuator update failed");
                first_error.get_or_insert(err);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Record an out-of-range event unless the metric is cooling down.
    async fn check_range(&self, range: &IdealRange, value: f64) -> Result<(), MycoError> {
        if range.contains(value) {
            return Ok(());
        }

        let key = (range.client_id.clone(), range.kind);
        let now = Instant::now();
        let previous = {
            let mut alerts = self.alerts.borrow_mut();
            if !alerts.should_fire(&key, now) {
                return Ok(());
            }
            let previous = alerts.last_fired(&key);
            alerts.record(key.clone(), now);
            previous
        };

        let event = Event::out_of_range(range, value);
        let stored = self
            .gateway
            .write("store_event", async |store| store.store(event.clone()).await)
            .await;
        match stored {
            Ok(event) => {
                tracing::info!(
                    client_id = %range.client_id,
                    kind = %range.kind,
                    value,
                    message = %event.message,
                    "out of range"
                );
                Ok(())
            }
            Err(err) => {
                self.alerts.borrow_mut().restore(key, previous);
                Err(err)
            }
        }
    }

    async fn on_register(&self, client_id: &ClientId, payload: &str) -> Result<(), MycoError> {
        let registration = Registration::parse(payload)?;
        self.gateway
            .write("register_client", async |store| {
                store.register_client(client_id, &registration).await
            })
            .await?;
        self.status
            .borrow_mut()
            .record(client_id.clone(), Instant::now());
        tracing::info!(client_id = %client_id, name = %registration.name, "client registered");
        Ok(())
    }

    fn on_presence(&self, payload: &str) -> Result<(), MycoError> {
        let count = parse_connected_count(payload)?;
        let external = count > 1;
        if self.external_clients.replace(external) != external {
            if external {
                tracing::info!(count, "external clients connected");
            } else {
                tracing::info!(count, "no external clients connected");
            }
        }
        Ok(())
    }

    /// Mark the client online, at most once per status interval.
    async fn refresh_status(&self, client_id: &ClientId) {
        let now = Instant::now();
        let previous = {
            let mut status = self.status.borrow_mut();
            if !status.should_fire(client_id, now) {
                return;
            }
            let previous = status.last_fired(client_id);
            status.record(client_id.clone(), now);
            previous
        };

        let result = self
            .gateway
            .write("update_client_status", async |store| {
                store
                    .update_client_status(client_id, ClientStatus::Online)
                    .await
            })
            .await;
        if let Err(err) = result {
            self.status.borrow_mut().restore(client_id.clone(), previous);
            tracing::warn!(client_id = %client_id, error = %err, "client status not refreshed");
        }
    }

    /// The broker connection dropped; presence is unknown until the next
    /// count arrives.
    pub fn transport_lost(&self) {
        if self.external_clients.replace(false) {
            tracing::info!("transport lost, clearing external client presence");
        }
    }

    /// Whether clients other than this engine are connected to the broker.
    #[must_use]
    pub fn external_clients_connected(&self) -> bool {
        self.external_clients.get()
    }

    /// Set a client's ideal range and refresh the cached copy.
    ///
    /// # Errors
    ///
    /// Propagates the store error once the gateway gives up.
    pub async fn update_ideal_range(&self, range: IdealRange) -> Result<IdealRange, MycoError> {
        self.ranges.update_ideal_range(range).await
    }

    /// Periodic housekeeping: retry queued publishes whose window expired.
    pub async fn tick(&self) {
        self.spooler.flush_if_due().await;
    }

    /// Flush everything still held in memory.
    pub async fn shutdown(&self) {
        match self.buffer.flush().await {
            Ok(written) => tracing::info!(readings = written, "telemetry buffer flushed"),
            Err(err) => tracing::error!(
                readings = self.buffer.len(),
                error = %err,
                "telemetry lost at shutdown"
            ),
        }
        self.spooler.flush().await;
        let pending = self.spooler.pending();
        if pending > 0 {
            tracing::warn!(pending, "publishes still queued at shutdown");
        }
    }

    #[must_use]
    pub fn buffered_readings(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn pending_publishes(&self) -> usize {
        self.spooler.pending()
    }
}
