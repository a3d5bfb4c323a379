//! End-to-end tests for the scheduler, engine and `SQLite` store together.
//!
//! The broker is replaced by a recording publisher and jobs are submitted
//! directly, so no network connection is made.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mycohub_adapter_storage_sqlite_sqlx::SqliteStore;
use mycohub_adapter_storage_sqlite_sqlx::pool::Config;
use mycohub_app::engine::{Engine, EngineSettings};
use mycohub_app::ports::{
    ActuatorRepository, AppStateRepository, ClientDirectory, EventStore, MessagePublisher,
    ReadingRepository,
};
use mycohub_app::scheduler::{Job, Scheduler, SchedulerSettings};
use mycohub_domain::actuator::ActuatorKind;
use mycohub_domain::client::{ClientId, Registration};
use mycohub_domain::error::MycoError;
use mycohub_domain::event::EventTopic;
use mycohub_domain::mode::OperatingMode;

#[derive(Clone, Default)]
struct RecordingPublisher {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), MycoError> {
        self.sent
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

/// A file-backed database, so the scheduler thread and the test can each
/// open their own pool on it.
struct TempDatabase {
    path: PathBuf,
}

impl TempDatabase {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("mycohubd-{name}-{}.db", std::process::id()));
        let db = Self { path };
        db.cleanup();
        db
    }

    fn url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path.display())
    }

    fn cleanup(&self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        self.cleanup();
    }
}

async fn open(url: &str) -> SqliteStore {
    Config {
        database_url: url.to_string(),
    }
    .build()
    .await
    .expect("database should initialise")
    .store()
}

async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test(flavor = "multi_thread")]
async fn should_handle_cold_telemetry_end_to_end() {
    let database = TempDatabase::new("telemetry");
    let store = open(&database.url()).await;
    let id = ClientId::new("mushroom1").unwrap();
    store
        .register_client(
            &id,
            &Registration {
                name: "Shelf 1".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();

    let publisher = RecordingPublisher::default();
    let engine_publisher = publisher.clone();
    let url = database.url();
    let (scheduler, submitter) = Scheduler::start(SchedulerSettings::default(), move || async move {
        let store = open(&url).await;
        Ok(Engine::new(store, engine_publisher, EngineSettings::default()))
    })
    .await
    .unwrap();

    submitter
        .submit(Job::Message {
            topic: "clients/mushroom1/sensor/sht3x".to_string(),
            payload: b"10,50".to_vec(),
        })
        .unwrap();
    eventually("two events", || async {
        store.recent_events(&id, 10).await.unwrap().len() >= 2
    })
    .await;
    scheduler.shutdown(Duration::from_secs(5)).await;

    let readings = store.recent_readings(&id, 10).await.unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].temperature, 10.0);
    assert_eq!(readings[0].humidity, 50.0);

    let light = store
        .latest_actuator_state(&id, ActuatorKind::Light)
        .await
        .unwrap()
        .unwrap();
    assert!(light.on);

    let events = store.recent_events(&id, 10).await.unwrap();
    assert_eq!(
        events
            .iter()
            .filter(|event| event.topic == EventTopic::Temperature)
            .count(),
        1
    );
    assert!(
        events
            .iter()
            .any(|event| event.message == "Temperatura baja, encendiendo luz")
    );

    let sent = publisher.sent.lock().unwrap().clone();
    assert_eq!(
        sent,
        vec![("clients/mushroom1/light".to_string(), "true".to_string())]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn should_register_new_client_through_scheduler() {
    let database = TempDatabase::new("register");
    let store = open(&database.url()).await;
    let url = database.url();
    let (scheduler, submitter) = Scheduler::start(SchedulerSettings::default(), move || async move {
        let store = open(&url).await;
        Ok(Engine::new(
            store,
            RecordingPublisher::default(),
            EngineSettings::default(),
        ))
    })
    .await
    .unwrap();

    submitter
        .submit(Job::Message {
            topic: "clients/mushroom2/register".to_string(),
            payload: b"Shelf 2,Shiitake".to_vec(),
        })
        .unwrap();
    let id = ClientId::new("mushroom2").unwrap();
    eventually("registration", || async {
        store.client_exists(&id).await.unwrap()
    })
    .await;
    scheduler.shutdown(Duration::from_secs(5)).await;

    let mode = store.current_mode(&id).await.unwrap();
    assert_eq!(mode, Some(OperatingMode::Automatic));
}

#[tokio::test(flavor = "multi_thread")]
async fn should_fail_to_start_on_unreachable_database() {
    let result = Scheduler::start(SchedulerSettings::default(), || async {
        let db = Config {
            database_url: "sqlite:/nonexistent-dir/mycohub.db".to_string(),
        }
        .build()
        .await
        .map_err(MycoError::from)?;
        Ok(Engine::new(
            db.store(),
            RecordingPublisher::default(),
            EngineSettings::default(),
        ))
    })
    .await;

    assert!(result.is_err());
}
