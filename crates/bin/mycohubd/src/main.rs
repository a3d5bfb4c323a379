//! # mycohubd: mycohub daemon
//!
//! Composition root that wires the adapters together and runs the hub.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and initialise logging
//! - Start the scheduler thread, which opens the `SQLite` pool, runs the
//!   migrations and builds the engine
//! - Connect the MQTT bridge and feed it into the scheduler
//! - Shut down gracefully on Ctrl-C: drain the scheduler first, then
//!   disconnect the bridge
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use mycohub_adapter_mqtt::MqttBridge;
use mycohub_adapter_storage_sqlite_sqlx::pool;
use mycohub_app::engine::Engine;
use mycohub_app::scheduler::Scheduler;
use mycohub_domain::error::MycoError;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let (bridge, publisher) = MqttBridge::new(&config.mqtt);

    let database_url = config.database_url().to_string();
    let settings = config.engine_settings();
    let (scheduler, submitter) =
        Scheduler::start(config.scheduler_settings(), move || async move {
            let db = pool::Config { database_url }
                .build()
                .await
                .map_err(MycoError::from)?;
            Ok(Engine::new(db.store(), publisher, settings))
        })
        .await?;

    let bridge = bridge.spawn(submitter);
    tracing::info!(
        broker = %config.mqtt.broker_host,
        port = config.mqtt.broker_port,
        "mycohubd started"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    // The scheduler flushes queued commands into the client, so the event
    // loop must keep running until it is done.
    scheduler.shutdown(config.shutdown_timeout()).await;
    bridge.shutdown().await;

    tracing::info!("mycohubd stopped");
    Ok(())
}
