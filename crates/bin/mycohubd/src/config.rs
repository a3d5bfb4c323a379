//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `mycohub.toml` in the working directory. Every field has a
//! default so the file is optional. Environment variables win over the file.

use std::time::Duration;

use mycohub_adapter_mqtt::MqttConfig;
use mycohub_app::batch::BatchLimits;
use mycohub_app::engine::EngineSettings;
use mycohub_app::gateway::RetryPolicy;
use mycohub_app::scheduler::SchedulerSettings;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub mqtt: MqttConfig,
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Cache lifetimes, cooldowns, retry and batching knobs.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub config_ttl_secs: u64,
    pub actuator_ttl_secs: u64,
    pub alert_cooldown_secs: u64,
    pub status_interval_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub buffer_max_len: usize,
    pub buffer_max_age_ms: u64,
    pub spool_max_len: usize,
    pub spool_max_age_ms: u64,
    /// Jobs the scheduler queue holds before new messages are dropped.
    pub queue_capacity: usize,
    /// How long shutdown waits for in-flight work.
    pub shutdown_timeout_secs: u64,
}

impl Config {
    /// Load `mycohub.toml` (if present), then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("mycohub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MYCOHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("MYCOHUB_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Ok(val) = std::env::var("MYCOHUB_MQTT_PORT") {
            if let Ok(port) = val.parse() {
                self.mqtt.broker_port = port;
            }
        }
        if let Ok(val) = std::env::var("MYCOHUB_MQTT_CLIENT_ID") {
            self.mqtt.client_id = val;
        }
        if let Ok(val) = std::env::var("MYCOHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.broker_port == 0 {
            return Err(ConfigError::Validation(
                "mqtt broker port must be non-zero".to_string(),
            ));
        }
        if self.engine.retry_attempts == 0 {
            return Err(ConfigError::Validation(
                "retry attempts must be at least 1".to_string(),
            ));
        }
        if self.engine.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "queue capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        let engine = &self.engine;
        EngineSettings {
            retry: RetryPolicy {
                max_attempts: engine.retry_attempts,
                delay: Duration::from_millis(engine.retry_delay_ms),
            },
            config_ttl: Duration::from_secs(engine.config_ttl_secs),
            actuator_ttl: Duration::from_secs(engine.actuator_ttl_secs),
            alert_cooldown: Duration::from_secs(engine.alert_cooldown_secs),
            status_interval: Duration::from_secs(engine.status_interval_secs),
            buffer: BatchLimits::new(
                engine.buffer_max_len,
                Duration::from_millis(engine.buffer_max_age_ms),
            ),
            spool: BatchLimits::new(
                engine.spool_max_len,
                Duration::from_millis(engine.spool_max_age_ms),
            ),
        }
    }

    #[must_use]
    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            queue_capacity: self.engine.queue_capacity,
            ..SchedulerSettings::default()
        }
    }

    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.engine.shutdown_timeout_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:mycohub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "mycohubd=info,mycohub=info".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            config_ttl_secs: 60,
            actuator_ttl_secs: 5,
            alert_cooldown_secs: 60,
            status_interval_secs: 60,
            retry_attempts: 5,
            retry_delay_ms: 1000,
            buffer_max_len: 10,
            buffer_max_age_ms: 5000,
            spool_max_len: 10,
            spool_max_age_ms: 100,
            queue_capacity: 1024,
            shutdown_timeout_secs: 5,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config file")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}
