//! System configuration parameters
//!
//! The single authoritative source for broker, topic, store and runtime
//! settings.  Every field has a default; a JSON document may override any
//! subset of them.  Control thresholds are not configurable and live in
//! [`crate::control`] and [`crate::safety`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bus::backoff::ReconnectBackoff;
use crate::bus::topics::Topics;
use crate::error::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub broker: BrokerConfig,
    pub topics: TopicConfig,
    pub store: StoreConfig,
    pub runtime: RuntimeConfig,
}

/// MQTT broker connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker hostname or IP address
    pub host: String,
    /// Broker TCP port
    pub port: u16,
    /// Optional username (public brokers need none)
    pub username: Option<String>,
    /// Optional password, only used together with `username`
    pub password: Option<String>,
    /// Prefix for the per-process client identifier
    pub client_id_prefix: String,
    /// MQTT keep-alive interval (seconds)
    pub keep_alive_secs: u16,
    /// Capacity of the client's outbound request queue
    pub request_queue_depth: usize,
    /// Reconnect backoff: first delay (milliseconds)
    pub reconnect_initial_ms: u64,
    /// Reconnect backoff: delay cap (milliseconds)
    pub reconnect_max_ms: u64,
    /// Reconnect backoff: growth factor per failed attempt
    pub reconnect_factor: f64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "broker.hivemq.com".into(),
            port: 1883,
            username: None,
            password: None,
            client_id_prefix: "smart_ac_".into(),
            keep_alive_secs: 60,
            request_queue_depth: 64,
            reconnect_initial_ms: 1_000,
            reconnect_max_ms: 60_000,
            reconnect_factor: 2.0,
        }
    }
}

impl BrokerConfig {
    /// Stable identifier for this process: `<prefix>manager_<pid>`.
    pub fn client_id(&self) -> String {
        format!("{}manager_{}", self.client_id_prefix, std::process::id())
    }

    pub fn backoff(&self) -> ReconnectBackoff {
        ReconnectBackoff {
            first: Duration::from_millis(self.reconnect_initial_ms),
            max: Duration::from_millis(self.reconnect_max_ms),
            factor: self.reconnect_factor,
        }
    }
}

/// Topic layout; every topic hangs off one base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    pub base: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            base: "smart_ac".into(),
        }
    }
}

impl TopicConfig {
    pub fn topics(&self) -> Topics {
        Topics::new(&self.base)
    }
}

/// Audit store location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("ac_control.db"),
        }
    }
}

/// Controller runtime tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Time in-flight publishes get to drain on shutdown (milliseconds)
    pub shutdown_grace_ms: u64,
    /// How long a producer waits for room in the engine inbox (milliseconds)
    pub submit_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_ms: 2_000,
            submit_timeout_ms: 500,
        }
    }
}

impl RuntimeConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }
}

impl SystemConfig {
    /// Parse a JSON document; absent fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.broker;
        if b.host.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("broker.host must not be empty"));
        }
        if b.port == 0 {
            return Err(ConfigError::ValidationFailed("broker.port must be non-zero"));
        }
        if b.password.is_some() && b.username.is_none() {
            return Err(ConfigError::ValidationFailed(
                "broker.password requires broker.username",
            ));
        }
        if !(5..=3600).contains(&b.keep_alive_secs) {
            return Err(ConfigError::ValidationFailed(
                "broker.keep_alive_secs must be 5–3600",
            ));
        }
        if b.request_queue_depth == 0 {
            return Err(ConfigError::ValidationFailed(
                "broker.request_queue_depth must be non-zero",
            ));
        }
        if b.reconnect_initial_ms == 0 || b.reconnect_initial_ms > b.reconnect_max_ms {
            return Err(ConfigError::ValidationFailed(
                "broker.reconnect_initial_ms must be 1..=reconnect_max_ms",
            ));
        }
        if !(1.0..=10.0).contains(&b.reconnect_factor) {
            return Err(ConfigError::ValidationFailed(
                "broker.reconnect_factor must be 1.0–10.0",
            ));
        }

        let base = self.topics.base.trim_matches('/');
        if base.is_empty() || base.contains(['+', '#']) {
            return Err(ConfigError::ValidationFailed(
                "topics.base must be non-empty and free of wildcards",
            ));
        }

        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed("store.path must not be empty"));
        }
        if self.runtime.shutdown_grace_ms > 60_000 {
            return Err(ConfigError::ValidationFailed(
                "runtime.shutdown_grace_ms must be at most 60000",
            ));
        }
        if !(1..=10_000).contains(&self.runtime.submit_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "runtime.submit_timeout_ms must be 1..=10000",
            ));
        }
        Ok(())
    }
}
