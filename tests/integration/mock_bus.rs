//! Mock bus and store adapters for integration tests.
//!
//! Records every publish so tests can assert on the full outbound history
//! without a broker.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde_json::Value;

use smartac::alarm::AlarmEvent;
use smartac::app::ports::{AuditStore, Effect, Publisher};
use smartac::app::state::Reading;
use smartac::error::{BusError, StoreError};

// ── RecordingPublisher ────────────────────────────────────────

#[derive(Default)]
pub struct RecordingPublisher {
    pub sent: Mutex<Vec<(String, Value)>>,
    /// Reject publishes on `<base>/control` with `QueueFull`.
    pub control_down: AtomicBool,
}

#[allow(dead_code)]
impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    fn field(&self, suffix: &str, key: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(topic, _)| topic.ends_with(suffix))
            .filter_map(|(_, v)| v[key].as_str().map(str::to_owned))
            .collect()
    }

    /// Commands published on the control topic, in order.
    pub fn commands(&self) -> Vec<String> {
        self.field("/control", "command")
    }

    /// Alarm messages published on the alarm topic, in order.
    pub fn alarms(&self) -> Vec<String> {
        self.field("/alarm", "message")
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        if topic.ends_with("/control") && self.control_down.load(Ordering::SeqCst) {
            return Err(BusError::QueueFull);
        }
        let v: Value = serde_json::from_slice(&payload).map_err(|e| BusError::Encode(e.to_string()))?;
        assert!(v["timestamp"].is_string(), "every outbound payload is timestamped");
        self.sent.lock().unwrap().push((topic.to_owned(), v));
        Ok(())
    }
}

// ── FailingStore ──────────────────────────────────────────────

/// An audit store whose disk has gone away.
#[derive(Default)]
pub struct FailingStore {
    pub attempts: Mutex<u32>,
    pub healthy: AtomicBool,
}

impl AuditStore for FailingStore {
    fn append_reading(&self, _: &Reading) -> Result<i64, StoreError> {
        *self.attempts.lock().unwrap() += 1;
        if self.healthy.load(Ordering::SeqCst) { Ok(1) } else { Err(StoreError::Closed) }
    }

    fn append_alarm(&self, _: &str, _: DateTime<Utc>) -> Result<i64, StoreError> {
        *self.attempts.lock().unwrap() += 1;
        if self.healthy.load(Ordering::SeqCst) { Ok(1) } else { Err(StoreError::Closed) }
    }

    fn recent_readings(&self, _: usize) -> Result<Vec<Reading>, StoreError> {
        Err(StoreError::Closed)
    }

    fn recent_alarms(&self, _: usize) -> Result<Vec<AlarmEvent>, StoreError> {
        Err(StoreError::Closed)
    }
}

// ── Effect helpers ────────────────────────────────────────────

#[allow(dead_code)]
pub fn commands(effects: &[Effect]) -> Vec<&'static str> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Command(c) => Some(c.as_str()),
            _ => None,
        })
        .collect()
}

#[allow(dead_code)]
pub fn alarms(effects: &[Effect]) -> Vec<&str> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Alarm(m) => Some(m.as_str()),
            _ => None,
        })
        .collect()
}
