//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlEngine (domain)
//! ```
//!
//! The engine itself only ever talks to an [`EffectSink`]: it decides, the
//! sink records what was decided.  The runtime's dispatcher then carries the
//! effects out through [`Publisher`] (the bus) and [`AuditStore`] (the audit
//! log), off the engine's thread.
//!
//! All port errors are typed; callers must handle every variant explicitly.

use chrono::{DateTime, Utc};

use super::commands::ActuatorCommand;
use super::state::Reading;
use crate::alarm::AlarmEvent;
use crate::error::{BusError, StoreError};

// ───────────────────────────────────────────────────────────────
// Effects (domain → dispatcher)
// ───────────────────────────────────────────────────────────────

/// Something the engine decided must happen in the outside world.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Publish a command on the control topic.
    Command(ActuatorCommand),
    /// Raise an alarm through the alarm/audit sink.
    Alarm(String),
    /// Append a reading to the audit store.
    Reading(Reading),
}

/// Receives effects in the order the engine emits them.
pub trait EffectSink {
    fn emit(&mut self, effect: Effect);
}

impl EffectSink for Vec<Effect> {
    fn emit(&mut self, effect: Effect) {
        self.push(effect);
    }
}

// ───────────────────────────────────────────────────────────────
// Publisher port (domain → bus)
// ───────────────────────────────────────────────────────────────

/// Outbound half of the bus client.
///
/// Implementations must not block indefinitely: a full request queue is
/// reported as [`BusError::QueueFull`], not waited out.  Delivery is QoS 1.
pub trait Publisher: Send + Sync {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError>;
}

// ───────────────────────────────────────────────────────────────
// Audit store port (domain ↔ persistence)
// ───────────────────────────────────────────────────────────────

/// Append-only audit log of readings and alarms.
///
/// - Safe to call from several threads at once.
/// - Writes are committed before the call returns.
/// - Ordering is by insertion (auto-increment id), never by timestamp, so
///   clock skew between writers cannot reorder the log.
pub trait AuditStore: Send + Sync {
    /// Append a reading; returns its row id.
    fn append_reading(&self, reading: &Reading) -> Result<i64, StoreError>;

    /// Append an alarm; returns its sequence id.
    fn append_alarm(&self, message: &str, at: DateTime<Utc>) -> Result<i64, StoreError>;

    /// Up to `limit` readings, most recent first.
    fn recent_readings(&self, limit: usize) -> Result<Vec<Reading>, StoreError>;

    /// Up to `limit` alarms, most recent first.
    fn recent_alarms(&self, limit: usize) -> Result<Vec<AlarmEvent>, StoreError>;
}
