//! Alarm/audit sink.
//!
//! Every alarm goes three places: the audit store, the bus alarm topic, and
//! a bounded in-memory history for display collaborators.  The deliveries
//! are independent: a store failure never stops the bus publish, and a
//! failed publish never stops the store write.  Nothing is retried here;
//! the bus client and the store own their own recovery.
//!
//! When the store starts failing, one degraded-mode alarm is published to
//! the bus (never written to the store) and the sink stays quiet about
//! further failures until a write succeeds again.

use core::cell::RefCell;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use embassy_sync::blocking_mutex::CriticalSectionMutex;
use heapless::HistoryBuffer;
use log::{error, info, warn};

use crate::app::ports::{AuditStore, Publisher};
use crate::bus::codec::encode_alarm;
use crate::error::StoreError;

/// Alarms kept in memory for display.
pub const ALARM_HISTORY_LEN: usize = 64;

/// One raised alarm.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmEvent {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Store-assigned id; `None` if the store write failed.
    pub sequence_id: Option<i64>,
}

// ── History ring ─────────────────────────────────────────────

type Ring = HistoryBuffer<AlarmEvent, ALARM_HISTORY_LEN>;

/// Shared, bounded alarm history.  Oldest entries are overwritten.
#[derive(Clone)]
pub struct AlarmHistory {
    ring: Arc<CriticalSectionMutex<RefCell<Ring>>>,
}

impl AlarmHistory {
    pub fn new() -> Self {
        Self {
            ring: Arc::new(CriticalSectionMutex::new(RefCell::new(HistoryBuffer::new()))),
        }
    }

    fn push(&self, event: AlarmEvent) {
        self.ring.lock(|ring| ring.borrow_mut().write(event));
    }

    /// Up to `limit` alarms, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<AlarmEvent> {
        self.ring.lock(|ring| {
            let ring = ring.borrow();
            let mut out: Vec<AlarmEvent> = ring.oldest_ordered().cloned().collect();
            out.reverse();
            out.truncate(limit);
            out
        })
    }

    pub fn len(&self) -> usize {
        self.ring.lock(|ring| ring.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AlarmHistory {
    fn default() -> Self {
        Self::new()
    }
}

// ── Sink ─────────────────────────────────────────────────────

pub struct AlarmSink<S, P> {
    store: Arc<S>,
    publisher: Arc<P>,
    topic: String,
    history: AlarmHistory,
    store_degraded: bool,
}

impl<S: AuditStore, P: Publisher> AlarmSink<S, P> {
    pub fn new(store: Arc<S>, publisher: Arc<P>, topic: impl Into<String>, history: AlarmHistory) -> Self {
        Self {
            store,
            publisher,
            topic: topic.into(),
            history,
            store_degraded: false,
        }
    }

    /// Persist, publish and remember one alarm.
    pub fn raise(&mut self, message: &str) -> AlarmEvent {
        let at = Utc::now();
        info!("ALARM | {message}");

        let sequence_id = match self.store.append_alarm(message, at) {
            Ok(id) => {
                self.mark_store_healthy();
                Some(id)
            }
            Err(e) => {
                warn!("ALARM | store write failed: {e}");
                self.report_store_failure(&e);
                None
            }
        };

        self.publish(message, at);

        let event = AlarmEvent {
            timestamp: at,
            message: message.to_owned(),
            sequence_id,
        };
        self.history.push(event.clone());
        event
    }

    /// Surface a store failure as a bus-only alarm, once per outage.
    pub fn report_store_failure(&mut self, err: &StoreError) {
        if self.store_degraded {
            return;
        }
        self.store_degraded = true;

        let at = Utc::now();
        let message = format!("Audit store unavailable: {err}");
        error!("ALARM | {message}");
        self.publish(&message, at);
        self.history.push(AlarmEvent {
            timestamp: at,
            message,
            sequence_id: None,
        });
    }

    /// Any successful store write ends the outage.
    pub fn mark_store_healthy(&mut self) {
        if self.store_degraded {
            self.store_degraded = false;
            info!("ALARM | audit store recovered");
        }
    }

    pub fn is_store_degraded(&self) -> bool {
        self.store_degraded
    }

    pub fn history(&self) -> &AlarmHistory {
        &self.history
    }

    fn publish(&self, message: &str, at: DateTime<Utc>) {
        let result = encode_alarm(message, at).and_then(|payload| self.publisher.publish(&self.topic, payload));
        if let Err(e) = result {
            warn!("ALARM | publish to {} failed: {e}", self.topic);
        }
    }
}
