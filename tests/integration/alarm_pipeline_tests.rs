//! Engine effects carried out by the dispatcher against a real (in-memory)
//! SQLite audit store and a recording bus.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::mock_bus::{FailingStore, RecordingPublisher};

use smartac::adapters::SqliteStore;
use smartac::alarm::AlarmHistory;
use smartac::app::events::{BusEvent, LinkState};
use smartac::app::ports::{AuditStore, Effect};
use smartac::app::service::ControlEngine;
use smartac::bus::topics::Topics;
use smartac::runtime::Dispatcher;

fn pipeline<S: AuditStore>(store: Arc<S>) -> (Dispatcher<S, RecordingPublisher>, Arc<RecordingPublisher>, AlarmHistory) {
    let bus = Arc::new(RecordingPublisher::new());
    let history = AlarmHistory::new();
    let d = Dispatcher::new(store, bus.clone(), &Topics::new("smart_ac"), history.clone());
    (d, bus, history)
}

fn feed<S: AuditStore>(d: &mut Dispatcher<S, RecordingPublisher>, engine: &mut ControlEngine, events: &[BusEvent]) {
    for ev in events {
        let mut effects: Vec<Effect> = Vec::new();
        engine.handle(*ev, &mut effects);
        for effect in effects {
            d.apply(effect);
        }
    }
}

#[test]
fn activation_is_commanded_persisted_and_published() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let (mut d, bus, history) = pipeline(store.clone());
    let mut engine = ControlEngine::new();

    feed(&mut d, &mut engine, &[BusEvent::Setpoint(22.0), BusEvent::Temperature(28.0)]);

    assert_eq!(bus.commands(), ["on"]);
    let expected = "Auto-activating AC: Temperature (28.0\u{00b0}C) is 6.0\u{00b0}C above setpoint (22.0\u{00b0}C)";
    assert_eq!(bus.alarms(), [expected, "Sent AC command: on"]);

    let stored = store.recent_alarms(10).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].message, "Sent AC command: on");
    assert_eq!(stored[1].message, expected);
    assert_eq!(history.recent(1)[0].sequence_id, stored[0].sequence_id);

    let readings = store.recent_readings(10).unwrap();
    assert_eq!(readings.len(), 1, "setpoint arrived before any temperature");
    assert!(readings[0].actuator_on);
    assert_eq!(readings[0].temperature, Some(28.0));
}

#[test]
fn alarm_log_keeps_engine_order() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let (mut d, _bus, _) = pipeline(store.clone());
    let mut engine = ControlEngine::new();

    feed(
        &mut d,
        &mut engine,
        &[
            BusEvent::Link(LinkState::Up),
            BusEvent::Setpoint(40.0),
            BusEvent::Temperature(36.0),
            BusEvent::Link(LinkState::Down),
        ],
    );

    let mut messages: Vec<String> = store
        .recent_alarms(10)
        .unwrap()
        .into_iter()
        .map(|a| a.message)
        .collect();
    messages.reverse();
    assert_eq!(
        messages,
        [
            "Controller connected to broker",
            "High temperature alert: 36.0\u{00b0}C",
            "EMERGENCY: Force turning AC ON due to very high temperature: 36.0\u{00b0}C",
            "Sent AC command: on",
            "Controller disconnected from broker",
        ]
    );
}

#[test]
fn failed_command_publish_is_alarmed_not_rolled_back() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let (mut d, bus, _) = pipeline(store.clone());
    bus.control_down.store(true, Ordering::SeqCst);
    let mut engine = ControlEngine::new();

    feed(&mut d, &mut engine, &[BusEvent::Setpoint(22.0), BusEvent::Temperature(28.0)]);

    assert!(bus.commands().is_empty());
    assert!(
        bus.alarms()
            .iter()
            .any(|m| m == "Error publishing AC command: request queue full")
    );
    assert!(engine.snapshot().actuator.is_on(), "optimistic state kept");
}

#[test]
fn dead_store_degrades_once_and_keeps_publishing() {
    let store = Arc::new(FailingStore::default());
    let (mut d, bus, history) = pipeline(store.clone());
    let mut engine = ControlEngine::new();

    feed(
        &mut d,
        &mut engine,
        &[
            BusEvent::Setpoint(22.0),
            BusEvent::Temperature(28.0),
            BusEvent::Temperature(20.0),
        ],
    );

    assert_eq!(bus.commands(), ["on", "off"], "control continues without the store");
    let notices = bus
        .alarms()
        .iter()
        .filter(|m| m.starts_with("Audit store unavailable"))
        .count();
    assert_eq!(notices, 1);
    assert!(d.is_store_degraded());
    assert!(history.len() >= 3);

    store.healthy.store(true, Ordering::SeqCst);
    feed(&mut d, &mut engine, &[BusEvent::Humidity(50.0)]);
    assert!(!d.is_store_degraded());
}
