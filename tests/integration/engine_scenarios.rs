//! Control-engine scenarios: inbound events → commands and alarms.
//!
//! Drives the pure engine with a `Vec<Effect>` sink, so every decision can
//! be asserted in order without threads or I/O.

use crate::mock_bus::{alarms, commands};

use smartac::app::events::BusEvent;
use smartac::app::ports::Effect;
use smartac::app::service::ControlEngine;
use smartac::app::state::{ActuatorState, EnvironmentState};

fn engine(temperature: Option<f64>, setpoint: Option<f64>, actuator: ActuatorState) -> ControlEngine {
    ControlEngine::with_state(EnvironmentState {
        temperature,
        setpoint,
        actuator,
        ..EnvironmentState::default()
    })
}

fn run(engine: &mut ControlEngine, events: &[BusEvent]) -> Vec<Effect> {
    let mut out = Vec::new();
    for ev in events {
        engine.handle(*ev, &mut out);
    }
    out
}

// ── Hysteresis band ──────────────────────────────────────────

#[test]
fn five_degrees_above_setpoint_turns_ac_on_once() {
    let mut e = engine(None, Some(22.0), ActuatorState::Off);
    let out = run(&mut e, &[BusEvent::Temperature(27.0)]);

    assert_eq!(commands(&out), ["on"]);
    let activations = alarms(&out)
        .into_iter()
        .filter(|m| m.starts_with("Auto-activating AC"))
        .count();
    assert_eq!(activations, 1);
    assert_eq!(e.snapshot().actuator, ActuatorState::On);
}

#[test]
fn one_degree_below_setpoint_turns_ac_off() {
    let mut e = engine(None, Some(22.0), ActuatorState::On);
    let out = run(&mut e, &[BusEvent::Temperature(21.0)]);

    assert_eq!(commands(&out), ["off"]);
    assert_eq!(
        alarms(&out),
        ["Auto-deactivating AC: Temperature (21.0\u{00b0}C) is below setpoint (22.0\u{00b0}C)"]
    );
    assert_eq!(e.snapshot().actuator, ActuatorState::Off);
}

#[test]
fn inside_band_issues_nothing() {
    for actuator in [ActuatorState::Off, ActuatorState::On, ActuatorState::Unknown] {
        let mut e = engine(None, Some(22.0), actuator);
        let out = run(
            &mut e,
            &[BusEvent::Temperature(21.5), BusEvent::Temperature(26.9), BusEvent::Temperature(22.0)],
        );
        assert!(commands(&out).is_empty(), "{actuator:?}");
        assert_eq!(e.snapshot().actuator, actuator);
    }
}

#[test]
fn setpoint_change_reevaluates() {
    let mut e = engine(Some(26.0), Some(24.0), ActuatorState::Off);
    let out = run(&mut e, &[BusEvent::Setpoint(20.0)]);
    assert_eq!(commands(&out), ["on"]);
    assert_eq!(e.snapshot().setpoint, Some(20.0));
}

// ── Status reports ───────────────────────────────────────────

#[test]
fn duplicate_status_alarms_at_most_once() {
    let mut e = engine(None, None, ActuatorState::Off);
    let out = run(&mut e, &[BusEvent::Status { on: true }, BusEvent::Status { on: true }]);
    assert_eq!(alarms(&out), ["AC status changed to: ON"]);
    assert!(commands(&out).is_empty());
}

#[test]
fn status_overrides_optimistic_state() {
    let mut e = engine(None, Some(22.0), ActuatorState::Off);
    run(&mut e, &[BusEvent::Temperature(28.0)]);
    assert_eq!(e.snapshot().actuator, ActuatorState::On);

    // The relay never switched: its report wins, and nothing is re-sent.
    let out = run(&mut e, &[BusEvent::Status { on: false }]);
    assert_eq!(e.snapshot().actuator, ActuatorState::Off);
    assert_eq!(alarms(&out), ["AC status changed to: OFF"]);
    assert!(commands(&out).is_empty());
}

// ── Safety ───────────────────────────────────────────────────

#[test]
fn very_hot_room_switches_on_exactly_once() {
    let mut e = engine(None, Some(24.0), ActuatorState::Off);
    let out = run(&mut e, &[BusEvent::Temperature(36.0)]);

    assert_eq!(commands(&out), ["on"], "hysteresis already switched on; no override");
    assert_eq!(e.snapshot().actuator, ActuatorState::On);
    assert!(!alarms(&out).iter().any(|m| m.starts_with("EMERGENCY")));
}

#[test]
fn override_silent_when_already_on() {
    let mut e = engine(None, Some(24.0), ActuatorState::On);
    let out = run(&mut e, &[BusEvent::Temperature(36.0)]);
    assert!(commands(&out).is_empty());
    assert_eq!(alarms(&out), ["High temperature alert: 36.0\u{00b0}C"]);
}

#[test]
fn override_forces_on_above_high_setpoint() {
    // 36 °C against a 40 °C setpoint is inside the band; safety wins anyway.
    let mut e = engine(None, Some(40.0), ActuatorState::Off);
    let out = run(&mut e, &[BusEvent::Temperature(36.0)]);

    assert_eq!(commands(&out), ["on"]);
    assert_eq!(
        alarms(&out),
        [
            "High temperature alert: 36.0\u{00b0}C",
            "EMERGENCY: Force turning AC ON due to very high temperature: 36.0\u{00b0}C",
        ]
    );
    assert_eq!(e.snapshot().actuator, ActuatorState::On);
}

#[test]
fn override_undoes_deactivation_in_the_same_evaluation() {
    let mut e = engine(None, Some(40.0), ActuatorState::On);
    let out = run(&mut e, &[BusEvent::Temperature(36.0)]);
    assert_eq!(commands(&out), ["off", "on"]);
    assert_eq!(e.snapshot().actuator, ActuatorState::On);
}

#[test]
fn high_temperature_alert_without_command() {
    let mut e = engine(None, Some(29.0), ActuatorState::Off);
    let out = run(&mut e, &[BusEvent::Temperature(31.0)]);
    assert_eq!(alarms(&out), ["High temperature alert: 31.0\u{00b0}C"]);
    assert!(commands(&out).is_empty());
}

// ── Missing inputs ───────────────────────────────────────────

#[test]
fn temperature_without_setpoint_is_a_no_op() {
    let mut e = ControlEngine::new();
    let out = run(&mut e, &[BusEvent::Temperature(40.0)]);
    assert!(commands(&out).is_empty());
    assert!(alarms(&out).is_empty(), "no setpoint, no evaluation at all");
    // The reading is still audited.
    assert!(matches!(out.as_slice(), [Effect::Reading(r)] if r.setpoint.is_none()));
}

// ── End-to-end sequence ──────────────────────────────────────

#[test]
fn warm_up_then_cool_down() {
    let mut e = ControlEngine::new();

    let out = run(&mut e, &[BusEvent::Setpoint(22.0), BusEvent::Temperature(20.0)]);
    assert!(commands(&out).is_empty());

    let out = run(&mut e, &[BusEvent::Temperature(28.0)]);
    assert_eq!(commands(&out), ["on"]);

    let out = run(&mut e, &[BusEvent::Temperature(20.0)]);
    assert_eq!(commands(&out), ["off"]);
    assert_eq!(e.snapshot().actuator, ActuatorState::Off);
    assert_eq!(e.events_handled(), 4);
}
