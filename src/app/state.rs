//! Environment state owned by the control engine, and the reading record
//! derived from it.
//!
//! Every measurement is an `Option`: "not yet reported" is never folded
//! into zero, and the actuator has an explicit `Unknown` state until either
//! the engine commands it or the relay reports in.

use chrono::{DateTime, SecondsFormat, Utc};

/// Last known actuator (AC relay) state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActuatorState {
    /// No command sent and no status received since startup.
    #[default]
    Unknown,
    Off,
    On,
}

impl ActuatorState {
    pub fn from_on(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }

    /// Policy view: an unknown actuator is treated as off.
    pub fn is_on(self) -> bool {
        self == Self::On
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Off => "OFF",
            Self::On => "ON",
        }
    }
}

/// Point-in-time copy of everything the engine knows.
///
/// Handed out by value; readers never see the live state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvironmentState {
    /// Latest temperature (°C).
    pub temperature: Option<f64>,
    /// Latest relative humidity (%). Informational only.
    pub humidity: Option<f64>,
    /// Target temperature (°C).
    pub setpoint: Option<f64>,
    pub actuator: ActuatorState,
}

/// One audit-log row.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub setpoint: Option<f64>,
    pub actuator_on: bool,
}

impl Reading {
    pub fn capture(state: &EnvironmentState, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at,
            temperature: state.temperature,
            humidity: state.humidity,
            setpoint: state.setpoint,
            actuator_on: state.actuator.is_on(),
        }
    }
}

/// ISO-8601 / RFC 3339 rendering used on the wire and in the store.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
