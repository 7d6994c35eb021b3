//! Inbound events.
//!
//! The bus client decodes raw messages into [`BusEvent`]s and hands them to
//! the engine.  Link-state changes travel the same path so the engine sees
//! them in order with the telemetry.

/// A decoded message (or connection change) delivered to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BusEvent {
    /// New temperature reading (°C).
    Temperature(f64),
    /// New relative humidity reading (%).
    Humidity(f64),
    /// New target temperature (°C).
    Setpoint(f64),
    /// Authoritative state reported by the relay.
    Status { on: bool },
    /// The bus connection came up or went down.
    Link(LinkState),
}

impl BusEvent {
    /// Short tag for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Temperature(_) => "temperature",
            Self::Humidity(_) => "humidity",
            Self::Setpoint(_) => "setpoint",
            Self::Status { .. } => "status",
            Self::Link(_) => "link",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Up,
    Down,
}
