//! JSON payload codec.
//!
//! Inbound payloads are topic-specific: measurement topics carry a numeric
//! `value`, the status topic carries a string `state`.  Both may carry a
//! `timestamp` and an `originId`, which are informational only.  Outbound
//! payloads are `{command, timestamp}` and `{message, timestamp}`.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::topics::InboundTopic;
use crate::app::commands::ActuatorCommand;
use crate::app::events::BusEvent;
use crate::app::state::format_timestamp;
use crate::error::{BusError, DecodeError};

// ── Inbound ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MeasurementPayload {
    value: Option<f64>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default, rename = "originId")]
    origin_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    state: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default, rename = "originId")]
    origin_id: Option<Value>,
}

/// Decode one payload received on a consumed topic.
pub fn decode(kind: InboundTopic, payload: &[u8]) -> Result<BusEvent, DecodeError> {
    match kind {
        InboundTopic::Temperature => decode_value(payload).map(BusEvent::Temperature),
        InboundTopic::Humidity => decode_value(payload).map(BusEvent::Humidity),
        InboundTopic::Setpoint => decode_value(payload).map(BusEvent::Setpoint),
        InboundTopic::Status => decode_status(payload).map(|on| BusEvent::Status { on }),
    }
}

fn decode_value(payload: &[u8]) -> Result<f64, DecodeError> {
    let p: MeasurementPayload =
        serde_json::from_slice(payload).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    debug!("payload ts={:?} origin={:?}", p.timestamp, p.origin_id);

    let value = p.value.ok_or(DecodeError::MissingField("value"))?;
    if !value.is_finite() {
        return Err(DecodeError::NonFinite("value"));
    }
    Ok(value)
}

fn decode_status(payload: &[u8]) -> Result<bool, DecodeError> {
    let p: StatusPayload =
        serde_json::from_slice(payload).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    debug!("payload ts={:?} origin={:?}", p.timestamp, p.origin_id);

    let state = p.state.ok_or(DecodeError::MissingField("state"))?;
    if state.eq_ignore_ascii_case("on") {
        Ok(true)
    } else if state.eq_ignore_ascii_case("off") {
        Ok(false)
    } else {
        Err(DecodeError::InvalidState(state))
    }
}

// ── Outbound ─────────────────────────────────────────────────

#[derive(Serialize)]
struct ControlPayload<'a> {
    command: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct AlarmPayload<'a> {
    message: &'a str,
    timestamp: String,
}

pub fn encode_command(cmd: ActuatorCommand, at: DateTime<Utc>) -> Result<Vec<u8>, BusError> {
    serde_json::to_vec(&ControlPayload {
        command: cmd.as_str(),
        timestamp: format_timestamp(at),
    })
    .map_err(|e| BusError::Encode(e.to_string()))
}

pub fn encode_alarm(message: &str, at: DateTime<Utc>) -> Result<Vec<u8>, BusError> {
    serde_json::to_vec(&AlarmPayload {
        message,
        timestamp: format_timestamp(at),
    })
    .map_err(|e| BusError::Encode(e.to_string()))
}
