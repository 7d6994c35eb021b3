//! Hysteresis decision for the AC relay.
//!
//! Asymmetric band around the setpoint: the relay turns on once the room is
//! [`ACTIVATE_DELTA_C`] above target and only turns off again once it is
//! [`DEACTIVATE_DELTA_C`] below it.  The wide on-threshold and narrow
//! off-threshold keep the relay from chattering near the setpoint.

/// `temperature - setpoint` at or above which an idle AC is switched on.
pub const ACTIVATE_DELTA_C: f64 = 5.0;

/// `temperature - setpoint` at or below which a running AC is switched off.
pub const DEACTIVATE_DELTA_C: f64 = -1.0;

/// Outcome of one hysteresis evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Activate,
    Deactivate,
    Hold,
}

/// Evaluate the band for the current temperature, setpoint and relay state.
pub fn decide(temperature: f64, setpoint: f64, actuator_on: bool) -> Decision {
    let diff = temperature - setpoint;
    if diff >= ACTIVATE_DELTA_C && !actuator_on {
        Decision::Activate
    } else if diff <= DEACTIVATE_DELTA_C && actuator_on {
        Decision::Deactivate
    } else {
        Decision::Hold
    }
}
