//! Temperature safety limits.
//!
//! Two checks run on every policy evaluation, independently of the
//! hysteresis band:
//!
//! 1. **High-temperature alert** at [`HIGH_TEMP_ALERT_C`]: informational,
//!    raised on every evaluation while the room stays that hot.
//! 2. **Emergency override** at [`EMERGENCY_ON_C`]: forces the relay on if
//!    it is still off *after* the hysteresis step has run, whatever the
//!    setpoint says.
//!
//! The override is evaluated against the post-hysteresis actuator state, so
//! an evaluation that already switched the relay on never issues a second
//! "on" command.

/// Temperature (°C) at or above which a high-temperature alarm is raised.
pub const HIGH_TEMP_ALERT_C: f64 = 30.0;

/// Temperature (°C) at or above which the relay is forced on.
pub const EMERGENCY_ON_C: f64 = 35.0;

pub fn high_temperature(temperature: f64) -> bool {
    temperature >= HIGH_TEMP_ALERT_C
}

/// True if the relay must be forced on right now.
pub fn emergency_override(temperature: f64, actuator_on: bool) -> bool {
    temperature >= EMERGENCY_ON_C && !actuator_on
}
