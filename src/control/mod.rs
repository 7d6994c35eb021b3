//! Control policy.

pub mod hysteresis;

pub use hysteresis::{ACTIVATE_DELTA_C, DEACTIVATE_DELTA_C, Decision, decide};
