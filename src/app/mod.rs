//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the controller: state
//! tracking, hysteresis and safety evaluation.  All interaction with the bus
//! and the audit log happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without a broker or a database.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod state;
