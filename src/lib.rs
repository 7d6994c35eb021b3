//! SmartAC controller library.
//!
//! A hysteresis control loop for an air-conditioning relay, driven by
//! telemetry arriving over MQTT and audited to SQLite.  The binary in
//! `main.rs` only wires these pieces together; everything here is usable
//! (and tested) without a broker.

#![deny(unused_must_use)]

pub mod adapters;
pub mod alarm;
pub mod app;
pub mod bus;
pub mod config;
pub mod control;
pub mod error;
pub mod os_signals;
pub mod runtime;
pub mod safety;

pub use error::{Error, Result};
