//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no broker
//! required; the audit store is SQLite in memory.

mod alarm_pipeline_tests;
mod engine_scenarios;
mod mock_bus;
