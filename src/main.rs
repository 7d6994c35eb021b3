//! SmartAC controller: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │   MqttBus (Publisher)        SqliteStore (AuditStore)        │
//! │   MqttLink thread ──submit──▶┐                               │
//! │                              │                               │
//! │  ───────────── Port Trait Boundary ──────────────            │
//! │                              ▼                               │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │  Controller: engine thread ──▶ dispatcher thread   │      │
//! │  │  ControlEngine (hysteresis · safety)               │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `smartac [config.json]`.  Without an argument the built-in
//! defaults are used.  Log level follows `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tracing_subscriber::EnvFilter;

use smartac::adapters::{MqttBus, SqliteStore};
use smartac::config::SystemConfig;
use smartac::os_signals;
use smartac::runtime::Controller;

fn load_config(path: Option<PathBuf>) -> Result<SystemConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let config = SystemConfig::from_json(&text)
                .with_context(|| format!("parsing config {}", path.display()))?;
            info!("Config loaded from {}", path.display());
            config
        }
        None => {
            info!("No config file given, using defaults");
            SystemConfig::default()
        }
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn open_store(path: &Path) -> Result<SqliteStore> {
    match SqliteStore::open(path) {
        Ok(store) => Ok(store),
        Err(e) => {
            warn!("STORE | cannot open {} ({e}), continuing with an in-memory log", path.display());
            SqliteStore::open_in_memory().context("opening in-memory store")
        }
    }
}

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("SmartAC controller v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config(std::env::args_os().nth(1).map(PathBuf::from))?;
    let topics = config.topics.topics();

    // ── 3. Adapters ───────────────────────────────────────────
    let store = Arc::new(open_store(&config.store.path)?);
    let (bus, link) = MqttBus::new(&config.broker, &topics);
    let bus = Arc::new(bus);

    // ── 4. Control loop + bus link ────────────────────────────
    let mut controller = Controller::start(
        store.clone(),
        bus.clone(),
        &topics,
        config.runtime.submit_timeout(),
    )
    .context("starting controller")?;
    let mut link = link.spawn(controller.handle()).context("starting bus link")?;

    info!("Controller running; waiting for SIGINT/SIGTERM");

    // ── 5. Wait for a stop signal ─────────────────────────────
    if let Err(e) = os_signals::block_until_shutdown_signal() {
        error!("Signal handling failed ({e}), shutting down");
    }

    // ── 6. Orderly shutdown ───────────────────────────────────
    let grace = config.runtime.shutdown_grace();
    match controller.shutdown(grace) {
        Some(state) => info!(
            "Final state: temperature={:?} humidity={:?} setpoint={:?} actuator={}",
            state.temperature,
            state.humidity,
            state.setpoint,
            state.actuator.label()
        ),
        None => warn!("Controller did not drain within {grace:?}"),
    }

    if let Err(e) = bus.disconnect() {
        warn!("BUS | disconnect: {e}");
    }
    link.finish(grace);

    match (store.reading_count(), store.last_alarm_id()) {
        (Ok(readings), Ok(last_alarm)) => {
            info!("STORE | {readings} readings logged, last alarm id {last_alarm:?}")
        }
        (Err(e), _) | (_, Err(e)) => warn!("STORE | summary unavailable: {e}"),
    }
    store.close().context("closing store")?;
    info!("Bye");
    Ok(())
}
