//! Effect dispatcher.
//!
//! Carries the engine's decisions out into the world, one effect at a time
//! and in the order they were decided:
//!
//! - `Command`: encode and publish on the control topic.  A publish that
//!   reaches the bus is audited as a `Sent AC command` alarm.  A failed one
//!   becomes an `Error publishing AC command` alarm; the engine's optimistic
//!   actuator state is left as is.
//! - `Alarm`: hand to the [`AlarmSink`].
//! - `Reading`: append to the audit store.
//!
//! Failures are logged and absorbed here so the engine never waits on I/O.

use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::Utc;
use log::{debug, info, warn};

use super::channels::{DrainSignal, Outbound, Outbox};
use crate::alarm::{AlarmHistory, AlarmSink};
use crate::app::commands::ActuatorCommand;
use crate::app::ports::{AuditStore, Effect, Publisher};
use crate::app::state::Reading;
use crate::bus::codec::encode_command;
use crate::bus::topics::Topics;

pub struct Dispatcher<S, P> {
    store: Arc<S>,
    publisher: Arc<P>,
    control_topic: String,
    alarms: AlarmSink<S, P>,
}

impl<S: AuditStore, P: Publisher> Dispatcher<S, P> {
    pub fn new(store: Arc<S>, publisher: Arc<P>, topics: &Topics, history: AlarmHistory) -> Self {
        let alarms = AlarmSink::new(store.clone(), publisher.clone(), topics.alarm.clone(), history);
        Self {
            store,
            publisher,
            control_topic: topics.control.clone(),
            alarms,
        }
    }

    pub fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Command(cmd) => self.send_command(cmd),
            Effect::Alarm(message) => {
                self.alarms.raise(&message);
            }
            Effect::Reading(reading) => self.record(&reading),
        }
    }

    fn send_command(&mut self, cmd: ActuatorCommand) {
        let result = encode_command(cmd, Utc::now())
            .and_then(|payload| self.publisher.publish(&self.control_topic, payload));
        match result {
            Ok(()) => {
                info!("DISPATCH | sent {cmd} to {}", self.control_topic);
                self.alarms.raise(&format!("Sent AC command: {cmd}"));
            }
            Err(e) => {
                warn!("DISPATCH | command {cmd} not sent: {e}");
                self.alarms.raise(&format!("Error publishing AC command: {e}"));
            }
        }
    }

    fn record(&mut self, reading: &Reading) {
        match self.store.append_reading(reading) {
            Ok(id) => {
                debug!("DISPATCH | reading #{id} stored");
                self.alarms.mark_store_healthy();
            }
            Err(e) => {
                warn!("DISPATCH | reading not stored: {e}");
                self.alarms.report_store_failure(&e);
            }
        }
    }

    pub fn is_store_degraded(&self) -> bool {
        self.alarms.is_store_degraded()
    }

    /// Apply outbox effects until the engine reports it has drained.
    pub async fn run(mut self, outbox: Arc<Outbox>, drained: Arc<DrainSignal>) {
        loop {
            match outbox.receive().await {
                Outbound::Effect(effect) => self.apply(effect),
                Outbound::Drained => break,
            }
        }
        info!("DISPATCH | drained");
        drained.signal(());
    }
}

/// Spawn the dispatcher thread.
pub(crate) fn spawn<S, P>(
    dispatcher: Dispatcher<S, P>,
    outbox: Arc<Outbox>,
    drained: Arc<DrainSignal>,
) -> std::io::Result<JoinHandle<()>>
where
    S: AuditStore + 'static,
    P: Publisher + 'static,
{
    std::thread::Builder::new()
        .name("ac-dispatch".into())
        .spawn(move || {
            let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
            futures_lite::future::block_on(executor.run(dispatcher.run(outbox, drained)));
        })
}
