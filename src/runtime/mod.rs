//! Controller runtime: the engine and dispatcher threads and their wiring.
//!
//! ```text
//!  producers ──submit──▶ [inbox] ──▶ engine thread ──▶ [outbox] ──▶ dispatcher thread
//!                                     ControlEngine                 Publisher · AuditStore
//! ```
//!
//! Shutdown order: close the handle, queue `Shutdown` behind the accepted
//! events, wait for the dispatcher to apply the final effect, then join.
//! Anything still stuck when the grace period expires is abandoned.

pub mod channels;
pub mod dispatch;
pub mod engine_task;

use core::time::Duration;
use std::sync::Arc;
use std::thread::JoinHandle;

use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use log::{error, info, warn};

pub use dispatch::Dispatcher;
pub use engine_task::EngineHandle;

use self::channels::DrainSignal;
use self::engine_task::block_on_timeout;
use crate::alarm::AlarmHistory;
use crate::app::ports::{AuditStore, Publisher};
use crate::app::service::ControlEngine;
use crate::app::state::EnvironmentState;
use crate::bus::topics::Topics;
use crate::error::Result;

/// Grace period used when a controller is dropped without an explicit
/// [`Controller::shutdown`].
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A running control loop.
pub struct Controller {
    handle: EngineHandle,
    history: AlarmHistory,
    drained: Arc<DrainSignal>,
    engine_thread: Option<JoinHandle<ControlEngine>>,
    dispatch_thread: Option<JoinHandle<()>>,
}

impl Controller {
    /// Start from an empty state.
    pub fn start<S, P>(store: Arc<S>, publisher: Arc<P>, topics: &Topics, submit_timeout: Duration) -> Result<Self>
    where
        S: AuditStore + 'static,
        P: Publisher + 'static,
    {
        Self::start_with(ControlEngine::new(), store, publisher, topics, submit_timeout)
    }

    /// Start with a pre-built engine.
    pub fn start_with<S, P>(
        engine: ControlEngine,
        store: Arc<S>,
        publisher: Arc<P>,
        topics: &Topics,
        submit_timeout: Duration,
    ) -> Result<Self>
    where
        S: AuditStore + 'static,
        P: Publisher + 'static,
    {
        let inbox = Arc::new(Channel::new());
        let outbox = Arc::new(Channel::new());
        let drained = Arc::new(Signal::new());
        let history = AlarmHistory::new();

        let dispatcher = Dispatcher::new(store, publisher, topics, history.clone());
        let dispatch_thread = dispatch::spawn(dispatcher, outbox.clone(), drained.clone())?;
        let engine_thread = engine_task::spawn(engine, inbox.clone(), outbox)?;

        info!("RUNTIME | controller started");
        Ok(Self {
            handle: EngineHandle::new(inbox, submit_timeout),
            history,
            drained,
            engine_thread: Some(engine_thread),
            dispatch_thread: Some(dispatch_thread),
        })
    }

    /// A producer handle for the bus link or any other event source.
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Recent alarms, shared with the dispatcher.
    pub fn alarm_history(&self) -> AlarmHistory {
        self.history.clone()
    }

    pub fn snapshot(&self, timeout: Duration) -> Option<EnvironmentState> {
        self.handle.snapshot(timeout)
    }

    pub fn is_running(&self) -> bool {
        self.engine_thread.is_some()
    }

    /// Stop the control loop.
    ///
    /// Events accepted before this call are still applied and their effects
    /// dispatched, within `grace`.  Returns the final state, or `None` if
    /// the loop did not wind down in time (or was already stopped).
    pub fn shutdown(&mut self, grace: Duration) -> Option<EnvironmentState> {
        let engine_thread = self.engine_thread.take()?;
        self.handle.close();

        if !self.handle.send_shutdown(grace) {
            warn!("RUNTIME | engine inbox stuck, abandoning threads");
            return None;
        }

        if block_on_timeout(self.drained.wait(), grace).is_none() {
            warn!("RUNTIME | dispatcher did not drain within {grace:?}, abandoning threads");
            return None;
        }

        if let Some(t) = self.dispatch_thread.take() {
            if t.join().is_err() {
                error!("RUNTIME | dispatcher thread panicked");
            }
        }

        match engine_thread.join() {
            Ok(engine) => {
                info!("RUNTIME | controller stopped");
                Some(engine.snapshot())
            }
            Err(_) => {
                error!("RUNTIME | engine thread panicked");
                None
            }
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if self.is_running() {
            self.shutdown(DEFAULT_SHUTDOWN_GRACE);
        }
    }
}
