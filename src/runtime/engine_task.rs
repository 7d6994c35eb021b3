//! Engine thread and its producer handle.
//!
//! The [`ControlEngine`] lives on one dedicated thread and is touched by
//! nothing else.  Producers reach it through an [`EngineHandle`], which
//! pushes into the bounded inbox and waits at most `submit_timeout` for
//! room.  The engine never performs I/O: every effect it decides goes to
//! the outbox for the dispatcher.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────┐
//!  │  Engine Thread                                   │
//!  │  futures_lite::block_on                          │
//!  │   └─ edge_executor::LocalExecutor                │
//!  │       └─ run_engine: inbox.receive().await       │
//!  │            ├─ Event    → handle → outbox.send    │
//!  │            ├─ Snapshot → reply.signal            │
//!  │            └─ Shutdown → drain, send Drained     │
//!  └──────────────────────────────────────────────────┘
//! ```

use core::future::Future;
use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use async_io_mini::Timer;
use embassy_sync::signal::Signal;
use log::{debug, info, warn};

use super::channels::{EngineMsg, Inbox, Outbound, Outbox};
use crate::app::events::BusEvent;
use crate::app::service::ControlEngine;
use crate::app::state::EnvironmentState;
use crate::error::SubmitError;

/// Drive `fut` on the calling thread for at most `timeout`.
pub(crate) fn block_on_timeout<F: Future>(fut: F, timeout: Duration) -> Option<F::Output> {
    futures_lite::future::block_on(futures_lite::future::or(
        async { Some(fut.await) },
        async {
            Timer::after(timeout).await;
            None
        },
    ))
}

// ── Producer handle ──────────────────────────────────────────

/// Cloneable entry point into the engine.  Safe to use from any thread.
#[derive(Clone)]
pub struct EngineHandle {
    inbox: Arc<Inbox>,
    accepting: Arc<AtomicBool>,
    submit_timeout: Duration,
}

impl EngineHandle {
    pub(crate) fn new(inbox: Arc<Inbox>, submit_timeout: Duration) -> Self {
        Self {
            inbox,
            accepting: Arc::new(AtomicBool::new(true)),
            submit_timeout,
        }
    }

    /// Queue an event, waiting up to the submit timeout for inbox room.
    pub fn submit(&self, event: BusEvent) -> Result<(), SubmitError> {
        if !self.is_open() {
            return Err(SubmitError::Closed);
        }
        match block_on_timeout(self.inbox.send(EngineMsg::Event(event)), self.submit_timeout) {
            Some(()) => Ok(()),
            None => {
                warn!("ENGINE | inbox full for {:?}, dropping {} event", self.submit_timeout, event.kind());
                Err(SubmitError::Full)
            }
        }
    }

    /// Queue an event only if there is room right now.
    pub fn try_submit(&self, event: BusEvent) -> Result<(), SubmitError> {
        if !self.is_open() {
            return Err(SubmitError::Closed);
        }
        self.inbox
            .try_send(EngineMsg::Event(event))
            .map_err(|_| SubmitError::Full)
    }

    /// Ask the engine for a copy of its state.  `None` if it is closed or
    /// does not answer within `timeout`.
    pub fn snapshot(&self, timeout: Duration) -> Option<EnvironmentState> {
        if !self.is_open() {
            return None;
        }
        let reply = Arc::new(Signal::new());
        let request = async {
            self.inbox.send(EngineMsg::Snapshot(reply.clone())).await;
            reply.wait().await
        };
        block_on_timeout(request, timeout)
    }

    /// Stop accepting events.  Events already queued are still applied.
    pub fn close(&self) {
        if self.accepting.swap(false, Ordering::AcqRel) {
            info!("ENGINE | closed to new events");
        }
    }

    pub fn is_open(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Enqueue the stop marker behind everything already accepted.
    pub(crate) fn send_shutdown(&self, timeout: Duration) -> bool {
        block_on_timeout(self.inbox.send(EngineMsg::Shutdown), timeout).is_some()
    }
}

// ── Engine loop ──────────────────────────────────────────────

async fn apply(engine: &mut ControlEngine, msg: EngineMsg, outbox: &Outbox) -> bool {
    match msg {
        EngineMsg::Event(event) => {
            let mut effects = Vec::new();
            engine.handle(event, &mut effects);
            for effect in effects {
                outbox.send(Outbound::Effect(effect)).await;
            }
            true
        }
        EngineMsg::Snapshot(reply) => {
            reply.signal(engine.snapshot());
            true
        }
        EngineMsg::Shutdown => false,
    }
}

/// Apply inbox messages in arrival order until `Shutdown`, then finish
/// whatever is still queued and tell the dispatcher nothing follows.
pub(crate) async fn run_engine(mut engine: ControlEngine, inbox: Arc<Inbox>, outbox: Arc<Outbox>) -> ControlEngine {
    loop {
        let msg = inbox.receive().await;
        if !apply(&mut engine, msg, &outbox).await {
            break;
        }
    }

    let mut leftovers = 0usize;
    while let Ok(msg) = inbox.try_receive() {
        apply(&mut engine, msg, &outbox).await;
        leftovers += 1;
    }
    if leftovers > 0 {
        debug!("ENGINE | drained {leftovers} queued messages");
    }

    outbox.send(Outbound::Drained).await;
    info!(
        "ENGINE | stopped after {} events (link {:?})",
        engine.events_handled(),
        engine.link()
    );
    engine
}

/// Spawn the engine thread.  The join handle yields the final engine.
pub(crate) fn spawn(
    engine: ControlEngine,
    inbox: Arc<Inbox>,
    outbox: Arc<Outbox>,
) -> std::io::Result<JoinHandle<ControlEngine>> {
    std::thread::Builder::new()
        .name("ac-engine".into())
        .spawn(move || {
            let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
            futures_lite::future::block_on(executor.run(run_engine(engine, inbox, outbox)))
        })
}

// ── Tests ────────────────────────────────────────────────────
