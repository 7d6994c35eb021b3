//! Inter-thread channels of the controller runtime.
//!
//! Bounded `embassy-sync` channels connect the bus producers to the engine
//! thread and the engine thread to the dispatcher.  They are owned by the
//! [`Controller`](super::Controller) rather than stored in statics, so any
//! number of controllers (one per test) can coexist in a process.
//!
//! ```text
//! ┌──────────────┐  EngineMsg  ┌──────────────┐  Outbound  ┌──────────────┐
//! │  Bus link /  │────────────▶│    Engine    │───────────▶│  Dispatcher  │
//! │  producers   │             │   (thread)   │            │   (thread)   │
//! └──────────────┘             └──────────────┘            └──────────────┘
//! ```

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use crate::app::events::BusEvent;
use crate::app::ports::Effect;
use crate::app::state::EnvironmentState;

/// Inbox depth: events waiting for the engine.
pub const INBOX_DEPTH: usize = 32;

/// Outbox depth: effects waiting for the dispatcher.
pub const OUTBOX_DEPTH: usize = 64;

/// One-shot reply slot for a state snapshot.
pub type SnapshotReply = Signal<CriticalSectionRawMutex, EnvironmentState>;

/// Raised by the dispatcher once the final effect has been applied.
pub type DrainSignal = Signal<CriticalSectionRawMutex, ()>;

/// Message to the engine thread.
pub enum EngineMsg {
    Event(BusEvent),
    Snapshot(Arc<SnapshotReply>),
    /// Finish what is queued, then stop.
    Shutdown,
}

/// Message to the dispatcher thread.
pub enum Outbound {
    Effect(Effect),
    /// The engine has stopped; nothing follows.
    Drained,
}

pub type Inbox = Channel<CriticalSectionRawMutex, EngineMsg, INBOX_DEPTH>;
pub type Outbox = Channel<CriticalSectionRawMutex, Outbound, OUTBOX_DEPTH>;
