//! Unified error types for the SmartAC controller.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! binary's error handling uniform.  Library code mostly deals with the
//! narrower sub-enums: none of them is fatal to the control loop, each is
//! logged and absorbed at the component boundary that raised it.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug)]
pub enum Error {
    /// An inbound bus payload could not be decoded.
    Decode(DecodeError),
    /// The bus client failed to publish or connect.
    Bus(BusError),
    /// The audit store rejected a read or write.
    Store(StoreError),
    /// Configuration is invalid or could not be parsed.
    Config(ConfigError),
    /// A worker thread could not be spawned.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Store(StoreError::Sqlite(e)) => Some(e),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

/// Errors turning a raw bus payload into a typed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload was not valid JSON or a field had the wrong type.
    Malformed(String),
    /// A required field was absent.
    MissingField(&'static str),
    /// A status payload carried something other than `on` / `off`.
    InvalidState(String),
    /// A numeric field was NaN or infinite.
    NonFinite(&'static str),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "malformed payload: {msg}"),
            Self::MissingField(field) => write!(f, "missing field `{field}`"),
            Self::InvalidState(state) => write!(f, "invalid actuator state {state:?}"),
            Self::NonFinite(field) => write!(f, "field `{field}` is not finite"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The client's outbound request queue is full.
    QueueFull,
    /// The client has been shut down and no longer accepts requests.
    Closed,
    /// Serialising an outbound payload failed.
    Encode(String),
    /// Any other client-side failure, with the library's description.
    Client(String),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "request queue full"),
            Self::Closed => write!(f, "client closed"),
            Self::Encode(msg) => write!(f, "encode failed: {msg}"),
            Self::Client(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for BusError {}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StoreError {
    /// SQLite reported an error.
    Sqlite(rusqlite::Error),
    /// A previous writer panicked while holding the connection lock.
    Poisoned,
    /// The store has already been closed.
    Closed,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "sqlite: {e}"),
            Self::Poisoned => write!(f, "connection lock poisoned"),
            Self::Closed => write!(f, "store closed"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Engine submission errors
// ---------------------------------------------------------------------------

/// Why an event could not be handed to the control engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The engine is shutting down and accepts no new events.
    Closed,
    /// The inbox stayed full for the whole submit timeout.
    Full,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "engine closed"),
            Self::Full => write!(f, "engine inbox full"),
        }
    }
}

impl std::error::Error for SubmitError {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config document could not be parsed.
    Parse(String),
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "parse failed: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
