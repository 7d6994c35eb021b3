//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter        | Implements   | Connects to                 |
//! |----------------|--------------|-----------------------------|
//! | `mqtt`         | Publisher    | MQTT broker (rumqttc)       |
//! |                | event source | engine inbox via link thread|
//! | `sqlite_store` | AuditStore   | SQLite file or in-memory db |

pub mod mqtt;
pub mod sqlite_store;

pub use mqtt::{LinkThread, MqttBus, MqttLink};
pub use sqlite_store::SqliteStore;
