//! Topic layout.
//!
//! All six topics derive from one configured base so that broker/topic
//! selection has exactly one source of truth.  Inbound topics are the only
//! demultiplexing key for payloads.

/// Which consumed topic a message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundTopic {
    Temperature,
    Humidity,
    Setpoint,
    Status,
}

/// Fully-qualified topic names for one controller instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub temperature: String,
    pub humidity: String,
    pub setpoint: String,
    pub status: String,
    pub control: String,
    pub alarm: String,
}

impl Topics {
    pub fn new(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            temperature: format!("{base}/temperature"),
            humidity: format!("{base}/humidity"),
            setpoint: format!("{base}/setpoint"),
            status: format!("{base}/status"),
            control: format!("{base}/control"),
            alarm: format!("{base}/alarm"),
        }
    }

    /// The four topics the controller must be subscribed to at all times.
    pub fn subscriptions(&self) -> [&str; 4] {
        [
            &self.temperature,
            &self.humidity,
            &self.setpoint,
            &self.status,
        ]
    }

    /// Map an incoming topic name to its kind; `None` for anything else.
    pub fn classify(&self, topic: &str) -> Option<InboundTopic> {
        if topic == self.temperature {
            Some(InboundTopic::Temperature)
        } else if topic == self.humidity {
            Some(InboundTopic::Humidity)
        } else if topic == self.setpoint {
            Some(InboundTopic::Setpoint)
        } else if topic == self.status {
            Some(InboundTopic::Status)
        } else {
            None
        }
    }
}
