//! Bus plumbing shared by every transport: topic layout, payload codec,
//! inbound routing and the reconnect policy.

pub mod backoff;
pub mod codec;
pub mod topics;

use crate::app::events::BusEvent;
use crate::error::DecodeError;
use topics::Topics;

/// Turn one raw message into a typed event.
///
/// `Ok(None)` means the topic is not one the controller consumes (for
/// example its own alarm echo); such messages are ignored, not errors.
pub fn route(topics: &Topics, topic: &str, payload: &[u8]) -> Result<Option<BusEvent>, DecodeError> {
    match topics.classify(topic) {
        Some(kind) => codec::decode(kind, payload).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_ignores_foreign_topics() {
        let t = Topics::new("smart_ac");
        assert_eq!(route(&t, "smart_ac/alarm", b"garbage"), Ok(None));
        assert_eq!(
            route(&t, "smart_ac/temperature", br#"{"value": 20}"#),
            Ok(Some(BusEvent::Temperature(20.0)))
        );
        assert!(route(&t, "smart_ac/temperature", b"{}").is_err());
    }
}
