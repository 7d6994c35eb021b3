//! Fuzz target: inbound bus payloads.
//!
//! The first byte picks the topic, the rest is the payload.  Routing and
//! decoding must never panic; whatever decodes must be finite.

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartac::app::events::BusEvent;
use smartac::bus::route;
use smartac::bus::topics::Topics;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let topics = Topics::new("smart_ac");
    let topic = match selector % 5 {
        0 => topics.temperature.as_str(),
        1 => topics.humidity.as_str(),
        2 => topics.setpoint.as_str(),
        3 => topics.status.as_str(),
        _ => topics.alarm.as_str(),
    };

    if let Ok(Some(event)) = route(&topics, topic, payload) {
        match event {
            BusEvent::Temperature(v) | BusEvent::Humidity(v) | BusEvent::Setpoint(v) => {
                assert!(v.is_finite());
            }
            BusEvent::Status { .. } | BusEvent::Link(_) => {}
        }
    }
});
