//! MQTT bus adapter (rumqttc, sync API).
//!
//! Split the way rumqttc splits it:
//!
//! - [`MqttBus`] wraps the `Client` request handle and implements
//!   [`Publisher`].  Publishing never blocks: a full request queue is
//!   reported as [`BusError::QueueFull`].
//! - [`MqttLink`] owns the `Connection` and drives it on a dedicated thread.
//!   Each `ConnAck` re-subscribes to the inbound topics, incoming publishes
//!   are routed and decoded into engine events, and connection errors back
//!   off exponentially before the next poll reconnects.  A subscribe that
//!   finds the request queue full stays pending and is retried on every
//!   poll until the broker has all four.
//!
//! Link transitions are submitted to the engine as `Link(Up/Down)` events so
//! they are audited in order with the telemetry.

use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use log::{debug, info, trace, warn};
use rumqttc::{Client, ClientError, Connection, Event, MqttOptions, Packet, QoS, RecvTimeoutError};

use crate::app::events::{BusEvent, LinkState};
use crate::app::ports::Publisher;
use crate::bus::backoff::ReconnectBackoff;
use crate::bus::route;
use crate::bus::topics::Topics;
use crate::config::BrokerConfig;
use crate::error::{BusError, SubmitError};
use crate::runtime::EngineHandle;

/// How long one `recv_timeout` waits before re-checking the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn mqtt_options(config: &BrokerConfig) -> MqttOptions {
    let mut opts = MqttOptions::new(config.client_id(), config.host.clone(), config.port);
    opts.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
    opts.set_clean_session(true);
    if let Some(user) = &config.username {
        opts.set_credentials(user.clone(), config.password.clone().unwrap_or_default());
    }
    opts
}

// ── Publisher side ───────────────────────────────────────────

#[derive(Clone)]
pub struct MqttBus {
    client: Client,
}

impl MqttBus {
    /// Build the client pair.  Nothing touches the network until the link
    /// thread starts polling.
    pub fn new(config: &BrokerConfig, topics: &Topics) -> (Self, MqttLink) {
        let (client, connection) = Client::new(mqtt_options(config), config.request_queue_depth);
        info!(
            "BUS | client {} -> {}:{}",
            config.client_id(),
            config.host,
            config.port
        );
        let link = MqttLink {
            client: client.clone(),
            connection,
            topics: topics.clone(),
            backoff: config.backoff(),
            pending: Vec::new(),
        };
        (Self { client }, link)
    }

    /// Queue a DISCONNECT.  The link thread sees the session end.
    pub fn disconnect(&self) -> Result<(), BusError> {
        self.client.try_disconnect().map_err(map_client_error)
    }
}

fn map_client_error(e: ClientError) -> BusError {
    match e {
        ClientError::TryRequest(_) => BusError::QueueFull,
        ClientError::Request(_) => BusError::Closed,
    }
}

impl Publisher for MqttBus {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        self.client
            .try_publish(topic, QoS::AtLeastOnce, false, payload)
            .map_err(map_client_error)
    }
}

// ── Link side ────────────────────────────────────────────────

pub struct MqttLink {
    client: Client,
    connection: Connection,
    topics: Topics,
    backoff: ReconnectBackoff,
    /// Inbound topics not yet handed to the request queue this session.
    pending: Vec<String>,
}

impl MqttLink {
    /// Start polling the connection on its own thread.
    pub fn spawn(self, handle: EngineHandle) -> std::io::Result<LinkThread> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let join = std::thread::Builder::new()
            .name("ac-mqtt".into())
            .spawn(move || self.run(&handle, &flag))?;
        Ok(LinkThread {
            stop,
            join: Some(join),
        })
    }

    fn run(mut self, handle: &EngineHandle, stop: &AtomicBool) {
        let mut attempt = 0u32;
        let mut up = false;

        while !stop.load(Ordering::Acquire) {
            if up {
                self.retry_subscriptions();
            }
            match self.connection.recv_timeout(POLL_INTERVAL) {
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("BUS | request channel closed, link stopping");
                    break;
                }
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    info!("BUS | connected ({:?})", ack.code);
                    attempt = 0;
                    self.subscribe_all();
                    if !up {
                        up = true;
                        notify(handle, BusEvent::Link(LinkState::Up));
                    }
                }
                Ok(Ok(Event::Incoming(Packet::Publish(p)))) => {
                    self.deliver(handle, &p.topic, &p.payload);
                }
                Ok(Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect))) => {
                    info!("BUS | disconnect sent, session closed");
                    break;
                }
                Ok(Ok(other)) => trace!("BUS | {other:?}"),
                Ok(Err(e)) => {
                    self.pending.clear();
                    if up {
                        up = false;
                        notify(handle, BusEvent::Link(LinkState::Down));
                    }
                    let delay = self.backoff.next(attempt);
                    attempt = attempt.saturating_add(1);
                    warn!("BUS | connection error: {e}; retry #{attempt} in {delay:?}");
                    sleep_unless_stopped(delay, stop);
                }
            }
        }

        if up {
            notify(handle, BusEvent::Link(LinkState::Down));
        }
        info!("BUS | link thread exiting");
    }

    /// Fresh session: every inbound topic needs subscribing again.
    fn subscribe_all(&mut self) {
        self.pending = self.topics.subscriptions().into_iter().map(str::to_owned).collect();
        self.retry_subscriptions();
    }

    fn retry_subscriptions(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let client = &self.client;
        self.pending.retain(|topic| match client.try_subscribe(topic.as_str(), QoS::AtLeastOnce) {
            Ok(()) => {
                debug!("BUS | subscribe {topic}");
                false
            }
            Err(e) => {
                debug!("BUS | subscribe {topic} deferred: {}", map_client_error(e));
                true
            }
        });
    }

    /// Decode one inbound publish and hand it to the engine.  Malformed
    /// payloads are dropped with a warning; they never reach the engine.
    fn deliver(&self, handle: &EngineHandle, topic: &str, payload: &[u8]) {
        match route(&self.topics, topic, payload) {
            Ok(Some(event)) => notify(handle, event),
            Ok(None) => debug!("BUS | ignoring message on {topic}"),
            Err(e) => warn!("BUS | dropping payload on {topic}: {e}"),
        }
    }
}

fn notify(handle: &EngineHandle, event: BusEvent) {
    match handle.submit(event) {
        Ok(()) => {}
        Err(SubmitError::Closed) => debug!("BUS | engine closed, {} event dropped", event.kind()),
        Err(SubmitError::Full) => {}
    }
}

fn sleep_unless_stopped(total: Duration, stop: &AtomicBool) {
    let mut left = total;
    while !left.is_zero() && !stop.load(Ordering::Acquire) {
        let step = left.min(POLL_INTERVAL);
        std::thread::sleep(step);
        left = left.saturating_sub(step);
    }
}

/// Running link thread.  Stops and joins on drop.
pub struct LinkThread {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl LinkThread {
    /// Wait up to `grace` for the link to exit on its own (after
    /// [`MqttBus::disconnect`] has flushed the queued publishes), then stop it.
    pub fn finish(&mut self, grace: Duration) {
        let deadline = std::time::Instant::now() + grace;
        while self.join.as_ref().is_some_and(|j| !j.is_finished()) && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        self.stop_and_join();
    }

    pub fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!("BUS | link thread panicked");
            }
        }
    }
}

impl Drop for LinkThread {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
