//! Control engine, the hexagonal core.
//!
//! [`ControlEngine`] owns the [`EnvironmentState`] and turns each inbound
//! [`BusEvent`] into zero or more [`Effect`]s.  It performs no I/O: commands,
//! alarms and readings are handed to an [`EffectSink`] in the order they are
//! decided, which makes the whole policy testable with a `Vec<Effect>`.
//!
//! ```text
//!  BusEvent ──▶ ┌──────────────────────────┐ ──▶ EffectSink
//!               │      ControlEngine       │      (Command · Alarm · Reading)
//!               │  Hysteresis · Safety     │
//!               └──────────────────────────┘
//! ```
//!
//! The engine is optimistic: once it decides to switch the relay it records
//! the new state immediately, whether or not the command later reaches the
//! relay.  The relay's own status report is authoritative and overwrites it.

use chrono::Utc;
use log::{debug, info, warn};

use crate::control::{Decision, decide};
use crate::safety;

use super::commands::ActuatorCommand;
use super::events::{BusEvent, LinkState};
use super::ports::{Effect, EffectSink};
use super::state::{ActuatorState, EnvironmentState, Reading};

/// The control engine.  Single writer of [`EnvironmentState`].
#[derive(Debug, Default)]
pub struct ControlEngine {
    state: EnvironmentState,
    link: Option<LinkState>,
    events_handled: u64,
}

impl ControlEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known state (tests, or a collaborator that restores one).
    pub fn with_state(state: EnvironmentState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    // ── Event handling ────────────────────────────────────────

    /// Apply one event and emit whatever it implies.
    pub fn handle(&mut self, event: BusEvent, sink: &mut impl EffectSink) {
        self.events_handled += 1;
        debug!("ENGINE | {} event: {:?}", event.kind(), event);

        match event {
            BusEvent::Temperature(t) => {
                self.state.temperature = Some(t);
                self.evaluate(sink);
            }
            BusEvent::Humidity(h) => {
                self.state.humidity = Some(h);
            }
            BusEvent::Setpoint(sp) => {
                info!("ENGINE | setpoint -> {sp}\u{00b0}C");
                self.state.setpoint = Some(sp);
                self.evaluate(sink);
            }
            BusEvent::Status { on } => self.apply_status(on, sink),
            BusEvent::Link(link) => {
                self.apply_link(link, sink);
                return;
            }
        }

        if self.state.temperature.is_some() {
            sink.emit(Effect::Reading(Reading::capture(&self.state, Utc::now())));
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Copy of the current state.
    pub fn snapshot(&self) -> EnvironmentState {
        self.state
    }

    /// Events applied since startup (link events included).
    pub fn events_handled(&self) -> u64 {
        self.events_handled
    }

    pub fn link(&self) -> Option<LinkState> {
        self.link
    }

    // ── Internal ──────────────────────────────────────────────

    /// Policy evaluation: safety alert, hysteresis, then emergency override.
    fn evaluate(&mut self, sink: &mut impl EffectSink) {
        let (Some(t), Some(sp)) = (self.state.temperature, self.state.setpoint) else {
            debug!(
                "ENGINE | skipping evaluation: temperature={:?} setpoint={:?}",
                self.state.temperature, self.state.setpoint
            );
            return;
        };

        if safety::high_temperature(t) {
            sink.emit(Effect::Alarm(format!("High temperature alert: {t:?}\u{00b0}C")));
        }

        let diff = t - sp;
        match decide(t, sp, self.state.actuator.is_on()) {
            Decision::Activate => self.command(
                ActuatorCommand::On,
                format!(
                    "Auto-activating AC: Temperature ({t:?}\u{00b0}C) is {diff:.1}\u{00b0}C above setpoint ({sp:?}\u{00b0}C)"
                ),
                sink,
            ),
            Decision::Deactivate => self.command(
                ActuatorCommand::Off,
                format!(
                    "Auto-deactivating AC: Temperature ({t:?}\u{00b0}C) is below setpoint ({sp:?}\u{00b0}C)"
                ),
                sink,
            ),
            Decision::Hold => {
                debug!(
                    "ENGINE | hold: diff={diff:.1} actuator={}",
                    self.state.actuator.label()
                );
            }
        }

        // Re-read the actuator: the hysteresis step may just have switched it on.
        if safety::emergency_override(t, self.state.actuator.is_on()) {
            warn!("ENGINE | emergency override at {t}\u{00b0}C");
            self.command(
                ActuatorCommand::On,
                format!("EMERGENCY: Force turning AC ON due to very high temperature: {t:?}\u{00b0}C"),
                sink,
            );
        }
    }

    fn command(&mut self, cmd: ActuatorCommand, reason: String, sink: &mut impl EffectSink) {
        info!("ENGINE | command {cmd}: {reason}");
        sink.emit(Effect::Alarm(reason));
        sink.emit(Effect::Command(cmd));
        self.state.actuator = cmd.resulting_state();
    }

    /// Relay status report.  Alarms only on an actual on/off transition, so a
    /// redelivered status produces nothing.
    fn apply_status(&mut self, on: bool, sink: &mut impl EffectSink) {
        if !self.state.actuator.is_known() {
            info!("ENGINE | first relay report: {}", if on { "ON" } else { "OFF" });
        }
        let was_on = self.state.actuator.is_on();
        self.state.actuator = ActuatorState::from_on(on);
        if was_on != on {
            sink.emit(Effect::Alarm(format!(
                "AC status changed to: {}",
                self.state.actuator.label()
            )));
        }
    }

    fn apply_link(&mut self, link: LinkState, sink: &mut impl EffectSink) {
        let prev = self.link.replace(link);
        if prev == Some(link) {
            return;
        }
        match link {
            LinkState::Up => {
                sink.emit(Effect::Alarm("Controller connected to broker".into()));
            }
            LinkState::Down if prev == Some(LinkState::Up) => {
                warn!("ENGINE | bus down, continuing on last known state");
                sink.emit(Effect::Alarm("Controller disconnected from broker".into()));
            }
            LinkState::Down => {}
        }
    }
}
