//! Outbound actuator commands.
//!
//! Published on the control topic whenever the engine decides the relay
//! should change state.

use super::state::ActuatorState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCommand {
    On,
    Off,
}

impl ActuatorCommand {
    /// Wire representation (`"on"` / `"off"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }

    /// State the engine records once this command is issued.
    pub fn resulting_state(self) -> ActuatorState {
        match self {
            Self::On => ActuatorState::On,
            Self::Off => ActuatorState::Off,
        }
    }
}

impl core::fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
