use std::collections::HashMap;

use tracing::debug;

use crate::config::DeviceConfig;

pub const TOGGLE: &str = "toggle";
pub const TURN_ON: &str = "turnon";
pub const TURN_OFF: &str = "turnoff";

/// Assumed on/off state per device, used to turn "toggle" into an explicit
/// command for devices that cannot toggle themselves.
///
/// The state is never confirmed by the hardware. A device switched through
/// another path drifts out of sync until it is toggled twice from here.
#[derive(Debug, Default)]
pub struct ToggleResolver {
    state: HashMap<String, bool>,
}

impl ToggleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `action` for `device_name`. Anything but "toggle", and "toggle" on a
    /// device listing it in `available_actions`, is returned unchanged. Otherwise
    /// the assumed state (initially on) is flipped and the command that puts the
    /// device into the new state is returned.
    pub fn resolve<'a>(&mut self, device_name: &str, device: &DeviceConfig, action: &'a str) -> &'a str {
        if action != TOGGLE || device.available_actions.contains(TOGGLE) {
            return action;
        }

        let state = self.state.entry(device_name.to_string()).or_insert(true);
        *state = !*state;
        let resolved = if *state { TURN_ON } else { TURN_OFF };
        debug!("Replace action \"{}\" by \"{}\"", action, resolved);
        resolved
    }

    /// Last assumed state, `None` until the device was first toggled here.
    #[cfg(test)]
    pub fn state(&self, device_name: &str) -> Option<bool> {
        self.state.get(device_name).copied()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}
