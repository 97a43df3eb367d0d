use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::config::SwitchDeviceConfig;
use crate::debounce::DebounceGate;
use crate::dispatch::{Dispatcher, Message, Publisher, TopicPrefixes};
use crate::error::RouteError;
use crate::toggle::ToggleResolver;

/// Result of one accepted switch press.
#[derive(Debug, Default)]
pub struct RouteOutcome {
    /// Messages handed to the publisher, in configured order.
    pub dispatched: Vec<Message>,
    /// Actions that were skipped, in configured order.
    pub failures: Vec<RouteError>,
}

/// Routes switch presses to device commands. Presses are handled one at a
/// time and each one runs to completion.
pub struct EventRouter<P> {
    config: Arc<SwitchDeviceConfig>,
    debounce: DebounceGate,
    toggle: ToggleResolver,
    dispatcher: Dispatcher<P>,
}

impl<P: Publisher> EventRouter<P> {
    pub fn new(
        config: Arc<SwitchDeviceConfig>,
        topics: TopicPrefixes,
        publisher: P,
        debounce_period: Duration,
    ) -> Self {
        Self {
            config,
            debounce: DebounceGate::new(debounce_period),
            toggle: ToggleResolver::new(),
            dispatcher: Dispatcher::new(topics, publisher),
        }
    }

    #[cfg(test)]
    pub fn debounce(&self) -> &DebounceGate {
        &self.debounce
    }

    #[cfg(test)]
    pub fn toggle(&self) -> &ToggleResolver {
        &self.toggle
    }

    #[cfg(test)]
    pub fn publisher(&self) -> &P {
        self.dispatcher.publisher()
    }

    /// Handle a press of `switch_id` at `now`.
    ///
    /// Unknown and debounced presses are returned as errors and change nothing.
    /// Otherwise every configured action is attempted; a failing action is
    /// logged, recorded in the outcome and does not stop the ones after it.
    pub fn route(&mut self, switch_id: &str, now: Instant) -> Result<RouteOutcome, RouteError> {
        info!("The switch with the id \"{}\" was pressed", switch_id);

        let Some(actions) = self.config.switches.get(switch_id) else {
            let err = RouteError::UnknownSwitch(switch_id.to_string());
            warn!("{}", err);
            return Err(err);
        };

        if !self.debounce.accept(switch_id, now) {
            let err = RouteError::Debounced(switch_id.to_string());
            warn!("{}", err);
            return Err(err);
        }

        let mut outcome = RouteOutcome::default();
        for spec in actions {
            let Some(device) = self.config.devices.get(&spec.device) else {
                let err = RouteError::UnknownDevice(spec.device.clone());
                error!("{}", err);
                outcome.failures.push(err);
                continue;
            };

            let action = self.toggle.resolve(&spec.device, device, &spec.command);
            info!("Perform action \"{}\" for device \"{}\"", action, spec.device);

            match self.dispatcher.dispatch(&spec.device, device, action) {
                Ok(message) => outcome.dispatched.push(message),
                Err(err) => {
                    match &err {
                        RouteError::UnsupportedDeviceType { .. } | RouteError::Transport(_) => {
                            warn!("{}", err);
                        }
                        _ => error!("{}", err),
                    }
                    outcome.failures.push(err);
                }
            }
        }

        Ok(outcome)
    }
}
