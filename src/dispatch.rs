use tracing::debug;

use crate::config::{DeviceConfig, DeviceType, MqttConfig};
use crate::error::{RouteError, TransportError};
use crate::toggle::{TURN_OFF, TURN_ON};

/// An outbound device command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: String,
}

/// Sink for outbound commands. Implementations enqueue and return without
/// waiting for the broker.
pub trait Publisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError>;
}

/// Topic prefixes per device type.
#[derive(Debug, Clone)]
pub struct TopicPrefixes {
    pub yeelight: String,
    pub tuya: String,
}

impl From<&MqttConfig> for TopicPrefixes {
    fn from(config: &MqttConfig) -> Self {
        Self {
            yeelight: config.yeelight_topic.clone(),
            tuya: config.tuya_topic.clone(),
        }
    }
}

/// Turns a concrete action into a device-type specific message and publishes it.
pub struct Dispatcher<P> {
    topics: TopicPrefixes,
    publisher: P,
}

impl<P: Publisher> Dispatcher<P> {
    pub fn new(topics: TopicPrefixes, publisher: P) -> Self {
        Self { topics, publisher }
    }

    #[cfg(test)]
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Build the message for `action` on `device` without publishing it.
    pub fn encode(
        &self,
        device_name: &str,
        device: &DeviceConfig,
        action: &str,
    ) -> Result<Message, RouteError> {
        match &device.device_type {
            DeviceType::Yeelight => Ok(encode_yeelight(&self.topics.yeelight, device_name, action)),
            DeviceType::Tuya => encode_tuya(&self.topics.tuya, device_name, device, action),
            DeviceType::Other(device_type) => Err(RouteError::UnsupportedDeviceType {
                device: device_name.to_string(),
                device_type: device_type.clone(),
            }),
        }
    }

    pub fn dispatch(
        &mut self,
        device_name: &str,
        device: &DeviceConfig,
        action: &str,
    ) -> Result<Message, RouteError> {
        let message = self.encode(device_name, device, action)?;
        debug!(
            "Publish action \"{}\" in topic \"{}\"",
            message.payload, message.topic
        );
        self.publisher.publish(&message.topic, &message.payload)?;
        Ok(message)
    }
}

/// `{prefix}/{device}`, with the action as payload.
fn encode_yeelight(prefix: &str, device_name: &str, action: &str) -> Message {
    Message {
        topic: format!("{prefix}/{device_name}"),
        payload: action.to_string(),
    }
}

/// `{prefix}/{topic or device}/command`, with a boolean payload.
fn encode_tuya(
    prefix: &str,
    device_name: &str,
    device: &DeviceConfig,
    action: &str,
) -> Result<Message, RouteError> {
    let payload = match action {
        TURN_ON => "true",
        TURN_OFF => "false",
        _ => {
            return Err(RouteError::ActionMapping {
                device: device_name.to_string(),
                device_type: DeviceType::Tuya.as_str().to_string(),
                action: action.to_string(),
            });
        }
    };
    let segment = device.topic.as_deref().unwrap_or(device_name);
    Ok(Message {
        topic: format!("{prefix}/{segment}/command"),
        payload: payload.to_string(),
    })
}
