use std::path::PathBuf;

use thiserror::Error;

/// Fatal problems with the switch/device or MQTT documents.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse JSON in {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An action token is not of the form `"<command> <device>"`.
    #[error("switch \"{switch}\" has invalid action \"{spec}\", expected \"<command> <device>\"")]
    InvalidActionSpec { switch: String, spec: String },

    #[error("switch \"{switch}\" references unknown device \"{device}\"")]
    UnknownDevice { switch: String, device: String },

    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Failures of the MQTT transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to publish: {0}")]
    Publish(#[source] rumqttc::ClientError),

    #[error("MQTT connection error: {0}")]
    Connect(#[source] rumqttc::ConnectionError),
}

/// Per-event and per-action routing failures. None of these stop the router.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("switch \"{0}\" is unknown")]
    UnknownSwitch(String),

    #[error("signal of switch \"{0}\" was ignored due to debouncing")]
    Debounced(String),

    #[error("device \"{0}\" is unknown")]
    UnknownDevice(String),

    #[error("no mapping for action \"{action}\" on {device_type} device \"{device}\"")]
    ActionMapping {
        device: String,
        device_type: String,
        action: String,
    },

    #[error("device \"{device}\" has unsupported type \"{device_type}\"")]
    UnsupportedDeviceType { device: String, device_type: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}
