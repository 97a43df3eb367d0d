use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::debounce::DEFAULT_DEBOUNCE_PERIOD;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub switch_devices: SwitchDeviceConfig,
    pub mqtt: MqttConfig,
    pub debounce_period: Duration,
}

/// A configuration document, either already in memory or stored on disk.
#[derive(Debug, Clone)]
pub enum ConfigSource<T> {
    Inline(T),
    Path(PathBuf),
}

/// Validated mapping of switches to actions and of device names to device metadata.
#[derive(Debug, Clone)]
pub struct SwitchDeviceConfig {
    pub switches: HashMap<String, Vec<ActionSpec>>,
    pub devices: HashMap<String, DeviceConfig>,
}

/// One step of a switch: send `command` to `device`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    pub command: String,
    pub device: String,
}

#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub device_type: DeviceType,
    /// Actions the device integration understands natively (e.g. "toggle").
    pub available_actions: HashSet<String>,
    /// Topic segment used instead of the device name (tuya only).
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceType {
    Yeelight,
    Tuya,
    /// Kept so that unknown types load and are reported when dispatched.
    Other(String),
}

impl DeviceType {
    pub fn as_str(&self) -> &str {
        match self {
            DeviceType::Yeelight => "yeelight",
            DeviceType::Tuya => "tuya",
            DeviceType::Other(name) => name,
        }
    }
}

impl From<&str> for DeviceType {
    fn from(raw: &str) -> Self {
        match raw {
            "yeelight" => DeviceType::Yeelight,
            "tuya" => DeviceType::Tuya,
            other => DeviceType::Other(other.to_string()),
        }
    }
}

/// Serialized form of the switch/device document.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchDeviceDocument {
    #[serde(default)]
    pub switches: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub devices: HashMap<String, DeviceDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceDocument {
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub available_actions: Vec<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    pub mqtt_host: String,
    #[serde(default = "default_mqtt_port")]
    pub mqtt_port: u16,
    #[serde(default)]
    pub mqtt_user: Option<String>,
    #[serde(default)]
    pub mqtt_password: Option<String>,
    pub switch_topic: String,
    pub yeelight_topic: String,
    pub tuya_topic: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "switch-device-router".to_string()
}

fn default_keep_alive_secs() -> u64 {
    30
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let switch_device_path =
            env_or_default("SWITCH_DEVICE_CONFIG", "switch_device_config.yaml".to_string());
        let mqtt_path = env_or_default("MQTT_CONFIG", "mqtt_config.yaml".to_string());

        let switch_devices =
            SwitchDeviceConfig::load(ConfigSource::Path(PathBuf::from(switch_device_path)))?;
        // Overrides may fill in values the document leaves empty, so validate afterwards.
        let mut mqtt: MqttConfig = load_document(Path::new(&mqtt_path))?;
        mqtt.apply_env_overrides();
        let mqtt = MqttConfig::load(ConfigSource::Inline(mqtt))?;

        Ok(Self {
            switch_devices,
            mqtt,
            debounce_period: parse_debounce_period(env_optional("DEBOUNCE_PERIOD_MS")),
        })
    }
}

impl SwitchDeviceConfig {
    pub fn load(source: ConfigSource<SwitchDeviceDocument>) -> Result<Self, ConfigError> {
        let document = match source {
            ConfigSource::Inline(document) => document,
            ConfigSource::Path(path) => load_document(&path)?,
        };
        Self::from_document(document)
    }

    pub fn from_document(document: SwitchDeviceDocument) -> Result<Self, ConfigError> {
        let devices: HashMap<String, DeviceConfig> = document
            .devices
            .into_iter()
            .map(|(name, raw)| {
                let device = DeviceConfig {
                    device_type: DeviceType::from(raw.device_type.as_str()),
                    available_actions: raw.available_actions.into_iter().collect(),
                    topic: raw.topic,
                };
                (name, device)
            })
            .collect();

        let mut switches = HashMap::with_capacity(document.switches.len());
        for (switch_id, raw_actions) in document.switches {
            let mut actions = Vec::with_capacity(raw_actions.len());
            for raw in raw_actions {
                let action = parse_action_spec(&raw).ok_or_else(|| {
                    ConfigError::InvalidActionSpec {
                        switch: switch_id.clone(),
                        spec: raw.clone(),
                    }
                })?;
                if !devices.contains_key(&action.device) {
                    return Err(ConfigError::UnknownDevice {
                        switch: switch_id,
                        device: action.device,
                    });
                }
                actions.push(action);
            }
            switches.insert(switch_id, actions);
        }

        Ok(Self { switches, devices })
    }
}

impl MqttConfig {
    pub fn load(source: ConfigSource<MqttConfig>) -> Result<Self, ConfigError> {
        let config = match source {
            ConfigSource::Inline(config) => config,
            ConfigSource::Path(path) => load_document(&path)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(host) = env_optional("MQTT_HOST") {
            self.mqtt_host = host;
        }
        if let Some(port) = env_optional("MQTT_PORT").and_then(|v| v.parse().ok()) {
            self.mqtt_port = port;
        }
        if let Some(user) = env_optional("MQTT_USER") {
            self.mqtt_user = Some(user);
        }
        if let Some(password) = env_optional("MQTT_PASSWORD") {
            self.mqtt_password = Some(password);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("mqtt_host", &self.mqtt_host),
            ("switch_topic", &self.switch_topic),
            ("yeelight_topic", &self.yeelight_topic),
            ("tuya_topic", &self.tuya_topic),
        ];
        for (key, value) in required {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if self.keep_alive_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "keep_alive_secs".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Milliseconds, falling back to the gate's default when unset or invalid.
fn parse_debounce_period(raw: Option<String>) -> Duration {
    raw.and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_DEBOUNCE_PERIOD)
}

/// Split `"<command> <device>"` on a single space.
fn parse_action_spec(raw: &str) -> Option<ActionSpec> {
    let mut parts = raw.split(' ');
    let command = parts.next().filter(|c| !c.is_empty())?;
    let device = parts.next().filter(|d| !d.is_empty())?;
    if parts.next().is_some() {
        return None;
    }
    Some(ActionSpec {
        command: command.to_string(),
        device: device.to_string(),
    })
}

/// Read a YAML document, or a JSON one when the path ends in `.json`.
fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content).map_err(|source| ConfigError::ParseJson {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_yaml::from_str(&content).map_err(|source| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SWITCH_DEVICE_YAML: &str = r#"
switches:
  s1:
    - toggle d1
  s2:
    - turnon d2
    - toggle d1
devices:
  d1:
    type: yeelight
    available_actions: [turnon, turnoff]
  d2:
    type: tuya
    topic: lamp
"#;

    const MQTT_YAML: &str = r#"
mqtt_host: broker.local
mqtt_user: router
mqtt_password: secret
switch_topic: home/switches
yeelight_topic: yeelight
tuya_topic: tuya
"#;

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn document(yaml: &str) -> SwitchDeviceDocument {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn should_parse_action_spec() {
        assert_eq!(
            parse_action_spec("toggle d1"),
            Some(ActionSpec {
                command: "toggle".into(),
                device: "d1".into()
            })
        );
        assert_eq!(parse_action_spec("toggle"), None);
        assert_eq!(parse_action_spec("toggle d1 extra"), None);
        assert_eq!(parse_action_spec("toggle  d1"), None);
        assert_eq!(parse_action_spec(" d1"), None);
    }

    #[test]
    fn should_load_switch_device_config_from_yaml_file() {
        let file = write_file(".yaml", SWITCH_DEVICE_YAML);
        let config =
            SwitchDeviceConfig::load(ConfigSource::Path(file.path().to_path_buf())).unwrap();

        assert_eq!(config.switches.len(), 2);
        let s2 = &config.switches["s2"];
        assert_eq!(s2[0].command, "turnon");
        assert_eq!(s2[0].device, "d2");
        assert_eq!(s2[1].command, "toggle");
        assert_eq!(s2[1].device, "d1");

        let d1 = &config.devices["d1"];
        assert_eq!(d1.device_type, DeviceType::Yeelight);
        assert!(d1.available_actions.contains("turnon"));
        assert_eq!(d1.topic, None);

        let d2 = &config.devices["d2"];
        assert_eq!(d2.device_type, DeviceType::Tuya);
        assert!(d2.available_actions.is_empty());
        assert_eq!(d2.topic.as_deref(), Some("lamp"));
    }

    #[test]
    fn should_accept_inline_and_path_sources_interchangeably() {
        let file = write_file(".yaml", SWITCH_DEVICE_YAML);
        let from_path =
            SwitchDeviceConfig::load(ConfigSource::Path(file.path().to_path_buf())).unwrap();
        let inline =
            SwitchDeviceConfig::load(ConfigSource::Inline(document(SWITCH_DEVICE_YAML))).unwrap();

        assert_eq!(from_path.switches, inline.switches);
        assert_eq!(from_path.devices.len(), inline.devices.len());
    }

    #[test]
    fn should_load_json_document_by_extension() {
        let json = r#"{
            "switches": {"s1": ["turnoff lamp"]},
            "devices": {"lamp": {"type": "tuya"}}
        }"#;
        let file = write_file(".json", json);
        let config =
            SwitchDeviceConfig::load(ConfigSource::Path(file.path().to_path_buf())).unwrap();
        assert_eq!(config.switches["s1"][0].command, "turnoff");
    }

    #[test]
    fn should_keep_unknown_device_type() {
        let config = SwitchDeviceConfig::from_document(document(
            r#"
switches:
  s1: ["turnon fan"]
devices:
  fan:
    type: shelly
"#,
        ))
        .unwrap();
        assert_eq!(
            config.devices["fan"].device_type,
            DeviceType::Other("shelly".into())
        );
        assert_eq!(config.devices["fan"].device_type.as_str(), "shelly");
    }

    #[test]
    fn should_reject_switch_referencing_unknown_device() {
        let err = SwitchDeviceConfig::from_document(document(
            r#"
switches:
  s1: ["turnon ghost"]
devices: {}
"#,
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownDevice { ref switch, ref device } if switch == "s1" && device == "ghost"
        ));
    }

    #[test]
    fn should_reject_malformed_action_spec() {
        let err = SwitchDeviceConfig::from_document(document(
            r#"
switches:
  s1: ["toggle"]
devices: {}
"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidActionSpec { .. }));
    }

    #[test]
    fn should_report_missing_file() {
        let err = SwitchDeviceConfig::load(ConfigSource::Path(PathBuf::from(
            "/nonexistent/switch_device_config.yaml",
        )))
        .unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn should_report_malformed_yaml() {
        let file = write_file(".yaml", "switches: [unclosed");
        let err = SwitchDeviceConfig::load(ConfigSource::Path(file.path().to_path_buf()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseYaml { .. }));
    }

    #[test]
    fn should_load_mqtt_config_with_defaults() {
        let file = write_file(".yaml", MQTT_YAML);
        let config = MqttConfig::load(ConfigSource::Path(file.path().to_path_buf())).unwrap();
        assert_eq!(config.mqtt_host, "broker.local");
        assert_eq!(config.mqtt_port, 1883);
        assert_eq!(config.mqtt_user.as_deref(), Some("router"));
        assert_eq!(config.mqtt_password.as_deref(), Some("secret"));
        assert_eq!(config.switch_topic, "home/switches");
        assert_eq!(config.yeelight_topic, "yeelight");
        assert_eq!(config.tuya_topic, "tuya");
        assert_eq!(config.client_id, "switch-device-router");
        assert_eq!(config.keep_alive_secs, 30);
    }

    #[test]
    fn should_reject_empty_topic_prefix() {
        let mut config: MqttConfig = serde_yaml::from_str(MQTT_YAML).unwrap();
        config.tuya_topic.clear();
        let err = MqttConfig::load(ConfigSource::Inline(config)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "tuya_topic"));
    }

    #[test]
    fn should_default_debounce_period_to_gate_default() {
        assert_eq!(parse_debounce_period(None), DEFAULT_DEBOUNCE_PERIOD);
        assert_eq!(parse_debounce_period(Some("soon".into())), DEFAULT_DEBOUNCE_PERIOD);
        assert_eq!(
            parse_debounce_period(Some("250".into())),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn should_load_bundled_example_documents() {
        let switches: SwitchDeviceDocument =
            serde_yaml::from_str(include_str!("../switch_device_config.example.yaml")).unwrap();
        let config = SwitchDeviceConfig::from_document(switches).unwrap();
        assert_eq!(config.switches.len(), 2);

        let mqtt: MqttConfig =
            serde_yaml::from_str(include_str!("../mqtt_config.example.yaml")).unwrap();
        MqttConfig::load(ConfigSource::Inline(mqtt)).unwrap();
    }
}
