use std::sync::Arc;

use tracing::{error, info};

use switch_device_router::config::Config;
use switch_device_router::dispatch::TopicPrefixes;
use switch_device_router::mqtt::client::MqttClient;
use switch_device_router::router::EventRouter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting switch device router (mqtt={}:{}, switches={}, devices={}, debounce={:?})",
        config.mqtt.mqtt_host,
        config.mqtt.mqtt_port,
        config.switch_devices.switches.len(),
        config.switch_devices.devices.len(),
        config.debounce_period,
    );

    for (name, device) in &config.switch_devices.devices {
        info!(
            "  Device: {} ({}), {} native actions",
            name,
            device.device_type.as_str(),
            device.available_actions.len(),
        );
    }

    let mqtt_client = MqttClient::new(&config.mqtt);
    let mut router = EventRouter::new(
        Arc::new(config.switch_devices),
        TopicPrefixes::from(&config.mqtt),
        mqtt_client.publisher(),
        config.debounce_period,
    );

    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to register SIGTERM handler: {}", e);
            std::process::exit(1);
        }
    };

    tokio::select! {
        result = mqtt_client.run(&mut router) => {
            if let Err(e) = result {
                error!("Stopping: {}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
    }

    info!("switch device router stopped");
}
