use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use tracing::{error, info, warn};

use crate::config::MqttConfig;
use crate::dispatch::Publisher;
use crate::error::TransportError;
use crate::router::EventRouter;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub struct MqttClient {
    client: AsyncClient,
    eventloop: EventLoop,
    switch_topic: String,
}

impl MqttClient {
    pub fn new(config: &MqttConfig) -> Self {
        let mut mqttopts = MqttOptions::new(&config.client_id, &config.mqtt_host, config.mqtt_port);
        mqttopts.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        if let Some(user) = &config.mqtt_user {
            mqttopts.set_credentials(user, config.mqtt_password.as_deref().unwrap_or_default());
        }

        let (client, eventloop) = AsyncClient::new(mqttopts, 100);

        Self {
            client,
            eventloop,
            switch_topic: config.switch_topic.clone(),
        }
    }

    /// Handle for the router to publish device commands through this connection.
    pub fn publisher(&self) -> MqttPublisher {
        MqttPublisher {
            client: self.client.clone(),
        }
    }

    /// Queue the switch topic subscription without waiting on a full request queue.
    fn subscribe_switches(&self) -> Result<(), rumqttc::ClientError> {
        self.client.try_subscribe(&self.switch_topic, QoS::ExactlyOnce)
    }

    /// Run the MQTT event loop. Subscribes to the switch topic on every connect
    /// and routes each incoming press to completion before polling again.
    ///
    /// Fails only if the broker cannot be reached before the first connect;
    /// later connection errors are logged and retried.
    pub async fn run<P: Publisher>(
        mut self,
        router: &mut EventRouter<P>,
    ) -> Result<(), TransportError> {
        let mut connected = false;

        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                    info!("Connected to MQTT broker with result code {:?}", ack.code);
                    connected = true;
                    if let Err(e) = self.subscribe_switches() {
                        warn!("Failed to subscribe to {}: {}", self.switch_topic, e);
                    }
                }
                Ok(Event::Incoming(Incoming::Publish(publish))) => {
                    let Some(switch_id) = decode_switch_id(&publish.payload) else {
                        warn!("Ignoring non UTF-8 payload on {}", publish.topic);
                        continue;
                    };
                    // Failures are logged by the router.
                    let _ = router.route(switch_id, std::time::Instant::now());
                }
                Ok(_) => {}
                Err(e) if !connected => {
                    error!("Could not connect to MQTT broker: {}", e);
                    return Err(TransportError::Connect(e));
                }
                Err(e) => {
                    warn!("MQTT connection error: {}. Reconnecting...", e);
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}

/// Publishes through the shared client without waiting for the broker.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl Publisher for MqttPublisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        self.client
            .try_publish(topic, QoS::ExactlyOnce, false, payload)
            .map_err(TransportError::Publish)
    }
}

/// The raw switch identifier carried by an inbound message.
fn decode_switch_id(payload: &[u8]) -> Option<&str> {
    std::str::from_utf8(payload).ok()
}
