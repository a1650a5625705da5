//! `rumqttc`-backed broker adapter.

use crate::error::MqttAdapterError;
use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use sim_core::{BrokerConfig, Result};
use sim_runtime::{AdapterFactory, BrokerAdapter, PublishAck};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default time allowed for the broker to acknowledge a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time allowed for a publish request to be queued.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Time allowed for the event loop to flush a disconnect on close.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Capacity of the request channel between client and event loop.
const REQUEST_CAPACITY: usize = 64;

/// Map a numeric QoS level to the client's enum.
pub fn qos_from_level(level: u8) -> std::result::Result<QoS, MqttAdapterError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(MqttAdapterError::InvalidQos(other)),
    }
}

/// Client id to use for `config`: the configured one, or `mqtt-sim-<uuid>`.
pub fn client_id_for(config: &BrokerConfig) -> String {
    match config.client_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => format!("mqtt-sim-{}", uuid::Uuid::new_v4()),
    }
}

/// Build client options for a broker.
///
/// Credentials are only set when a username is configured; a missing
/// password is sent as empty.
pub fn mqtt_options(config: &BrokerConfig) -> MqttOptions {
    let mut options = MqttOptions::new(client_id_for(config), config.host.clone(), config.port);
    options.set_keep_alive(Duration::from_secs(config.keepalive.max(1)));
    if let Some(username) = &config.username {
        options.set_credentials(username.clone(), config.password.clone().unwrap_or_default());
    }
    options
}

struct Connection {
    client: AsyncClient,
    event_task: JoinHandle<()>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}

/// Broker adapter publishing through one MQTT client connection.
pub struct MqttBrokerAdapter {
    config: BrokerConfig,
    connect_timeout: Duration,
    publish_timeout: Duration,
    connection: Option<Connection>,
}

impl MqttBrokerAdapter {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            connection: None,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// Factory handing out one adapter per broker config.
    pub fn factory() -> AdapterFactory {
        Box::new(|config: &BrokerConfig| -> Box<dyn BrokerAdapter> {
            Box::new(MqttBrokerAdapter::new(config.clone()))
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    async fn open(&self) -> std::result::Result<Connection, MqttAdapterError> {
        let (client, mut event_loop) = AsyncClient::new(mqtt_options(&self.config), REQUEST_CAPACITY);

        match tokio::time::timeout(self.connect_timeout, wait_for_connack(&mut event_loop)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(MqttAdapterError::Timeout(self.connect_timeout)),
        }

        let broker = self.config.name.clone();
        let event_task = tokio::spawn(drive_event_loop(broker, event_loop));
        Ok(Connection { client, event_task })
    }
}

async fn wait_for_connack(event_loop: &mut EventLoop) -> std::result::Result<(), MqttAdapterError> {
    loop {
        match event_loop.poll().await? {
            Event::Incoming(Packet::ConnAck(_)) => return Ok(()),
            other => debug!("Event before ConnAck: {other:?}"),
        }
    }
}

/// Errors after which polling the event loop again is pointless.
fn is_final(error: &ConnectionError) -> bool {
    matches!(error, ConnectionError::RequestsDone)
}

/// Keep the connection alive until a disconnect goes out or every client is gone.
async fn drive_event_loop(broker: String, mut event_loop: EventLoop) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("Broker '{broker}' disconnect sent");
                break;
            }
            Ok(_) => {}
            Err(e) if is_final(&e) => {
                debug!("Broker '{broker}' request channel closed");
                break;
            }
            Err(e) => {
                // the next poll reconnects
                warn!("Broker '{broker}' connection error: {e}");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

#[async_trait]
impl BrokerAdapter for MqttBrokerAdapter {
    async fn connect(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }
        let connection = self
            .open()
            .await
            .map_err(|e| e.into_connection(&self.config.name))?;
        info!(
            "Connected to broker '{}' at {}:{}",
            self.config.name, self.config.host, self.config.port
        );
        self.connection = Some(connection);
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &[u8], qos: u8, retain: bool) -> Result<PublishAck> {
        let broker = self.config.name.as_str();
        let connection = self
            .connection
            .as_ref()
            .ok_or_else(|| MqttAdapterError::NotConnected.into_publish(broker, topic))?;
        let qos = qos_from_level(qos).map_err(|e| e.into_publish(broker, topic))?;

        let request = connection.client.publish(topic, qos, retain, payload.to_vec());
        match tokio::time::timeout(self.publish_timeout, request).await {
            Ok(Ok(())) => Ok(PublishAck { message_id: None }),
            Ok(Err(e)) => Err(MqttAdapterError::from(e).into_publish(broker, topic)),
            Err(_) => Err(MqttAdapterError::Timeout(self.publish_timeout).into_publish(broker, topic)),
        }
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut connection) = self.connection.take() else {
            return Ok(());
        };

        // a full request channel would block the disconnect forever
        match tokio::time::timeout(CLOSE_GRACE, connection.client.disconnect()).await {
            Ok(Ok(())) => {
                if tokio::time::timeout(CLOSE_GRACE, &mut connection.event_task)
                    .await
                    .is_err()
                {
                    warn!("Broker '{}' did not flush the disconnect", self.config.name);
                }
            }
            Ok(Err(e)) => warn!("Disconnect from broker '{}' failed: {e}", self.config.name),
            Err(_) => warn!(
                "Disconnect from broker '{}' timed out after {:?}",
                self.config.name, CLOSE_GRACE
            ),
        }
        // dropping the connection aborts the event loop task
        drop(connection);
        info!("Closed broker '{}'", self.config.name);
        Ok(())
    }
}
