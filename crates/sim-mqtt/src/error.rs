//! Error types for the MQTT adapter.

use sim_core::SimError;
use thiserror::Error;

/// Errors raised by the MQTT client layer.
#[derive(Error, Debug)]
pub enum MqttAdapterError {
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Event loop closed before the broker acknowledged the connection")]
    EventLoopClosed,

    #[error("Not connected")]
    NotConnected,

    #[error("Unsupported QoS {0}")]
    InvalidQos(u8),
}

impl MqttAdapterError {
    /// Wrap as a connection failure for `broker`.
    pub fn into_connection(self, broker: &str) -> SimError {
        SimError::BrokerConnection(format!("broker '{broker}': {self}"))
    }

    /// Wrap as a publish failure on `topic`.
    pub fn into_publish(self, broker: &str, topic: &str) -> SimError {
        SimError::BrokerPublish(format!("broker '{broker}' topic '{topic}': {self}"))
    }
}
