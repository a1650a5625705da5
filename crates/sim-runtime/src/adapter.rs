//! Broker adapter contract.

use async_trait::async_trait;
use sim_core::{BrokerConfig, Result};

/// Metadata returned by a successful publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishAck {
    pub message_id: Option<u64>,
}

/// Connection to one broker, shared by every stream that targets it.
///
/// The engine never calls an adapter concurrently; calls are strictly
/// sequential.
#[async_trait]
pub trait BrokerAdapter: Send {
    /// Establish the connection. Fails with a broker connection error.
    async fn connect(&mut self) -> Result<()>;

    /// Publish one message. Fails with a broker publish error.
    async fn publish(&mut self, topic: &str, payload: &[u8], qos: u8, retain: bool) -> Result<PublishAck>;

    /// Release the connection. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Creates one adapter per broker.
pub type AdapterFactory = Box<dyn Fn(&BrokerConfig) -> Box<dyn BrokerAdapter> + Send + Sync>;
