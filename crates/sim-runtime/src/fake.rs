//! In-memory broker and renderer for tests and dry runs.
//!
//! A [`FakeBroker`] is a shared handle: every adapter it creates records into
//! the same message log, so a test can hand [`FakeBroker::factory`] to the
//! engine and inspect the log afterwards.

use crate::adapter::{AdapterFactory, BrokerAdapter, PublishAck};
use crate::models::{RuntimeResult, RuntimeSnapshot};
use crate::renderer::Renderer;
use async_trait::async_trait;
use parking_lot::Mutex;
use sim_core::{BrokerConfig, Result, SimError};
use std::collections::HashSet;
use std::sync::Arc;

/// A message accepted by a fake adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub broker: String,
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: u8,
    pub retain: bool,
}

#[derive(Debug, Default)]
struct FakeBrokerState {
    published: Vec<PublishedMessage>,
    fail_topics: HashSet<String>,
    fail_connect: bool,
    fail_after: Option<usize>,
    connects: usize,
    closes: usize,
}

/// Shared fake broker with failure injection.
#[derive(Debug, Clone, Default)]
pub struct FakeBroker {
    state: Arc<Mutex<FakeBrokerState>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every publish to `topic`.
    pub fn with_failing_topic(self, topic: impl Into<String>) -> Self {
        self.state.lock().fail_topics.insert(topic.into());
        self
    }

    /// Reject every connect attempt.
    pub fn with_connect_failure(self) -> Self {
        self.state.lock().fail_connect = true;
        self
    }

    /// Reject publishes once `count` messages have been accepted.
    pub fn with_fail_after(self, count: usize) -> Self {
        self.state.lock().fail_after = Some(count);
        self
    }

    /// A new adapter bound to this broker.
    pub fn adapter(&self, config: &BrokerConfig) -> FakeBrokerAdapter {
        FakeBrokerAdapter {
            broker_name: config.name.clone(),
            broker: self.clone(),
            connected: false,
        }
    }

    /// Factory for the engine.
    pub fn factory(&self) -> AdapterFactory {
        let broker = self.clone();
        Box::new(move |config: &BrokerConfig| -> Box<dyn BrokerAdapter> { Box::new(broker.adapter(config)) })
    }

    /// Every accepted message, in publish order.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state.lock().published.clone()
    }

    /// Accepted messages for one topic.
    pub fn published_to(&self, topic: &str) -> Vec<PublishedMessage> {
        self.state
            .lock()
            .published
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    pub fn connect_count(&self) -> usize {
        self.state.lock().connects
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }
}

/// Adapter handed out by [`FakeBroker`].
#[derive(Debug)]
pub struct FakeBrokerAdapter {
    broker_name: String,
    broker: FakeBroker,
    connected: bool,
}

#[async_trait]
impl BrokerAdapter for FakeBrokerAdapter {
    async fn connect(&mut self) -> Result<()> {
        let mut state = self.broker.state.lock();
        if state.fail_connect {
            return Err(SimError::BrokerConnection(format!(
                "Fake broker '{}' connect failed.",
                self.broker_name
            )));
        }
        state.connects += 1;
        self.connected = true;
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &[u8], qos: u8, retain: bool) -> Result<PublishAck> {
        if !self.connected {
            return Err(SimError::BrokerPublish(format!(
                "Fake broker '{}' is not connected.",
                self.broker_name
            )));
        }
        let mut state = self.broker.state.lock();
        if state.fail_topics.contains(topic) {
            return Err(SimError::BrokerPublish(format!(
                "Fake publish failure for topic '{topic}'."
            )));
        }
        if state.fail_after.is_some_and(|limit| state.published.len() >= limit) {
            return Err(SimError::BrokerPublish(
                "Fake publish failure after configured count.".to_string(),
            ));
        }
        state.published.push(PublishedMessage {
            broker: self.broker_name.clone(),
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        Ok(PublishAck {
            message_id: Some(state.published.len() as u64),
        })
    }

    async fn close(&mut self) -> Result<()> {
        if self.connected {
            self.connected = false;
            self.broker.state.lock().closes += 1;
        }
        Ok(())
    }
}

/// One renderer call, as seen by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Start(RuntimeSnapshot),
    Update(RuntimeSnapshot),
    Finish(RuntimeSnapshot, RuntimeResult),
    Close,
}

/// Renderer that records every call into a shared log.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    events: Arc<Mutex<Vec<RenderEvent>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().clone()
    }
}

impl Renderer for RecordingRenderer {
    fn start(&mut self, snapshot: &RuntimeSnapshot) {
        self.events.lock().push(RenderEvent::Start(snapshot.clone()));
    }

    fn update(&mut self, snapshot: &RuntimeSnapshot) {
        self.events.lock().push(RenderEvent::Update(snapshot.clone()));
    }

    fn finish(&mut self, snapshot: &RuntimeSnapshot, result: &RuntimeResult) {
        self.events
            .lock()
            .push(RenderEvent::Finish(snapshot.clone(), result.clone()));
    }

    fn close(&mut self) {
        self.events.lock().push(RenderEvent::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_adapter_records_and_fails() {
        let broker = FakeBroker::new().with_failing_topic("bad");
        let mut adapter = broker.adapter(&BrokerConfig::new("main", "localhost"));

        assert!(adapter.publish("t", b"x", 0, false).await.is_err());
        adapter.connect().await.unwrap();
        let ack = adapter.publish("t", b"x", 1, true).await.unwrap();
        assert_eq!(ack.message_id, Some(1));
        assert!(matches!(
            adapter.publish("bad", b"x", 0, false).await,
            Err(SimError::BrokerPublish(_))
        ));

        adapter.close().await.unwrap();
        adapter.close().await.unwrap();
        assert_eq!(broker.close_count(), 1);
        assert_eq!(broker.published().len(), 1);
        assert_eq!(broker.published()[0].qos, 1);
    }

    #[tokio::test]
    async fn test_fail_after_and_connect_failure() {
        let broker = FakeBroker::new().with_fail_after(1);
        let mut adapter = broker.adapter(&BrokerConfig::new("main", "localhost"));
        adapter.connect().await.unwrap();
        adapter.publish("t", b"1", 0, false).await.unwrap();
        assert!(adapter.publish("t", b"2", 0, false).await.is_err());

        let failing = FakeBroker::new().with_connect_failure();
        let mut adapter = failing.adapter(&BrokerConfig::new("main", "localhost"));
        assert_eq!(adapter.connect().await.unwrap_err().exit_code(), 5);
    }
}
