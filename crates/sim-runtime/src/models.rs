//! Runtime inputs, status snapshots and outcomes.

use chrono::{DateTime, Utc};
use sim_core::{ResolvedStreamConfig, Result, SimError};
use sim_generator::PayloadBuilder;
use std::fmt;
use std::time::Duration;

/// Lifecycle state of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Pending,
    Running,
    Ok,
    Error,
    Stopped,
}

impl StreamState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamState::Pending => "pending",
            StreamState::Running => "running",
            StreamState::Ok => "ok",
            StreamState::Error => "error",
            StreamState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One publish stream bound to its broker and payload builder.
pub struct RuntimeStream {
    pub stream_id: String,
    pub broker_name: String,
    pub topic: String,
    pub interval: Duration,
    pub qos: u8,
    pub retain: bool,
    pub payload_kind: &'static str,
    pub payload_builder: Box<dyn PayloadBuilder>,
}

impl RuntimeStream {
    /// Bind a resolved stream to its payload builder.
    pub fn new(config: &ResolvedStreamConfig, payload_builder: Box<dyn PayloadBuilder>) -> Result<Self> {
        let interval = Duration::try_from_secs_f64(config.interval).map_err(|e| {
            SimError::RuntimeExecution(format!(
                "stream {}: invalid interval {}: {e}",
                config.stream_id, config.interval
            ))
        })?;
        if interval.is_zero() {
            return Err(SimError::RuntimeExecution(format!(
                "stream {}: interval must be > 0",
                config.stream_id
            )));
        }
        Ok(Self {
            stream_id: config.stream_id.clone(),
            broker_name: config.broker.clone(),
            topic: config.topic.clone(),
            interval,
            qos: config.qos,
            retain: config.retain,
            payload_kind: config.payload.kind(),
            payload_builder,
        })
    }
}

impl fmt::Debug for RuntimeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeStream")
            .field("stream_id", &self.stream_id)
            .field("broker_name", &self.broker_name)
            .field("topic", &self.topic)
            .field("interval", &self.interval)
            .field("qos", &self.qos)
            .field("retain", &self.retain)
            .field("payload_kind", &self.payload_kind)
            .finish_non_exhaustive()
    }
}

/// Mutable per-stream status, owned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamStatus {
    pub stream_id: String,
    pub topic: String,
    /// Interval in seconds
    pub interval: f64,
    pub state: StreamState,
    pub publish_count: u64,
    pub error_count: u64,
    pub last_publish: Option<DateTime<Utc>>,
    pub last_payload_preview: String,
    pub last_error: String,
}

impl StreamStatus {
    pub fn new(stream: &RuntimeStream) -> Self {
        Self {
            stream_id: stream.stream_id.clone(),
            topic: stream.topic.clone(),
            interval: stream.interval.as_secs_f64(),
            state: StreamState::Pending,
            publish_count: 0,
            error_count: 0,
            last_publish: None,
            last_payload_preview: String::new(),
            last_error: String::new(),
        }
    }
}

/// Point-in-time copy of every stream status, handed to renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSnapshot {
    pub started_at: DateTime<Utc>,
    pub now: DateTime<Utc>,
    pub streams: Vec<StreamStatus>,
    pub total_publishes: u64,
    pub total_errors: u64,
}

impl RuntimeSnapshot {
    /// Wall time between start and this snapshot, never negative.
    pub fn elapsed(&self) -> Duration {
        (self.now - self.started_at).to_std().unwrap_or_default()
    }
}

/// Final outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeResult {
    /// 0 for a clean run, 1 after a fail-fast abort, 130 when interrupted
    pub exit_code: i32,
    pub total_publishes: u64,
    pub total_errors: u64,
    pub failed_fast: bool,
    pub interrupted: bool,
    pub duration: Duration,
}

impl RuntimeResult {
    /// Short label for the way the run ended.
    pub fn outcome(&self) -> &'static str {
        if self.interrupted {
            "interrupted"
        } else if self.failed_fast {
            "failed-fast"
        } else {
            "done"
        }
    }
}
