//! The scheduling engine.
//!
//! One control flow owns every stream. Streams wait in a min-heap keyed by
//! `(due time, registration index)`, so streams that fall due together are
//! served in registration order. Each iteration pops one stream, builds its
//! payload, publishes it through the stream's broker adapter, updates the
//! stream status and hands a fresh snapshot to the renderer.
//!
//! ```text
//!  connect adapters ──► renderer.start
//!         │
//!         ▼
//!  ┌──────────────── loop ────────────────┐
//!  │ pop earliest (due, index)            │
//!  │ sleep until due (bounded by duration)│
//!  │ build ─► publish ─► status           │
//!  │ fail-fast? ─► update, stop           │
//!  │ reschedule at now + interval         │
//!  │ renderer.update                      │
//!  └──────────────────────────────────────┘
//!         │  (exhausted | duration | fail-fast | interrupt)
//!         ▼
//!  mark stopped ─► close adapters ─► renderer.finish ─► renderer.close
//! ```

use crate::adapter::{AdapterFactory, BrokerAdapter};
use crate::clock::{Clock, SystemClock};
use crate::models::{RuntimeResult, RuntimeSnapshot, RuntimeStream, StreamState, StreamStatus};
use crate::renderer::Renderer;
use chrono::{DateTime, Utc};
use sim_core::{BrokerConfig, Result, SimError};
use sim_generator::BuiltPayload;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Exit code of a run that stopped at its first stream failure.
pub const EXIT_FAILED_FAST: i32 = 1;

/// Exit code of a run that was interrupted.
pub const EXIT_INTERRUPTED: i32 = 130;

type Adapters = BTreeMap<String, Box<dyn BrokerAdapter>>;

/// Mutable bookkeeping of one run.
struct RunState {
    statuses: Vec<StreamStatus>,
    total_publishes: u64,
    total_errors: u64,
    failed_fast: bool,
    renderer_started: bool,
    started_at: DateTime<Utc>,
    started_mono: Duration,
}

impl RunState {
    fn snapshot(&self, now: DateTime<Utc>) -> RuntimeSnapshot {
        RuntimeSnapshot {
            started_at: self.started_at,
            now,
            streams: self.statuses.clone(),
            total_publishes: self.total_publishes,
            total_errors: self.total_errors,
        }
    }
}

/// Runs a simulation by scheduling streams and publishing through broker adapters.
pub struct SimulationEngine {
    brokers: Vec<BrokerConfig>,
    streams: Vec<RuntimeStream>,
    adapter_factory: AdapterFactory,
    renderer: Box<dyn Renderer>,
    clock: Arc<dyn Clock>,
    fail_fast: bool,
    duration: Option<Duration>,
}

impl SimulationEngine {
    /// Create an engine over `streams`, keep-going policy, no duration bound.
    pub fn new(
        brokers: Vec<BrokerConfig>,
        streams: Vec<RuntimeStream>,
        adapter_factory: AdapterFactory,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        Self {
            brokers,
            streams,
            adapter_factory,
            renderer,
            clock: Arc::new(SystemClock::new()),
            fail_fast: false,
            duration: None,
        }
    }

    /// Stop the run at the first stream failure.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Stop scheduling once this much time has elapsed.
    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run until the streams are exhausted, the duration bound is reached, or
    /// fail-fast aborts.
    pub async fn run(self) -> Result<RuntimeResult> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Like [`run`](Self::run), but also stops when `signal` completes.
    ///
    /// An interrupted run still closes its adapters and renders the final
    /// snapshot; the result is flagged `interrupted`.
    ///
    /// Returns an error only if setup fails; connected adapters are closed
    /// and the renderer is closed without being started.
    pub async fn run_until<F>(mut self, signal: F) -> Result<RuntimeResult>
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(signal);

        let mut state = RunState {
            statuses: self.streams.iter().map(StreamStatus::new).collect(),
            total_publishes: 0,
            total_errors: 0,
            failed_fast: false,
            renderer_started: false,
            started_at: self.clock.wall_time(),
            started_mono: self.clock.monotonic(),
        };
        let mut adapters = Adapters::new();

        let setup = tokio::select! {
            biased;
            _ = &mut signal => None,
            connected = self.connect_adapters(&mut adapters) => Some(connected),
        };

        let interrupted = match setup {
            Some(Err(e)) => {
                error!("Broker setup failed: {e}");
                self.close_adapters(&mut adapters).await;
                self.renderer.close();
                return Err(e);
            }
            Some(Ok(())) => {
                let snapshot = state.snapshot(self.clock.wall_time());
                self.renderer.start(&snapshot);
                state.renderer_started = true;

                tokio::select! {
                    biased;
                    _ = &mut signal => true,
                    _ = self.drive(&mut adapters, &mut state) => false,
                }
            }
            None => true,
        };

        if interrupted {
            warn!("Simulation interrupted; shutting down");
        }
        Ok(self.shutdown(adapters, state, interrupted).await)
    }

    /// Connect one adapter per broker referenced by a stream, in first-use order.
    async fn connect_adapters(&self, adapters: &mut Adapters) -> Result<()> {
        let mut names: Vec<&str> = Vec::new();
        for stream in &self.streams {
            if !names.contains(&stream.broker_name.as_str()) {
                names.push(stream.broker_name.as_str());
            }
        }

        for name in names {
            let broker = self
                .brokers
                .iter()
                .find(|b| b.name == name)
                .ok_or_else(|| SimError::RuntimeExecution(format!("stream references unknown broker '{name}'")))?;

            info!("Connecting broker '{}' ({}:{})", broker.name, broker.host, broker.port);
            let mut adapter = (self.adapter_factory)(broker);
            adapter.connect().await?;
            adapters.insert(name.to_string(), adapter);
        }
        Ok(())
    }

    async fn drive(&mut self, adapters: &mut Adapters, state: &mut RunState) {
        let mut due: BinaryHeap<Reverse<(Duration, usize)>> = BinaryHeap::with_capacity(self.streams.len());
        let now = self.clock.monotonic();
        for index in 0..self.streams.len() {
            due.push(Reverse((now, index)));
        }

        while let Some(Reverse((due_at, index))) = due.pop() {
            let mut now = self.clock.monotonic();
            if self.duration_reached(state, now) {
                break;
            }

            if due_at > now {
                let mut wait = due_at - now;
                if let Some(limit) = self.duration {
                    wait = wait.min(limit.saturating_sub(now - state.started_mono));
                }
                if !wait.is_zero() {
                    self.clock.sleep(wait).await;
                }
                now = self.clock.monotonic();
                if self.duration_reached(state, now) {
                    break;
                }
            }

            self.process(index, adapters, state).await;

            if state.failed_fast {
                let snapshot = state.snapshot(self.clock.wall_time());
                self.renderer.update(&snapshot);
                break;
            }

            let next_due = self.clock.monotonic() + self.streams[index].interval;
            due.push(Reverse((next_due, index)));

            let snapshot = state.snapshot(self.clock.wall_time());
            self.renderer.update(&snapshot);
        }
    }

    fn duration_reached(&self, state: &RunState, now: Duration) -> bool {
        self.duration
            .is_some_and(|limit| now.saturating_sub(state.started_mono) >= limit)
    }

    /// Build and publish one payload for the stream at `index`.
    async fn process(&mut self, index: usize, adapters: &mut Adapters, state: &mut RunState) {
        let stream = &mut self.streams[index];
        let status = &mut state.statuses[index];
        status.state = StreamState::Running;
        status.last_error.clear();

        match publish_once(stream, adapters).await {
            Ok(built) => {
                state.total_publishes += 1;
                status.publish_count += 1;
                status.last_publish = Some(self.clock.wall_time());
                status.last_payload_preview = built.preview;
                status.state = StreamState::Ok;
                debug!(
                    stream_id = %stream.stream_id,
                    topic = %stream.topic,
                    bytes = built.bytes.len(),
                    "Published"
                );
            }
            Err(e) => {
                state.total_errors += 1;
                status.error_count += 1;
                status.state = StreamState::Error;
                status.last_error = e.to_string();
                match &e {
                    SimError::BrokerPublish(_) => {
                        error!("Publish error for {}: {e}", stream.stream_id);
                    }
                    other => {
                        error!(
                            kind = other.kind(),
                            "Unhandled stream error for {}: {other:?}", stream.stream_id
                        );
                    }
                }
                if self.fail_fast {
                    state.failed_fast = true;
                }
            }
        }
    }

    async fn close_adapters(&self, adapters: &mut Adapters) {
        for (name, adapter) in adapters.iter_mut() {
            if let Err(e) = adapter.close().await {
                warn!("Error closing broker adapter '{name}': {e}");
            }
        }
    }

    async fn shutdown(mut self, mut adapters: Adapters, mut state: RunState, interrupted: bool) -> RuntimeResult {
        for status in &mut state.statuses {
            if status.state != StreamState::Error {
                status.state = StreamState::Stopped;
            }
        }

        self.close_adapters(&mut adapters).await;

        let snapshot = state.snapshot(self.clock.wall_time());
        let exit_code = if interrupted {
            EXIT_INTERRUPTED
        } else if state.failed_fast {
            EXIT_FAILED_FAST
        } else {
            0
        };
        let result = RuntimeResult {
            exit_code,
            total_publishes: state.total_publishes,
            total_errors: state.total_errors,
            failed_fast: state.failed_fast,
            interrupted,
            duration: self.clock.monotonic().saturating_sub(state.started_mono),
        };

        info!(
            "Simulation finished ({}): published={} errors={} duration={:.2}s",
            result.outcome(),
            result.total_publishes,
            result.total_errors,
            result.duration.as_secs_f64()
        );

        if !state.renderer_started {
            self.renderer.start(&snapshot);
        }
        self.renderer.finish(&snapshot, &result);
        self.renderer.close();
        result
    }
}

async fn publish_once(stream: &mut RuntimeStream, adapters: &mut Adapters) -> Result<BuiltPayload> {
    let built = stream.payload_builder.build()?;
    let adapter = adapters.get_mut(&stream.broker_name).ok_or_else(|| {
        SimError::RuntimeExecution(format!("no adapter connected for broker '{}'", stream.broker_name))
    })?;
    adapter
        .publish(&stream.topic, &built.bytes, stream.qos, stream.retain)
        .await?;
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeBroker, RecordingRenderer, RenderEvent};
    use sim_core::{PayloadSpec, ResolvedStreamConfig};
    use sim_generator::payloads::TextPayloadBuilder;

    fn stream(id: &str, topic: &str, interval: f64) -> RuntimeStream {
        let config = ResolvedStreamConfig {
            stream_id: id.to_string(),
            broker: "main".to_string(),
            topic: topic.to_string(),
            interval,
            qos: 0,
            retain: false,
            payload: PayloadSpec::Text {
                value: format!("{id}-payload"),
            },
            context: None,
        };
        RuntimeStream::new(&config, Box::new(TextPayloadBuilder::new(format!("{id}-payload")))).unwrap()
    }

    fn engine(broker: &FakeBroker, renderer: &RecordingRenderer, streams: Vec<RuntimeStream>) -> SimulationEngine {
        SimulationEngine::new(
            vec![BrokerConfig::new("main", "localhost")],
            streams,
            broker.factory(),
            Box::new(renderer.clone()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_going_policy_completes() {
        let broker = FakeBroker::new().with_failing_topic("bad/topic");
        let renderer = RecordingRenderer::new();
        let streams = vec![stream("good", "good/topic", 1.0), stream("bad", "bad/topic", 1.0)];

        let result = engine(&broker, &renderer, streams)
            .with_duration(Some(Duration::from_secs(3)))
            .run()
            .await
            .unwrap();

        assert_eq!(result.exit_code, 0);
        assert!(!result.failed_fast);
        assert!(result.total_errors >= 1);
        assert!(result.total_publishes >= 1);
        assert!(!broker.published_to("good/topic").is_empty());
        assert!(broker.published_to("bad/topic").is_empty());
        assert_eq!(broker.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_fast_policy_aborts() {
        let broker = FakeBroker::new().with_failing_topic("bad/topic");
        let renderer = RecordingRenderer::new();
        let streams = vec![stream("good", "good/topic", 1.0), stream("bad", "bad/topic", 1.0)];

        let result = engine(&broker, &renderer, streams)
            .with_fail_fast(true)
            .with_duration(Some(Duration::from_secs(3)))
            .run()
            .await
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(result.failed_fast);
        assert!(result.total_errors >= 1);
        // the healthy stream was registered first and ran before the abort
        assert_eq!(result.total_publishes, 1);
        assert_eq!(broker.close_count(), 1);

        let events = renderer.events();
        let Some(RenderEvent::Finish(snapshot, _)) = events.iter().rev().nth(1) else {
            panic!("Expected finish before close, got {events:?}");
        };
        assert_eq!(snapshot.streams[0].state, StreamState::Stopped);
        assert_eq!(snapshot.streams[1].state, StreamState::Error);
        assert!(snapshot.streams[1].last_error.contains("bad/topic"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_cadence_follows_interval() {
        let broker = FakeBroker::new();
        let renderer = RecordingRenderer::new();
        let streams = vec![stream("fast", "fast", 1.0), stream("slow", "slow", 2.5)];

        let result = engine(&broker, &renderer, streams)
            .with_duration(Some(Duration::from_secs(5)))
            .run()
            .await
            .unwrap();

        // fast: 0,1,2,3,4   slow: 0,2.5
        assert_eq!(broker.published_to("fast").len(), 5);
        assert_eq!(broker.published_to("slow").len(), 2);
        assert_eq!(result.total_publishes, 7);
        assert!(result.duration >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_coinciding_streams_publish_in_registration_order() {
        let broker = FakeBroker::new();
        let renderer = RecordingRenderer::new();
        let streams = vec![stream("a", "a", 1.0), stream("b", "b", 1.0), stream("c", "c", 1.0)];

        engine(&broker, &renderer, streams)
            .with_duration(Some(Duration::from_millis(1500)))
            .run()
            .await
            .unwrap();

        let topics: Vec<String> = broker.published().into_iter().map(|m| m.topic).collect();
        assert_eq!(topics, vec!["a", "b", "c", "a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_renderer_call_order() {
        let broker = FakeBroker::new();
        let renderer = RecordingRenderer::new();

        engine(&broker, &renderer, vec![stream("s", "s", 1.0)])
            .with_duration(Some(Duration::from_millis(2500)))
            .run()
            .await
            .unwrap();

        let events = renderer.events();
        assert!(matches!(events.first(), Some(RenderEvent::Start(_))));
        assert!(matches!(events.last(), Some(RenderEvent::Close)));
        let updates = events.iter().filter(|e| matches!(e, RenderEvent::Update(_))).count();
        assert_eq!(updates, 3);
        let finishes = events.iter().filter(|e| matches!(e, RenderEvent::Finish(..))).count();
        assert_eq!(finishes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_aborts_before_publishing() {
        let broker = FakeBroker::new().with_connect_failure();
        let renderer = RecordingRenderer::new();

        let err = engine(&broker, &renderer, vec![stream("s", "s", 1.0)])
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, SimError::BrokerConnection(_)));
        assert!(broker.published().is_empty());
        assert_eq!(renderer.events(), vec![RenderEvent::Close]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_runs_shutdown() {
        let broker = FakeBroker::new();
        let renderer = RecordingRenderer::new();

        let result = engine(&broker, &renderer, vec![stream("s", "s", 1.0)])
            .run_until(tokio::time::sleep(Duration::from_millis(2500)))
            .await
            .unwrap();

        assert!(result.interrupted);
        assert_eq!(result.exit_code, EXIT_INTERRUPTED);
        assert_eq!(result.total_publishes, 3);
        assert_eq!(broker.close_count(), 1);

        let events = renderer.events();
        let Some(RenderEvent::Finish(snapshot, finished)) = events.iter().rev().nth(1) else {
            panic!("Expected finish before close, got {events:?}");
        };
        assert!(finished.interrupted);
        assert_eq!(snapshot.streams[0].state, StreamState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_referenced_brokers_connect() {
        let broker = FakeBroker::new();
        let renderer = RecordingRenderer::new();

        SimulationEngine::new(
            vec![
                BrokerConfig::new("main", "localhost"),
                BrokerConfig::new("unused", "elsewhere"),
            ],
            vec![stream("a", "a", 1.0), stream("b", "b", 1.0)],
            broker.factory(),
            Box::new(renderer),
        )
        .with_duration(Some(Duration::from_millis(500)))
        .run()
        .await
        .unwrap();

        assert_eq!(broker.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_payload_errors_count_as_stream_errors() {
        use sim_generator::payloads::JsonFieldsPayloadBuilder;
        use sim_core::{GeneratorSpec, JsonFieldSpec};
        use rand::SeedableRng;

        let fields = vec![JsonFieldSpec {
            name: "x".to_string(),
            generator: GeneratorSpec::Expression {
                expression: "1 / count".to_string(),
            },
        }];
        let builder =
            JsonFieldsPayloadBuilder::new(&fields, &mut rand::rngs::StdRng::seed_from_u64(1)).unwrap();
        let mut broken = stream("expr", "expr", 1.0);
        broken.payload_builder = Box::new(builder);

        let broker = FakeBroker::new();
        let result = engine(&broker, &RecordingRenderer::new(), vec![broken])
            .with_duration(Some(Duration::from_millis(1500)))
            .run()
            .await
            .unwrap();

        // first build divides by zero; count stays 0 so the fault repeats
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.total_errors, 2);
        assert_eq!(result.total_publishes, 0);
    }
}
