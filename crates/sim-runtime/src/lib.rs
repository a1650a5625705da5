//! Scheduling engine for mqtt-sim.
//!
//! This crate drives a set of resolved streams against broker adapters:
//! 1. Connect one adapter per broker that a stream references
//! 2. Publish each stream on its own interval from a single scheduling loop
//! 3. Track per-stream status and hand snapshots to a renderer
//!
//! Brokers and renderers sit behind the [`BrokerAdapter`] and [`Renderer`]
//! traits. The [`fake`] module provides in-memory versions of both.
//!
//! # Example
//!
//! ```ignore
//! use sim_runtime::{fake::FakeBroker, SimulationEngine};
//!
//! let broker = FakeBroker::new();
//! let engine = SimulationEngine::new(config.brokers.clone(), streams, broker.factory(), renderer)
//!     .with_duration(Some(Duration::from_secs(10)));
//! let result = engine.run_until(async { tokio::signal::ctrl_c().await.ok(); }).await?;
//! ```

pub mod adapter;
pub mod clock;
pub mod engine;
pub mod fake;
pub mod models;
pub mod renderer;

pub use adapter::{AdapterFactory, BrokerAdapter, PublishAck};
pub use clock::{Clock, SystemClock};
pub use engine::{SimulationEngine, EXIT_FAILED_FAST, EXIT_INTERRUPTED};
pub use models::{RuntimeResult, RuntimeSnapshot, RuntimeStream, StreamState, StreamStatus};
pub use renderer::Renderer;
