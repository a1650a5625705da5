//! Payload generation for mqtt-sim.
//!
//! This crate turns a [`ResolvedStreamConfig`](sim_core::ResolvedStreamConfig)
//! into a stateful [`PayloadBuilder`]. Builders that need randomness get a
//! per-stream [`StdRng`](rand::rngs::StdRng), so a run with a fixed seed
//! publishes the same payload sequence every time.
//!
//! # Architecture
//!
//! ```text
//! ResolvedStreamConfig
//!        │
//!        ▼
//! ┌──────────────────────┐
//! │ build_payload_builder│── stream_rng(seed, stream_id)
//! └──────────┬───────────┘
//!            │
//!            ▼
//!   Box<dyn PayloadBuilder> ── build() ──► BuiltPayload { bytes, preview }
//!            │
//!            └─ json_fields: one Box<dyn ValueGenerator> per field
//! ```
//!
//! # Example
//!
//! ```rust
//! use sim_core::{parse_config, resolve_streams, ConfigFormat};
//! use sim_generator::build_payload_builder;
//! use std::path::Path;
//!
//! let config = parse_config(r#"
//! brokers: [{ name: main, host: localhost }]
//! streams:
//!   - broker: main
//!     topic: demo
//!     interval: 1
//!     payload:
//!       kind: json_fields
//!       fields:
//!         - name: level
//!           generator: { kind: number_walk, min: 0, max: 10, step: 5, numeric_type: int }
//! "#, ConfigFormat::Yaml).unwrap();
//!
//! let streams = resolve_streams(&config).unwrap();
//! let mut builder = build_payload_builder(&streams[0], Path::new("."), Some(42)).unwrap();
//! assert_eq!(builder.build().unwrap().bytes, br#"{"level":0}"#);
//! assert_eq!(builder.build().unwrap().bytes, br#"{"level":5}"#);
//! ```
//!
//! # Generators
//!
//! - `const` - the configured literal
//! - `bool_toggle` - alternating boolean
//! - `number_walk` - bounded back-and-forth walk
//! - `number_random` - uniform number, optionally rounded
//! - `choice` - uniform pick from a list
//! - `sequence` - ordered list, looping or holding the last item
//! - `expression` - restricted arithmetic over `prev`, `count`, `random`, `time`
//! - `timestamp` - wall clock as RFC 3339 text or Unix seconds
//! - `uuid` - random v4 UUID

pub mod expression;
pub mod generators;
pub mod payloads;
pub mod preview;
pub mod registry;
pub mod seed;

pub use generators::{build_value_generator, ValueGenerator};
pub use payloads::{BuiltPayload, PayloadBuilder};
pub use preview::{preview_payload, truncate_preview, PreviewSource, PREVIEW_LIMIT};
pub use registry::{build_payload_builder, build_payload_builders};
pub use seed::{derive_stream_seed, stream_rng};
