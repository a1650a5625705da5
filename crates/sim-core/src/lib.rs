//! Core types for the mqtt-sim framework.
//!
//! This crate provides the foundational pieces shared by the generator, the
//! runtime and the command-line tool:
//!
//! - [`SimError`] - error kinds with stable exit codes
//! - [`SimulatorConfig`] - the configuration document (brokers + stream templates)
//! - [`load_config`] / [`parse_config`] - loading and validation
//! - [`resolve_streams`] - template expansion into [`ResolvedStreamConfig`]
//!
//! # Architecture
//!
//! ```text
//! sim-core (this crate)
//!    │
//!    ├─── sim-generator  (builds payload builders from resolved streams)
//!    │
//!    ├─── sim-runtime    (schedules and publishes resolved streams)
//!    │
//!    └─── sim-mqtt       (broker adapter for BrokerConfig)
//! ```
//!
//! # Example
//!
//! ```rust
//! use sim_core::{parse_config, resolve_streams, ConfigFormat};
//!
//! let config = parse_config(r#"
//! brokers:
//!   - name: main
//!     host: localhost
//! streams:
//!   - broker: main
//!     topic: "device/{id}"
//!     interval: 1.0
//!     expand: { kind: range, var: id, start: 1, stop: 3 }
//!     payload: { kind: text, value: "hello-{id}" }
//! "#, ConfigFormat::Yaml).unwrap();
//!
//! let streams = resolve_streams(&config).unwrap();
//! assert_eq!(streams.len(), 3);
//! assert_eq!(streams[0].topic, "device/1");
//! ```

pub mod config;
pub mod error;
pub mod expand;
pub mod loader;

// Re-exports for convenience
pub use config::{
    BrokerConfig, ConfigSummary, ExpansionSpec, GeneratorSpec, JsonFieldSpec, PayloadSpec,
    SimulatorConfig, StreamTemplate,
};
pub use error::{Result, SimError};
pub use expand::{
    range_len, resolve_streams, resolve_template, ExpansionContext, ResolvedStreamConfig,
    MAX_RANGE_VALUES,
};
pub use loader::{
    load_config, parse_config, summarize_config, summarize_resolved, validate_config, ConfigFormat,
};
