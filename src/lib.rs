//! mqtt-sim library
//!
//! Glue between the simulator crates: loads a configuration, resolves its
//! stream templates, builds every payload builder up front and hands the
//! result to the scheduling engine.
//!
//! # Crates
//!
//! - `sim_core` - configuration model, validation, stream resolution, error kinds
//! - `sim_generator` - value generators, expression evaluator, payload builders
//! - `sim_runtime` - scheduling engine, status model, adapter and renderer contracts
//! - `sim_mqtt` - `rumqttc`-backed broker adapter
//!
//! # CLI Usage
//!
//! ```bash
//! # Check a configuration
//! mqtt-sim validate -c streams.yaml
//!
//! # Publish for a minute with a fixed seed
//! mqtt-sim run -c streams.yaml --seed 42 --duration 60
//! ```

use sim_core::{
    load_config, resolve_streams, summarize_config, summarize_resolved, ConfigSummary, Result,
    SimulatorConfig,
};
use sim_generator::build_payload_builders;
use sim_runtime::{AdapterFactory, Renderer, RuntimeStream, SimulationEngine};
use std::path::Path;
use tracing::info;

pub mod logging;
pub mod render;

pub use render::{LogRenderer, OutputMode, TableRenderer};

/// A validated configuration with every stream ready to publish.
#[derive(Debug)]
pub struct PreparedSimulation {
    pub config: SimulatorConfig,
    pub summary: ConfigSummary,
    pub streams: Vec<RuntimeStream>,
}

impl PreparedSimulation {
    /// Wrap the prepared streams in an engine.
    pub fn into_engine(self, adapter_factory: AdapterFactory, renderer: Box<dyn Renderer>) -> SimulationEngine {
        SimulationEngine::new(self.config.brokers, self.streams, adapter_factory, renderer)
    }
}

/// Load, validate and resolve a configuration file.
pub fn validate_config_file(path: &Path) -> Result<ConfigSummary> {
    let config = load_config(path)?;
    summarize_config(&config)
}

/// Load a configuration file and build a payload builder for every resolved stream.
///
/// Relative payload file paths resolve against the configuration file's
/// directory. Any builder failure aborts preparation.
pub fn prepare_simulation(path: &Path, seed: Option<u64>) -> Result<PreparedSimulation> {
    let config = load_config(path)?;
    let resolved = resolve_streams(&config)?;
    let summary = summarize_resolved(&config, &resolved);

    let config_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let builders = build_payload_builders(&resolved, config_dir, seed)?;

    let streams = resolved
        .iter()
        .zip(builders)
        .map(|(stream, builder)| RuntimeStream::new(stream, builder))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "Prepared {} streams from {:?} (seed: {})",
        streams.len(),
        path,
        seed.map_or_else(|| "entropy".to_string(), |s| s.to_string())
    );
    Ok(PreparedSimulation {
        config,
        summary,
        streams,
    })
}

/// One-line summary printed by `mqtt-sim validate`.
pub fn format_summary(summary: &ConfigSummary) -> String {
    summary.to_string()
}
