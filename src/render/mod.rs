//! Console renderers for engine snapshots.

pub mod log;
pub mod output_mode;
pub mod table;

pub use log::LogRenderer;
pub use output_mode::OutputMode;
pub use table::TableRenderer;

use sim_runtime::{Renderer, RuntimeResult, RuntimeSnapshot};
use std::io::IsTerminal;

/// Create the renderer for `mode`, writing to stdout.
pub fn create_renderer(mode: OutputMode, verbose: bool) -> Box<dyn Renderer> {
    match mode.resolve(std::io::stdout().is_terminal()) {
        OutputMode::Table => Box::new(TableRenderer::new(std::io::stdout())),
        _ => Box::new(LogRenderer::new(std::io::stdout(), verbose)),
    }
}

/// `Starting simulator: ...` line.
pub fn start_line(snapshot: &RuntimeSnapshot) -> String {
    format!(
        "Starting simulator: streams={} published={} errors={}",
        snapshot.streams.len(),
        snapshot.total_publishes,
        snapshot.total_errors
    )
}

/// `Finished (...)` line shared by every renderer.
pub fn finish_line(snapshot: &RuntimeSnapshot, result: &RuntimeResult) -> String {
    format!(
        "Finished ({}): streams={} published={} errors={} duration={:.2}s",
        result.outcome(),
        snapshot.streams.len(),
        result.total_publishes,
        result.total_errors,
        result.duration.as_secs_f64()
    )
}
