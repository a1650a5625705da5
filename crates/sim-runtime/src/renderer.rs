//! Renderer contract driven by the engine.

use crate::models::{RuntimeResult, RuntimeSnapshot};

/// Presents runtime progress.
///
/// Call order: `start` once, `update` after each processed stream, `finish`
/// once, `close` last. If setup fails only `close` is called.
pub trait Renderer: Send {
    fn start(&mut self, snapshot: &RuntimeSnapshot);

    fn update(&mut self, snapshot: &RuntimeSnapshot);

    fn finish(&mut self, snapshot: &RuntimeSnapshot, result: &RuntimeResult);

    /// Release resources such as terminal state.
    fn close(&mut self);
}
