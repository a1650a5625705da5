//! Line-oriented renderer for pipes and log captures.

use super::{finish_line, start_line};
use sim_runtime::{Renderer, RuntimeResult, RuntimeSnapshot};
use std::io::Write;
use tracing::debug;

/// Prints one line per notable change between snapshots.
///
/// Errors are always reported; publishes only in verbose mode.
pub struct LogRenderer<W: Write + Send> {
    out: W,
    verbose: bool,
    /// Last seen `(publish_count, error_count)` per stream
    seen: Vec<(u64, u64)>,
}

impl<W: Write + Send> LogRenderer<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            seen: Vec::new(),
        }
    }

    fn emit(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}") {
            debug!("Failed to write render output: {e}");
        }
    }

    fn report_changes(&mut self, snapshot: &RuntimeSnapshot) {
        self.seen.resize(snapshot.streams.len(), (0, 0));
        for (index, status) in snapshot.streams.iter().enumerate() {
            let (published, errors) = self.seen[index];
            if status.error_count > errors {
                self.emit(&format!("ERROR {}: {}", status.topic, status.last_error));
            }
            if self.verbose && status.publish_count > published {
                self.emit(&format!(
                    "PUB {} count={} payload={}",
                    status.topic, status.publish_count, status.last_payload_preview
                ));
            }
            self.seen[index] = (status.publish_count, status.error_count);
        }
    }
}

impl<W: Write + Send> Renderer for LogRenderer<W> {
    fn start(&mut self, snapshot: &RuntimeSnapshot) {
        self.seen = snapshot
            .streams
            .iter()
            .map(|s| (s.publish_count, s.error_count))
            .collect();
        self.emit(&start_line(snapshot));
    }

    fn update(&mut self, snapshot: &RuntimeSnapshot) {
        self.report_changes(snapshot);
    }

    fn finish(&mut self, snapshot: &RuntimeSnapshot, result: &RuntimeResult) {
        self.report_changes(snapshot);
        self.emit(&finish_line(snapshot, result));
    }

    fn close(&mut self) {
        if let Err(e) = self.out.flush() {
            debug!("Failed to flush render output: {e}");
        }
    }
}
