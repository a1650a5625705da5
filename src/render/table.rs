//! In-place status table for interactive terminals.

use super::finish_line;
use sim_generator::truncate_preview;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use sim_runtime::{Renderer, RuntimeResult, RuntimeSnapshot, StreamState, StreamStatus};
use std::io::Write;
use std::time::Duration;
use tracing::debug;

const HEADERS: [&str; 7] = ["TOPIC", "STATE", "INTERVAL", "COUNT", "LAST PUB", "PAYLOAD", "ERR"];

/// Minimum time between redraws, in snapshot time.
pub const DEFAULT_REDRAW_INTERVAL: Duration = Duration::from_millis(200);

const PAYLOAD_WIDTH: usize = 32;
const ERROR_WIDTH: usize = 40;

/// Redraws a status table over its previous frame.
pub struct TableRenderer<W: Write + Send> {
    out: W,
    /// Lines of the frame currently on screen
    drawn_lines: usize,
    last_draw: Option<chrono::DateTime<chrono::Utc>>,
    redraw_interval: Duration,
}

impl<W: Write + Send> TableRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            drawn_lines: 0,
            last_draw: None,
            redraw_interval: DEFAULT_REDRAW_INTERVAL,
        }
    }

    pub fn with_redraw_interval(mut self, interval: Duration) -> Self {
        self.redraw_interval = interval;
        self
    }

    fn due(&self, snapshot: &RuntimeSnapshot) -> bool {
        match self.last_draw {
            None => true,
            Some(last) => (snapshot.now - last)
                .to_std()
                .is_ok_and(|since| since >= self.redraw_interval),
        }
    }

    fn draw(&mut self, snapshot: &RuntimeSnapshot) {
        let lines = render_table(snapshot);
        let mut frame = String::new();
        if self.drawn_lines > 0 {
            // cursor up, then clear to end of screen
            frame.push_str(&format!("\x1b[{}A\x1b[J", self.drawn_lines));
        }
        for line in &lines {
            frame.push_str(line);
            frame.push('\n');
        }
        if let Err(e) = self.out.write_all(frame.as_bytes()).and_then(|_| self.out.flush()) {
            debug!("Failed to draw status table: {e}");
        }
        self.drawn_lines = lines.len();
        self.last_draw = Some(snapshot.now);
    }
}

impl<W: Write + Send> Renderer for TableRenderer<W> {
    fn start(&mut self, snapshot: &RuntimeSnapshot) {
        self.draw(snapshot);
    }

    fn update(&mut self, snapshot: &RuntimeSnapshot) {
        if self.due(snapshot) {
            self.draw(snapshot);
        }
    }

    fn finish(&mut self, snapshot: &RuntimeSnapshot, result: &RuntimeResult) {
        self.draw(snapshot);
        if let Err(e) = writeln!(self.out, "{}", finish_line(snapshot, result)) {
            debug!("Failed to write table footer: {e}");
        }
        self.drawn_lines = 0;
    }

    fn close(&mut self) {
        if let Err(e) = self.out.flush() {
            debug!("Failed to flush status table: {e}");
        }
    }
}

fn state_cell(state: StreamState) -> Cell {
    let cell = Cell::new(state.as_str());
    match state {
        StreamState::Ok => cell.fg(Color::Green),
        StreamState::Error => cell.fg(Color::Red),
        _ => cell,
    }
}

fn row(status: &StreamStatus) -> Vec<Cell> {
    let last_pub = status
        .last_publish
        .map_or_else(|| "-".to_string(), |t| t.format("%H:%M:%S").to_string());
    let err = if status.last_error.is_empty() {
        status.error_count.to_string()
    } else {
        format!(
            "{} {}",
            status.error_count,
            truncate_preview(&status.last_error, ERROR_WIDTH)
        )
    };
    vec![
        Cell::new(&status.topic),
        state_cell(status.state),
        Cell::new(format!("{}s", status.interval)),
        Cell::new(status.publish_count),
        Cell::new(last_pub),
        Cell::new(truncate_preview(&status.last_payload_preview, PAYLOAD_WIDTH)),
        Cell::new(err),
    ]
}

/// Render a snapshot as table lines, title first.
pub fn render_table(snapshot: &RuntimeSnapshot) -> Vec<String> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(HEADERS);
    for status in &snapshot.streams {
        table.add_row(row(status));
    }

    let mut lines = vec![format!(
        "mqtt-sim  elapsed={:.1}s  published={}  errors={}",
        snapshot.elapsed().as_secs_f64(),
        snapshot.total_publishes,
        snapshot.total_errors
    )];
    lines.extend(table.to_string().lines().map(str::to_string));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::{result, snapshot, status, SharedBuffer};

    fn line_with<'a>(lines: &'a [String], needle: &str) -> &'a str {
        lines
            .iter()
            .find(|l| l.contains(needle))
            .unwrap_or_else(|| panic!("No line contains {needle:?}: {lines:#?}"))
    }

    #[test]
    fn test_table_lists_every_stream() {
        let mut long = status("sensors/building-7/temperature");
        long.state = StreamState::Ok;
        long.publish_count = 12;
        long.last_payload_preview = "21.5".to_string();
        let lines = render_table(&snapshot(vec![status("a"), long], 3000));

        assert!(lines[0].contains("elapsed=3.0s"));
        let header = line_with(&lines, "TOPIC");
        for column in HEADERS {
            assert!(header.contains(column), "missing {column}");
        }
        assert!(line_with(&lines, "pending").contains(" a "));
        let row = line_with(&lines, "sensors/building-7/temperature");
        assert!(row.contains("ok"));
        assert!(row.contains("21.5"));
        assert!(row.contains("12"));

        // title, then header and two rows separated by four rules
        let rules = lines.iter().filter(|l| !l.contains('│')).count();
        assert_eq!(lines.len(), 1 + 2 * 3 + 1, "{lines:#?}");
        assert_eq!(rules, 1 + 3 + 1);
    }

    #[test]
    fn test_error_column_shows_last_error() {
        let mut s = status("t");
        s.error_count = 2;
        s.last_error = "connection lost".to_string();
        let lines = render_table(&snapshot(vec![s], 0));
        assert!(line_with(&lines, "connection lost").contains("2 connection lost"));
    }

    #[test]
    fn test_redraw_is_throttled() {
        let buffer = SharedBuffer::default();
        let mut renderer = TableRenderer::new(buffer.clone());
        let frame_lines = render_table(&snapshot(vec![status("t")], 0)).len();

        renderer.start(&snapshot(vec![status("t")], 0));
        renderer.update(&snapshot(vec![status("t")], 50));
        renderer.update(&snapshot(vec![status("t")], 300));

        let out = buffer.contents();
        // start frame plus one redraw
        assert_eq!(out.matches("mqtt-sim  elapsed=").count(), 2);
        assert_eq!(out.matches(&format!("\x1b[{frame_lines}A\x1b[J")).count(), 1);
    }

    #[test]
    fn test_finish_prints_footer() {
        let buffer = SharedBuffer::default();
        let mut renderer = TableRenderer::new(buffer.clone());
        let snap = snapshot(vec![status("t")], 2500);

        renderer.start(&snapshot(vec![status("t")], 0));
        renderer.finish(&snap, &result(&snap));
        renderer.close();

        assert!(buffer
            .contents()
            .ends_with("Finished (done): streams=1 published=0 errors=0 duration=2.50s\n"));
    }
}
