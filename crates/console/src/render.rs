//! Plain-text and JSON rendering of feed snapshots.
//!
//! The feed hands out raw `f64`s; rounding happens only here.

use std::io::Write;

use feed_config::{DisplayConfig, OutputFormat};
use feed_core::{FeedObserver, FeedSnapshot};
use parking_lot::Mutex;
use tracing::warn;

/// Format an optional value with `decimals` digits, or `--` when absent.
pub fn format_value(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "--".to_string(),
    }
}

/// One-line summary, e.g.
/// `[14:03:27] now 72.4  min 68.0  max 80.1  avg 74.2  (12/20) running`.
pub fn render_line(snapshot: &FeedSnapshot, decimals: usize) -> String {
    let agg = &snapshot.aggregates;
    let stamp = snapshot.newest().map_or("--:--:--", |r| r.timestamp());
    format!(
        "[{stamp}] now {}  min {}  max {}  avg {}  ({}/{}) {}",
        format_value(agg.current, decimals),
        format_value(agg.min, decimals),
        format_value(agg.max, decimals),
        format_value(agg.average, decimals),
        snapshot.readings.len(),
        snapshot.capacity,
        snapshot.run_state.label(),
    )
}

/// Multi-line listing of every reading in the window, newest first.
pub fn render_window(snapshot: &FeedSnapshot, decimals: usize) -> String {
    let mut out = render_line(snapshot, decimals);
    if snapshot.readings.is_empty() {
        out.push_str("\n  (no readings yet)");
    }
    for (i, reading) in snapshot.readings.iter().enumerate() {
        out.push_str(&format!(
            "\n  {:>2}  {}  {}",
            i + 1,
            reading.timestamp(),
            format_value(Some(reading.value()), decimals),
        ));
    }
    out
}

pub fn render_json(snapshot: &FeedSnapshot) -> serde_json::Result<String> {
    serde_json::to_string(snapshot)
}

/// [`FeedObserver`] that writes one line per published snapshot.
pub struct ConsolePrinter {
    display: Mutex<DisplayConfig>,
    out:     Mutex<Box<dyn Write + Send>>,
}

impl ConsolePrinter {
    pub fn new(display: DisplayConfig, out: Box<dyn Write + Send>) -> Self {
        Self {
            display: Mutex::new(display),
            out:     Mutex::new(out),
        }
    }

    pub fn stdout(display: DisplayConfig) -> Self {
        Self::new(display, Box::new(std::io::stdout()))
    }

    pub fn set_display(&self, display: DisplayConfig) {
        *self.display.lock() = display;
    }

    /// Print every reading in the window, or the whole snapshot in JSON mode.
    pub fn print_status(&self, snapshot: &FeedSnapshot) {
        let display = self.display.lock().clone();
        let text = match display.format {
            OutputFormat::Text => render_window(snapshot, display.decimals),
            OutputFormat::Json => match render_json(snapshot) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Cannot serialise snapshot: {e}");
                    return;
                }
            },
        };
        self.write_line(&text);
    }

    pub fn print_message(&self, message: &str) {
        self.write_line(message);
    }

    fn write_line(&self, line: &str) {
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!("Console write failed: {e}");
        }
    }
}

impl FeedObserver for ConsolePrinter {
    fn name(&self) -> &str {
        "console"
    }

    fn on_snapshot(&self, snapshot: &FeedSnapshot) {
        let display = self.display.lock().clone();
        let line = match display.format {
            OutputFormat::Text => render_line(snapshot, display.decimals),
            OutputFormat::Json => match render_json(snapshot) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Cannot serialise snapshot: {e}");
                    return;
                }
            },
        };
        self.write_line(&line);
    }
}
