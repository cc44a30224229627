//! Presenter - renders the station table after every processed reading.
//!
//! Rendering is a full redraw from a registry snapshot, never a diff.

use std::io::Write;

use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::types::StationRecord;

/// ANSI: clear screen, cursor to top-left.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const SEPARATOR: &str = "-----------------------";

/// Sink for registry snapshots.
pub trait Presenter: Send + 'static {
    fn render(&mut self, snapshot: &[(String, StationRecord)]);
}

/// Format the station table as plain text.
///
/// Issues are only listed for stations whose latest reading was flagged.
pub fn render_table(snapshot: &[(String, StationRecord)]) -> String {
    let mut out = String::with_capacity(128 + snapshot.len() * 160);
    out.push_str("=== Weather Stations ===\n");

    if snapshot.is_empty() {
        out.push_str("(no readings received yet)\n");
        return out;
    }

    for (id, record) in snapshot {
        out.push_str(&format!("Station: {id}\n"));
        out.push_str(&format!("  Temperature: {} °C\n", record.temperature));
        out.push_str(&format!("  Humidity: {} %\n", record.humidity));
        out.push_str(&format!("  Last received: {}\n", record.timestamp));
        if !record.valid {
            out.push_str(&format!("  Invalid data: {}\n", record.issues.join(", ")));
        }
        out.push_str(SEPARATOR);
        out.push('\n');
    }
    out
}

// ============================================================================
// Terminal Presenter
// ============================================================================

/// Full-screen refreshing text table.
pub struct TerminalPresenter<W: Write + Send + 'static> {
    out: W,
    clear_screen: bool,
}

impl TerminalPresenter<std::io::Stdout> {
    pub fn stdout(clear_screen: bool) -> Self {
        Self::new(std::io::stdout(), clear_screen)
    }
}

impl<W: Write + Send + 'static> TerminalPresenter<W> {
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self { out, clear_screen }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, snapshot: &[(String, StationRecord)]) -> std::io::Result<()> {
        if self.clear_screen {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        self.out.write_all(render_table(snapshot).as_bytes())?;
        self.out.flush()
    }
}

impl<W: Write + Send + 'static> Presenter for TerminalPresenter<W> {
    fn render(&mut self, snapshot: &[(String, StationRecord)]) {
        if let Err(e) = self.write_frame(snapshot) {
            warn!(error = %e, "Failed to render station table");
        }
    }
}

// ============================================================================
// JSON Presenter
// ============================================================================

#[derive(Serialize)]
struct JsonFrame<'a> {
    rendered_at: String,
    stations: Vec<JsonStation<'a>>,
}

#[derive(Serialize)]
struct JsonStation<'a> {
    station_id: &'a str,
    #[serde(flatten)]
    record: &'a StationRecord,
}

/// One JSON document per line, per render. Suited for piping into `jq`.
pub struct JsonPresenter<W: Write + Send + 'static> {
    out: W,
}

impl JsonPresenter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send + 'static> JsonPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, snapshot: &[(String, StationRecord)]) -> anyhow::Result<()> {
        let frame = JsonFrame {
            rendered_at: Utc::now().to_rfc3339(),
            stations: snapshot
                .iter()
                .map(|(id, record)| JsonStation {
                    station_id: id,
                    record,
                })
                .collect(),
        };
        serde_json::to_writer(&mut self.out, &frame)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send + 'static> Presenter for JsonPresenter<W> {
    fn render(&mut self, snapshot: &[(String, StationRecord)]) {
        if let Err(e) = self.write_frame(snapshot) {
            warn!(error = %e, "Failed to render station snapshot as JSON");
        }
    }
}

impl Presenter for Box<dyn Presenter> {
    fn render(&mut self, snapshot: &[(String, StationRecord)]) {
        (**self).render(snapshot);
    }
}
