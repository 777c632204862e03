#![warn(missing_docs)]
//! Deterministic testing surfaces: recording collaborators and JSONL event logs.

mod fakes;

use anyhow::Result;
use serde::Serialize;
use soundscape_audio::{SoundInstance, TickReport};
use soundscape_core::SimTick;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub use fakes::*;

/// Primary event record captured by headless runs.
#[derive(Debug, Serialize)]
pub struct PlaybackEvent<'a> {
    /// Simulation tick when the event occurred.
    pub tick: SimTick,
    /// Human-readable kind label.
    pub kind: &'a str,
    /// Sound identifier.
    pub sound: String,
    /// Volume handed to playback.
    pub volume: f32,
    /// Position as `[x, y, z]`.
    pub position: [f32; 3],
}

impl<'a> PlaybackEvent<'a> {
    /// Record for `sound` at `tick`.
    pub fn from_sound(tick: SimTick, kind: &'a str, sound: &SoundInstance) -> Self {
        Self {
            tick,
            kind,
            sound: sound.key.to_string(),
            volume: sound.volume,
            position: sound.position.to_array(),
        }
    }
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a new sink at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self { file })
    }

    /// Append an event to the log.
    pub fn write(&mut self, event: &PlaybackEvent<'_>) -> Result<()> {
        let line = serde_json::to_string(event)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }
}

/// Totals over a headless run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Ticks executed.
    pub ticks: u64,
    /// Pending sounds played.
    pub played: usize,
    /// Pending sounds dropped for lateness.
    pub stale: usize,
    /// Sounds sent to the server.
    pub sent: usize,
    /// Ambient probe triggers.
    pub probe_triggers: usize,
    /// Footprints emitted.
    pub footprints: usize,
}

impl SessionSummary {
    /// Fold one tick into the totals.
    pub fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.played += report.played;
        self.stale += report.stale;
        self.sent += report.sent;
        self.probe_triggers += usize::from(report.probe_triggered);
        self.footprints += report.footprints;
    }
}

/// Writes a session summary to JSON for CI artifacts.
pub struct SummarySink {
    file: File,
}

impl SummarySink {
    /// Create a sink pointed at the supplied path, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            file: File::create(path)?,
        })
    }

    /// Persist the summary as pretty JSON.
    pub fn write(&mut self, summary: &SessionSummary) -> Result<()> {
        let json = serde_json::to_string_pretty(summary)?;
        self.file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn summary_sink_writes_file() {
        let path = std::env::temp_dir().join(format!(
            "soundscape-summary-{}.json",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let mut summary = SessionSummary::default();
        summary.record(&TickReport {
            played: 2,
            probe_triggered: true,
            ..TickReport::default()
        });
        let mut sink = SummarySink::create(&path).expect("sink create");
        sink.write(&summary).expect("write succeeds");
        let contents = fs::read_to_string(&path).expect("file readable");
        assert!(contents.contains("\"probe_triggers\": 1"));
        assert!(contents.contains("\"played\": 2"));
    }
}
