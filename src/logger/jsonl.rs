//! JSONL rewrite journal: one self-contained JSON object per source edit.
//!
//! Lines are assembled in memory and written with a single `write_all`, so a
//! journal tailed while tests run never shows interleaved partial lines.
//!
//! Three-level fallback chain:
//! 1. Journal file path
//! 2. stderr with `[EXP-JSONL]` prefix
//! 3. Silent discard (a journal failure must never fail an assertion)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{ExpectError, Result};

/// Severity level for journal events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// What the engine did at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Record,
    Override,
    FanOut,
    Repeated,
    Mismatch,
}

impl EventType {
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Record | Self::Override | Self::FanOut | Self::Repeated => Severity::Info,
            Self::Mismatch => Severity::Warning,
        }
    }
}

/// A single journal line; all fields optional except `ts`, `event`, `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Absolute path of the edited source file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Line as compiled, before any edit this run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_line: Option<u32>,
    /// Line in the file at the time of the edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_lines: Option<u32>,
    /// Literal inserted (record, override) or the first one kept (repeated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
    /// Expected side of a mismatch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Actual side of a mismatch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    /// Number of calls a fan-out produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calls: Option<usize>,
    /// Hash of the effective config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

impl JournalEntry {
    /// Create a new entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: EventType) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity: event.severity(),
            file: None,
            original_line: None,
            line: None,
            added_lines: None,
            literal: None,
            expected: None,
            actual: None,
            calls: None,
            config_hash: None,
        }
    }

    #[must_use]
    pub fn at(mut self, file: &Path, original_line: u32, line: u32) -> Self {
        self.file = Some(file.display().to_string());
        self.original_line = Some(original_line);
        self.line = Some(line);
        self
    }
}

/// Degradation state of the JSONL writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Writing to the journal file.
    Normal,
    /// File failed, writing to stderr.
    Stderr,
    /// Everything failed, silently discarding.
    Discard,
}

/// Append-only JSONL journal writer with stderr fallback.
pub struct JsonlWriter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    lines_written: u64,
}

impl JsonlWriter {
    /// Open the journal file. Falls through the degradation chain on failure.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut w = Self {
            path: path.into(),
            writer: None,
            state: WriterState::Discard,
            lines_written: 0,
        };
        w.try_open_primary();
        w
    }

    /// Write a single entry as one JSONL line and flush it.
    pub fn write_entry(&mut self, entry: &JournalEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[EXP-JSONL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    /// Current degradation state.
    #[must_use]
    pub fn state(&self) -> &str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines accepted by the journal file since open.
    #[must_use]
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    // ──────────────────────── internals ────────────────────────

    fn write_line(&mut self, line: &str) {
        match self.state {
            WriterState::Normal => {
                let ok = self
                    .writer
                    .as_mut()
                    .is_some_and(|w| w.write_all(line.as_bytes()).and_then(|()| w.flush()).is_ok());
                if ok {
                    self.lines_written += 1;
                } else {
                    self.degrade();
                    self.write_line(line); // retry at next level
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[EXP-JSONL] {line}").is_err() {
                    self.degrade();
                }
            }
            WriterState::Discard => {}
        }
    }

    fn try_open_primary(&mut self) {
        match open_append(&self.path) {
            Ok(file) => {
                self.writer = Some(BufWriter::new(file));
                self.state = WriterState::Normal;
            }
            Err(err) => {
                self.state = WriterState::Stderr;
                let _ = writeln!(io::stderr(), "[EXP-JSONL] {err}, using stderr");
            }
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        match self.state {
            WriterState::Normal => {
                self.state = WriterState::Stderr;
                let _ = writeln!(
                    io::stderr(),
                    "[EXP-JSONL] journal write failed, using stderr"
                );
            }
            WriterState::Stderr | WriterState::Discard => {
                self.state = WriterState::Discard;
            }
        }
    }
}

// ──────────────────────── helpers ────────────────────────

/// Open or create a file for appending, creating parent directories.
fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| ExpectError::io(parent, source))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ExpectError::io(path, source))
}

/// Format current UTC time as ISO 8601.
fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ──────────────────────── tests ────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_entry_produces_valid_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let mut writer = JsonlWriter::open(&path);

        let entry = JournalEntry::new(EventType::Record).at(Path::new("/src/a.rs"), 4, 6);
        writer.write_entry(&entry);

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["event"], "record");
        assert_eq!(parsed["severity"], "info");
        assert_eq!(parsed["original_line"], 4);
        assert_eq!(parsed["line"], 6);
        assert!(parsed.get("literal").is_none());
        assert_eq!(writer.state(), "normal");
        assert_eq!(writer.lines_written(), 1);
    }

    #[test]
    fn entries_append_across_writers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("journal.jsonl");
        for _ in 0..2 {
            let mut writer = JsonlWriter::open(&path);
            writer.write_entry(&JournalEntry::new(EventType::FanOut));
            writer.write_entry(&JournalEntry::new(EventType::Mismatch));
        }

        let contents = fs::read_to_string(&path).unwrap();
        let events: Vec<String> = contents
            .lines()
            .map(|line| {
                let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
                parsed["event"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(events, ["fan_out", "mismatch", "fan_out", "mismatch"]);
    }

    #[test]
    fn mismatch_is_a_warning() {
        let entry = JournalEntry::new(EventType::Mismatch);
        assert_eq!(entry.severity, Severity::Warning);
        assert_eq!(JournalEntry::new(EventType::Repeated).severity, Severity::Info);
    }

    #[test]
    fn unopenable_path_degrades_to_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let mut writer = JsonlWriter::open(blocker.join("journal.jsonl"));
        assert_eq!(writer.state(), "stderr");
        writer.write_entry(&JournalEntry::new(EventType::Override));
        assert_eq!(writer.lines_written(), 0);
    }

    #[test]
    fn timestamp_is_rfc3339_utc() {
        let ts = format_utc_now();
        assert!(ts.ends_with('Z'), "{ts}");
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
