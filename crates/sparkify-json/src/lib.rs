//! Record readers for the Sparkify input corpus.
//!
//! Converts raw song-catalog documents and activity-log lines into
//! [`sparkify_core`] records. Field-level problems never abort a read: bad
//! fields become nulls and unparseable records are dropped, both counted in
//! [`ReadStats`]. Only an unreachable input location is an error.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! let (songs, stats) = sparkify_json::read_song_records(Path::new("data/song_data")).unwrap();
//! println!("{} songs, {} dropped", songs.len(), stats.dropped);
//! ```

pub mod coerce;
pub mod error;
mod parse;
mod source;

use std::{ops::AddAssign, path::Path};

pub use error::{Error, Result};
pub use parse::{Layout, decode};
use serde::Serialize;
pub use source::{discover, read_records};
use sparkify_core::record::{LogEvent, SongRecord};

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Counters for one read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadStats {
  pub files:        usize,
  /// Candidate records seen (documents or non-blank lines).
  pub records:      usize,
  /// Records dropped because they were not well-formed JSON objects.
  pub dropped:      usize,
  /// Fields set to null because they had the wrong shape.
  pub null_coerced: usize,
}

impl AddAssign for ReadStats {
  fn add_assign(&mut self, other: Self) {
    self.files += other.files;
    self.records += other.records;
    self.dropped += other.dropped;
    self.null_coerced += other.null_coerced;
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Read every song-catalog document (one JSON object per file) under `root`.
pub fn read_song_records(root: &Path) -> Result<(Vec<SongRecord>, ReadStats)> {
  read_records(root, Layout::Document)
}

/// Read every activity-log file (one JSON object per line) under `root`.
pub fn read_log_events(root: &Path) -> Result<(Vec<LogEvent>, ReadStats)> {
  read_records(root, Layout::Lines)
}
