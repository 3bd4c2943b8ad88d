//! Per-run summary, optionally written as JSON with `--report`.

use std::path::Path;

use serde::Serialize;
use sparkify_core::store::WriteSummary;
use sparkify_json::ReadStats;
use sparkify_transform::JoinPolicy;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub song_input:       ReadStats,
  pub log_input:        ReadStats,
  /// One entry per written table, in write order.
  pub tables:           Vec<WriteSummary>,
  pub join_policy:      JoinPolicy,
  pub unresolved_songs: usize,
  pub unresolved_times: usize,
  pub elapsed_ms:       u64,
}

impl RunReport {
  pub fn table(&self, name: &str) -> Option<&WriteSummary> {
    self.tables.iter().find(|t| t.table == name)
  }

  pub fn write_json(&self, path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(self)?;
    std::fs::write(path, json).map_err(|source| Error::Io { path: path.to_path_buf(), source })
  }
}
