//! Error types for the record readers.
//!
//! Only source-level failures are errors. Malformed records are dropped and
//! counted in [`ReadStats`](crate::ReadStats) instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("input location {path:?} is unreachable: {source}")]
  InputUnreachable {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to list input files: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("failed to read {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
