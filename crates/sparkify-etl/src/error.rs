//! Error type for a pipeline run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("input error: {0}")]
  Read(#[from] sparkify_json::Error),

  #[error("transform error: {0}")]
  Transform(#[from] sparkify_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("worker task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("report serialisation failed: {0}")]
  Report(#[from] serde_json::Error),

  #[error("failed to write {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
