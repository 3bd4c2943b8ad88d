//! Error type for `sparkify-store-parquet`.

use std::path::PathBuf;

use arrow::datatypes::DataType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] sparkify_core::Error),

  #[error("arrow error: {0}")]
  Arrow(#[from] arrow::error::ArrowError),

  #[error("parquet error: {0}")]
  Parquet(#[from] parquet::errors::ParquetError),

  #[error("io error at {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("directory walk failed: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("blocking task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("table {0} has not been written")]
  TableNotFound(&'static str),

  /// The table directory exists but was never completed by a write.
  #[error("table {0} has no success marker")]
  Incomplete(&'static str),

  #[error("column {column} is stored as {found}")]
  UnexpectedArrowType {
    column: &'static str,
    found:  DataType,
  },

  #[error("unexpected partition layout at {}: {reason}", path.display())]
  Layout { path: PathBuf, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
  let path = path.into();
  move |source| Error::Io { path, source }
}
