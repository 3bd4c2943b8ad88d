//! Error types for `sparkify-core`.

use thiserror::Error;

use crate::schema::ColumnType;

#[derive(Debug, Error)]
pub enum Error {
  #[error("table {table}: row has {found} values, expected {expected}")]
  RowWidth {
    table:    &'static str,
    expected: usize,
    found:    usize,
  },

  #[error("column {column}: expected {expected:?}, found {found}")]
  TypeMismatch {
    column:   &'static str,
    expected: ColumnType,
    found:    String,
  },

  #[error("column {0} is required but holds a null")]
  NullInRequiredColumn(&'static str),

  #[error("table {table} has no column named {column:?}")]
  UnknownColumn { table: &'static str, column: String },

  #[error("expected rows of table {expected}, got table {found}")]
  SpecMismatch {
    expected: &'static str,
    found:    &'static str,
  },

  /// Two logically distinct rows were assigned the same surrogate key.
  #[error("surrogate key collision in {table}: {key}")]
  KeyCollision { table: &'static str, key: String },

  #[error("surrogate key space exhausted in {0}")]
  KeySpaceExhausted(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
