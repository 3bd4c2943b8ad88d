//! Column schemas and the dynamically typed [`Value`] cell.
//!
//! Every table in the star schema is described by a static [`TableSpec`]. The
//! same description drives the input readers, the columnar writer, the
//! read-back path and the warehouse DDL, so the lake and the warehouse cannot
//! drift apart structurally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Column types ────────────────────────────────────────────────────────────

/// The semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
  Utf8,
  Int32,
  Int64,
  Float64,
  /// Milliseconds since the Unix epoch, UTC.
  TimestampMillis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub name:     &'static str,
  pub ty:       ColumnType,
  pub nullable: bool,
}

impl Column {
  pub const fn required(name: &'static str, ty: ColumnType) -> Self {
    Self { name, ty, nullable: false }
  }

  pub const fn nullable(name: &'static str, ty: ColumnType) -> Self {
    Self { name, ty, nullable: true }
  }
}

// ─── Table specs ─────────────────────────────────────────────────────────────

/// Static description of one output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
  /// Table name; also the directory name under the output root.
  pub name:         &'static str,
  /// Name of the key column.
  pub key:          &'static str,
  pub columns:      &'static [Column],
  /// Columns the table is physically partitioned by, outermost first.
  pub partition_by: &'static [&'static str],
}

impl TableSpec {
  pub fn column_index(&self, name: &str) -> Result<usize> {
    self
      .columns
      .iter()
      .position(|c| c.name == name)
      .ok_or_else(|| Error::UnknownColumn {
        table:  self.name,
        column: name.to_owned(),
      })
  }

  /// Indices of the partition columns, in `partition_by` order.
  pub fn partition_indices(&self) -> Result<Vec<usize>> {
    self
      .partition_by
      .iter()
      .map(|name| self.column_index(name))
      .collect()
  }

  pub fn is_partition_column(&self, name: &str) -> bool {
    self.partition_by.contains(&name)
  }

  /// Indices of the columns stored inside data files (everything that is
  /// not encoded in the directory layout).
  pub fn data_indices(&self) -> Vec<usize> {
    self
      .columns
      .iter()
      .enumerate()
      .filter(|(_, c)| !self.is_partition_column(c.name))
      .map(|(i, _)| i)
      .collect()
  }
}

use ColumnType::{Float64, Int32, Int64, TimestampMillis, Utf8};

pub static SONGS: TableSpec = TableSpec {
  name:         "songs",
  key:          "song_id",
  columns:      &[
    Column::required("song_id", Utf8),
    Column::required("title", Utf8),
    Column::required("artist_id", Utf8),
    Column::nullable("year", Int32),
    Column::required("duration", Float64),
  ],
  partition_by: &["year", "artist_id"],
};

pub static ARTISTS: TableSpec = TableSpec {
  name:         "artists",
  key:          "artist_id",
  columns:      &[
    Column::required("artist_id", Utf8),
    Column::nullable("name", Utf8),
    Column::nullable("location", Utf8),
    Column::nullable("latitude", Float64),
    Column::nullable("longitude", Float64),
  ],
  partition_by: &[],
};

pub static USERS: TableSpec = TableSpec {
  name:         "users",
  key:          "user_id",
  columns:      &[
    Column::required("user_id", Int32),
    Column::nullable("first_name", Utf8),
    Column::nullable("last_name", Utf8),
    Column::nullable("gender", Utf8),
    Column::nullable("level", Utf8),
  ],
  partition_by: &["level"],
};

pub static TIME: TableSpec = TableSpec {
  name:         "time",
  key:          "start_time",
  columns:      &[
    Column::required("start_time", TimestampMillis),
    Column::required("hour", Int32),
    Column::required("day", Int32),
    Column::required("week", Int32),
    Column::required("month", Int32),
    Column::required("year", Int32),
    Column::required("weekday", Int32),
  ],
  partition_by: &["year", "month"],
};

pub static SONGPLAYS: TableSpec = TableSpec {
  name:         "songplays",
  key:          "songplay_id",
  columns:      &[
    Column::required("songplay_id", Int64),
    Column::nullable("start_time", TimestampMillis),
    Column::nullable("user_id", Int32),
    Column::nullable("level", Utf8),
    Column::nullable("song_id", Utf8),
    Column::nullable("artist_id", Utf8),
    Column::nullable("session_id", Int32),
    Column::nullable("location", Utf8),
    Column::nullable("user_agent", Utf8),
    Column::nullable("year", Int32),
    Column::nullable("month", Int32),
  ],
  partition_by: &["year", "month"],
};

/// All star-schema tables, dimensions first.
pub static STAR_SCHEMA: [&TableSpec; 5] =
  [&SONGS, &ARTISTS, &USERS, &TIME, &SONGPLAYS];

// ─── Values ──────────────────────────────────────────────────────────────────

/// A single typed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Null,
  Utf8(String),
  Int32(i32),
  Int64(i64),
  Float64(f64),
  TimestampMillis(i64),
}

impl Value {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  /// The column type this value belongs to; `None` for [`Value::Null`].
  pub fn column_type(&self) -> Option<ColumnType> {
    match self {
      Self::Null => None,
      Self::Utf8(_) => Some(Utf8),
      Self::Int32(_) => Some(Int32),
      Self::Int64(_) => Some(Int64),
      Self::Float64(_) => Some(Float64),
      Self::TimestampMillis(_) => Some(TimestampMillis),
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Utf8(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_i32(&self) -> Option<i32> {
    match self {
      Self::Int32(v) => Some(*v),
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Int64(v) | Self::TimestampMillis(v) => Some(*v),
      _ => None,
    }
  }

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Float64(v) => Some(*v),
      _ => None,
    }
  }

  pub fn timestamp(dt: DateTime<Utc>) -> Self {
    Self::TimestampMillis(dt.timestamp_millis())
  }
}

impl From<Option<String>> for Value {
  fn from(v: Option<String>) -> Self { v.map_or(Self::Null, Self::Utf8) }
}

impl From<Option<i32>> for Value {
  fn from(v: Option<i32>) -> Self { v.map_or(Self::Null, Self::Int32) }
}

impl From<Option<i64>> for Value {
  fn from(v: Option<i64>) -> Self { v.map_or(Self::Null, Self::Int64) }
}

impl From<Option<f64>> for Value {
  fn from(v: Option<f64>) -> Self { v.map_or(Self::Null, Self::Float64) }
}

impl From<Option<DateTime<Utc>>> for Value {
  fn from(v: Option<DateTime<Utc>>) -> Self {
    v.map_or(Self::Null, Self::timestamp)
  }
}

/// Check that `value` may be stored in `column`.
pub fn check_value(column: &Column, value: &Value) -> Result<()> {
  match value.column_type() {
    None if column.nullable => Ok(()),
    None => Err(Error::NullInRequiredColumn(column.name)),
    Some(ty) if ty == column.ty => Ok(()),
    Some(_) => Err(Error::TypeMismatch {
      column:   column.name,
      expected: column.ty,
      found:    format!("{value:?}"),
    }),
  }
}
