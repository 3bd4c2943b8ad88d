//! Hive-style directory layout: `<table>/<col>=<value>/…/part-NNNNN.parquet`.

use std::{
  fmt::Write as _,
  path::{Component, Path, PathBuf},
};

use sparkify_core::{Column, ColumnType, TableSpec, Value};

use crate::{Error, Result};

/// Directory value standing in for a null partition value.
pub const DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Empty file written last into a completed table directory.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

pub fn part_file_name(index: usize) -> String { format!("part-{index:05}.parquet") }

/// ASCII that cannot appear verbatim in a partition directory name.
fn is_unsafe(c: char) -> bool {
  c.is_ascii_control()
    || matches!(
      c,
      '"' | '#' | '%' | '\'' | '*' | '/' | ':' | '=' | '?' | '\\' | '[' | ']' | '^' | '{'
    )
}

/// Percent-escape path-unsafe ASCII, leaving other text (UTF-8 included)
/// untouched. A string spelling [`DEFAULT_PARTITION`] has its underscores
/// escaped so that only a real null renders as the bare marker.
fn escape(s: &str) -> String {
  if s == DEFAULT_PARTITION {
    return s.replace('_', "%5F");
  }
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    if is_unsafe(c) {
      let _ = write!(out, "%{:02X}", u32::from(c));
    } else {
      out.push(c);
    }
  }
  out
}

/// Directory-safe rendering of a partition value.
pub fn render_value(value: &Value) -> String {
  match value {
    Value::Null => DEFAULT_PARTITION.to_owned(),
    Value::Utf8(s) => escape(s),
    Value::Int32(v) => v.to_string(),
    Value::Int64(v) | Value::TimestampMillis(v) => v.to_string(),
    Value::Float64(v) => v.to_string(),
  }
}

/// Inverse of [`render_value`]. `None` if `raw` is not a valid rendering.
pub fn parse_value(column: &Column, raw: &str) -> Option<Value> {
  if raw == DEFAULT_PARTITION {
    return Some(Value::Null);
  }
  match column.ty {
    ColumnType::Utf8 => urlencoding::decode(raw).ok().map(|s| Value::Utf8(s.into_owned())),
    ColumnType::Int32 => raw.parse().ok().map(Value::Int32),
    ColumnType::Int64 => raw.parse().ok().map(Value::Int64),
    ColumnType::Float64 => raw.parse().ok().map(Value::Float64),
    ColumnType::TimestampMillis => raw.parse().ok().map(Value::TimestampMillis),
  }
}

/// Relative directory of `row` within its table directory.
pub fn partition_dir(spec: &TableSpec, indices: &[usize], row: &[Value]) -> PathBuf {
  indices
    .iter()
    .map(|&i| format!("{}={}", spec.columns[i].name, render_value(&row[i])))
    .collect()
}

/// Decode the partition values encoded in `relative`, a directory below the
/// table root. Values are returned in `indices` order.
pub fn partition_values(
  spec: &TableSpec,
  indices: &[usize],
  relative: &Path,
) -> Result<Vec<Value>> {
  let layout_error = |reason: String| Error::Layout { path: relative.to_path_buf(), reason };

  let segments: Vec<&str> = relative
    .components()
    .map(|c| match c {
      Component::Normal(s) => s
        .to_str()
        .ok_or_else(|| layout_error("non-UTF-8 directory name".into())),
      other => Err(layout_error(format!("unexpected path component {other:?}"))),
    })
    .collect::<Result<_>>()?;

  if segments.len() != indices.len() {
    return Err(layout_error(format!(
      "expected {} partition levels, found {}",
      indices.len(),
      segments.len()
    )));
  }

  indices
    .iter()
    .zip(segments)
    .map(|(&i, segment)| {
      let column = &spec.columns[i];
      let raw = segment
        .strip_prefix(column.name)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| layout_error(format!("expected {}=…, found {segment}", column.name)))?;
      parse_value(column, raw)
        .ok_or_else(|| layout_error(format!("invalid {} value {raw:?}", column.name)))
    })
    .collect()
}
