//! Field coercion: JSON value + declared column type → typed [`Value`].
//!
//! Rules:
//! - absent or `null` → null;
//! - strings are taken verbatim (no trimming), scalars are stringified;
//! - numeric columns accept JSON numbers and numeric strings, an empty
//!   string is null;
//! - anything else is the wrong shape: the caller stores null and counts it.

use serde_json::{Map, Value as Json};
use sparkify_core::{Column, ColumnType, Value};

/// Coerce one field. `None` means the field had the wrong shape.
pub fn coerce(raw: Option<&Json>, ty: ColumnType) -> Option<Value> {
  let raw = match raw {
    None | Some(Json::Null) => return Some(Value::Null),
    Some(raw) => raw,
  };

  match ty {
    ColumnType::Utf8 => match raw {
      Json::String(s) => Some(Value::Utf8(s.clone())),
      Json::Number(n) => Some(Value::Utf8(n.to_string())),
      Json::Bool(b) => Some(Value::Utf8(b.to_string())),
      _ => None,
    },
    ColumnType::Int32 => integer(raw).map(|v| match v {
      Some(v) => i32::try_from(v).ok().map(Value::Int32),
      None => Some(Value::Null),
    })?,
    ColumnType::Int64 => integer(raw).map(|v| v.map_or(Value::Null, Value::Int64)),
    ColumnType::TimestampMillis => {
      integer(raw).map(|v| v.map_or(Value::Null, Value::TimestampMillis))
    }
    ColumnType::Float64 => match raw {
      Json::Number(n) => n.as_f64().map(Value::Float64),
      Json::String(s) if s.trim().is_empty() => Some(Value::Null),
      Json::String(s) => s.trim().parse::<f64>().ok().map(Value::Float64),
      _ => None,
    },
  }
}

/// Integral reading of a JSON value. `Some(None)` is an empty string.
fn integer(raw: &Json) -> Option<Option<i64>> {
  match raw {
    Json::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().and_then(integral_f64))
      .map(Some),
    Json::String(s) => {
      let s = s.trim();
      if s.is_empty() {
        return Some(None);
      }
      s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(integral_f64))
        .map(Some)
    }
    _ => None,
  }
}

fn integral_f64(f: f64) -> Option<i64> {
  (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
    .then_some(f as i64)
}

/// Coerce every schema field of `object`. Returns the typed row and the
/// number of fields that had to be nulled.
pub fn typed_row(object: &Map<String, Json>, schema: &[Column]) -> (Vec<Value>, usize) {
  let mut coerced = 0;
  let values = schema
    .iter()
    .map(|column| {
      coerce(object.get(column.name), column.ty).unwrap_or_else(|| {
        coerced += 1;
        Value::Null
      })
    })
    .collect();
  (values, coerced)
}
