//! Conversions between [`Value`] rows and Arrow record batches.
//!
//! Only data columns are stored in part files; partition columns are encoded
//! in the directory path (see `layout`).

use std::sync::Arc;

use arrow::{
  array::{
    Array, ArrayRef, Float64Array, Int32Array, Int64Array, StringArray,
    TimestampMillisecondArray,
  },
  datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit},
  record_batch::RecordBatch,
};
use parquet::{
  basic::Compression,
  file::properties::WriterProperties,
  format::KeyValue,
};
use sparkify_core::{Column, ColumnType, TableSpec, Value};

use crate::{Error, Result};

const TIMEZONE: &str = "UTC";

// ─── Schema ──────────────────────────────────────────────────────────────────

pub fn data_type(ty: ColumnType) -> DataType {
  match ty {
    ColumnType::Utf8 => DataType::Utf8,
    ColumnType::Int32 => DataType::Int32,
    ColumnType::Int64 => DataType::Int64,
    ColumnType::Float64 => DataType::Float64,
    ColumnType::TimestampMillis => {
      DataType::Timestamp(TimeUnit::Millisecond, Some(TIMEZONE.into()))
    }
  }
}

/// Arrow schema of the part files of `spec`.
pub fn file_schema(spec: &TableSpec) -> SchemaRef {
  let fields: Vec<Field> = spec
    .data_indices()
    .into_iter()
    .map(|i| {
      let column = &spec.columns[i];
      Field::new(column.name, data_type(column.ty), column.nullable)
    })
    .collect();
  Arc::new(Schema::new(fields))
}

pub fn writer_properties() -> WriterProperties {
  let created_by = KeyValue {
    key:   "created_by".to_string(),
    value: Some(concat!("sparkify-etl ", env!("CARGO_PKG_VERSION")).to_string()),
  };
  WriterProperties::builder()
    .set_compression(Compression::SNAPPY)
    .set_key_value_metadata(Some(vec![created_by]))
    .build()
}

// ─── Encode ──────────────────────────────────────────────────────────────────

fn column_array(ty: ColumnType, rows: &[Vec<Value>], index: usize) -> ArrayRef {
  let cells = rows.iter().map(|row| &row[index]);
  match ty {
    ColumnType::Utf8 => Arc::new(cells.map(|v| v.as_str()).collect::<StringArray>()),
    ColumnType::Int32 => Arc::new(cells.map(|v| v.as_i32()).collect::<Int32Array>()),
    ColumnType::Int64 => Arc::new(cells.map(|v| v.as_i64()).collect::<Int64Array>()),
    ColumnType::Float64 => Arc::new(cells.map(|v| v.as_f64()).collect::<Float64Array>()),
    ColumnType::TimestampMillis => Arc::new(
      cells
        .map(|v| v.as_i64())
        .collect::<TimestampMillisecondArray>()
        .with_timezone(TIMEZONE),
    ),
  }
}

/// Build the record batch holding the data columns of `rows`.
///
/// `rows` must already be validated against `spec` (see `Table::new`).
pub fn record_batch(spec: &TableSpec, rows: &[Vec<Value>]) -> Result<RecordBatch> {
  let columns: Vec<ArrayRef> = spec
    .data_indices()
    .into_iter()
    .map(|i| column_array(spec.columns[i].ty, rows, i))
    .collect();
  Ok(RecordBatch::try_new(file_schema(spec), columns)?)
}

// ─── Decode ──────────────────────────────────────────────────────────────────

fn downcast<'a, A: Array + 'static>(column: &Column, array: &'a dyn Array) -> Result<&'a A> {
  array
    .as_any()
    .downcast_ref::<A>()
    .ok_or_else(|| Error::UnexpectedArrowType {
      column: column.name,
      found:  array.data_type().clone(),
    })
}

/// Read every cell of `array` as a value of `column`.
pub fn array_values(column: &Column, array: &dyn Array) -> Result<Vec<Value>> {
  let values = match column.ty {
    ColumnType::Utf8 => downcast::<StringArray>(column, array)?
      .iter()
      .map(|v| v.map(str::to_owned).into())
      .collect(),
    ColumnType::Int32 => downcast::<Int32Array>(column, array)?
      .iter()
      .map(Value::from)
      .collect(),
    ColumnType::Int64 => downcast::<Int64Array>(column, array)?
      .iter()
      .map(Value::from)
      .collect(),
    ColumnType::Float64 => downcast::<Float64Array>(column, array)?
      .iter()
      .map(Value::from)
      .collect(),
    ColumnType::TimestampMillis => downcast::<TimestampMillisecondArray>(column, array)?
      .iter()
      .map(|v| v.map_or(Value::Null, Value::TimestampMillis))
      .collect(),
  };
  Ok(values)
}
