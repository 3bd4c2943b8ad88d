//! [`Table`], a validated row collection ready to be stored, and the [`Row`]
//! trait that maps typed rows onto it.

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  schema::{Column, ColumnType, TableSpec, Value, check_value},
};

// ─── Row trait ───────────────────────────────────────────────────────────────

/// A typed row of one star-schema table.
pub trait Row: Sized + Send {
  fn spec() -> &'static TableSpec;

  /// Values in `spec().columns` order.
  fn into_values(self) -> Vec<Value>;

  fn from_values(values: Vec<Value>) -> Result<Self>;
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// A materialised table: a spec plus rows whose width, types and nullability
/// have been checked against it.
#[derive(Debug, Clone)]
pub struct Table {
  spec: &'static TableSpec,
  rows: Vec<Vec<Value>>,
}

impl Table {
  /// Validate `rows` against `spec`.
  pub fn new(spec: &'static TableSpec, rows: Vec<Vec<Value>>) -> Result<Self> {
    for row in &rows {
      if row.len() != spec.columns.len() {
        return Err(Error::RowWidth {
          table:    spec.name,
          expected: spec.columns.len(),
          found:    row.len(),
        });
      }
      for (column, value) in spec.columns.iter().zip(row) {
        check_value(column, value)?;
      }
    }
    Ok(Self { spec, rows })
  }

  pub fn from_rows<R: Row>(rows: impl IntoIterator<Item = R>) -> Result<Self> {
    Self::new(R::spec(), rows.into_iter().map(Row::into_values).collect())
  }

  /// Convert back into typed rows. Fails if the table is not `R`'s table.
  pub fn into_rows<R: Row>(self) -> Result<Vec<R>> {
    if self.spec.name != R::spec().name {
      return Err(Error::SpecMismatch {
        expected: R::spec().name,
        found:    self.spec.name,
      });
    }
    self.rows.into_iter().map(R::from_values).collect()
  }

  pub fn spec(&self) -> &'static TableSpec { self.spec }

  pub fn rows(&self) -> &[Vec<Value>] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn into_parts(self) -> (&'static TableSpec, Vec<Vec<Value>>) {
    (self.spec, self.rows)
  }
}

// ─── Cells ───────────────────────────────────────────────────────────────────

/// Sequential, type-checked access to the values of one row.
///
/// `Row::from_values` and record decoders pull values in column order; each
/// accessor checks the value against the column it is reading.
pub struct Cells {
  table:   &'static str,
  columns: &'static [Column],
  values:  std::vec::IntoIter<Value>,
  pos:     usize,
}

impl Cells {
  pub fn new(
    table: &'static str,
    columns: &'static [Column],
    values: Vec<Value>,
  ) -> Result<Self> {
    if values.len() != columns.len() {
      return Err(Error::RowWidth {
        table,
        expected: columns.len(),
        found: values.len(),
      });
    }
    Ok(Self { table, columns, values: values.into_iter(), pos: 0 })
  }

  fn next_cell(&mut self, expected: ColumnType) -> Result<Value> {
    let Some(column) = self.columns.get(self.pos) else {
      return Err(Error::RowWidth {
        table:    self.table,
        expected: self.columns.len(),
        found:    self.pos + 1,
      });
    };
    self.pos += 1;
    let value = self.values.next().unwrap_or(Value::Null);
    if column.ty != expected {
      return Err(Error::TypeMismatch {
        column:   column.name,
        expected: column.ty,
        found:    format!("{expected:?} accessor"),
      });
    }
    match value.column_type() {
      None => Ok(value),
      Some(ty) if ty == expected => Ok(value),
      Some(_) => Err(Error::TypeMismatch {
        column:   column.name,
        expected,
        found:    format!("{value:?}"),
      }),
    }
  }

  pub fn utf8(&mut self) -> Result<Option<String>> {
    match self.next_cell(ColumnType::Utf8)? {
      Value::Utf8(s) => Ok(Some(s)),
      _ => Ok(None),
    }
  }

  pub fn int32(&mut self) -> Result<Option<i32>> {
    Ok(self.next_cell(ColumnType::Int32)?.as_i32())
  }

  pub fn int64(&mut self) -> Result<Option<i64>> {
    Ok(self.next_cell(ColumnType::Int64)?.as_i64())
  }

  pub fn float64(&mut self) -> Result<Option<f64>> {
    Ok(self.next_cell(ColumnType::Float64)?.as_f64())
  }

  pub fn timestamp_millis(&mut self) -> Result<Option<i64>> {
    Ok(self.next_cell(ColumnType::TimestampMillis)?.as_i64())
  }

  pub fn timestamp(&mut self) -> Result<Option<DateTime<Utc>>> {
    Ok(
      self
        .timestamp_millis()?
        .and_then(DateTime::<Utc>::from_timestamp_millis),
    )
  }
}

/// Reject a null read from a required column.
pub fn required<T>(column: &'static str, value: Option<T>) -> Result<T> {
  value.ok_or(Error::NullInRequiredColumn(column))
}
