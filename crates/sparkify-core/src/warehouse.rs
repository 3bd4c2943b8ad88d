//! Warehouse DDL rendered from the same [`TableSpec`]s the lake writer uses.
//!
//! Executing these statements is the warehouse loader's job; this module only
//! guarantees that both paths agree on column names, types and nullability.

use crate::schema::{ColumnType, TableSpec};

pub fn sql_type(ty: ColumnType) -> &'static str {
  match ty {
    ColumnType::Utf8 => "VARCHAR",
    ColumnType::Int32 => "INTEGER",
    ColumnType::Int64 => "BIGINT",
    ColumnType::Float64 => "DOUBLE PRECISION",
    ColumnType::TimestampMillis => "TIMESTAMP",
  }
}

pub fn create_table_sql(spec: &TableSpec) -> String {
  let columns = spec
    .columns
    .iter()
    .map(|c| {
      let mut line = format!("    {} {}", c.name, sql_type(c.ty));
      if c.name == spec.key {
        line.push_str(" PRIMARY KEY");
      } else if !c.nullable {
        line.push_str(" NOT NULL");
      }
      line
    })
    .collect::<Vec<_>>()
    .join(",\n");
  format!("CREATE TABLE IF NOT EXISTS {} (\n{columns}\n);", spec.name)
}

pub fn drop_table_sql(spec: &TableSpec) -> String {
  format!("DROP TABLE IF EXISTS {};", spec.name)
}
