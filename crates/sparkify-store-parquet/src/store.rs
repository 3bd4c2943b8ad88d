//! [`ParquetStore`]: the partitioned parquet implementation of [`TableStore`].

use std::{
  collections::BTreeMap,
  fs::{self, File},
  path::{Path, PathBuf},
};

use parquet::arrow::{ArrowWriter, arrow_reader::ParquetRecordBatchReaderBuilder};
use rayon::prelude::*;
use sparkify_core::{
  Table, TableSpec, Value,
  store::{TableStore, WriteSummary},
};
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::{
  Error, Result,
  encode::{array_values, record_batch, writer_properties},
  error::io,
  layout::{SUCCESS_MARKER, part_file_name, partition_dir, partition_values},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A star-schema store rooted at one output directory.
///
/// Cloning is cheap; all state lives on disk.
#[derive(Debug, Clone)]
pub struct ParquetStore {
  root: PathBuf,
}

impl ParquetStore {
  /// Open a store at `root`, creating the directory if needed.
  pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
    let root = root.into();
    tokio::fs::create_dir_all(&root).await.map_err(io(&root))?;
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path { &self.root }

  /// Directory holding `spec`'s table.
  pub fn table_dir(&self, spec: &TableSpec) -> PathBuf { self.root.join(spec.name) }
}

impl TableStore for ParquetStore {
  type Error = Error;

  async fn write_table(&self, table: Table) -> Result<WriteSummary> {
    let root = self.root.clone();
    tokio::task::spawn_blocking(move || replace_table(&root, table)).await?
  }

  async fn read_table(&self, spec: &'static TableSpec) -> Result<Table> {
    let dir = self.table_dir(spec);
    tokio::task::spawn_blocking(move || load_table(&dir, spec)).await?
  }
}

// ─── Write path ──────────────────────────────────────────────────────────────

/// Write `table` into a fresh staging directory, then swap it in for the
/// current table directory.
fn replace_table(root: &Path, table: Table) -> Result<WriteSummary> {
  let (spec, rows) = table.into_parts();
  let row_count = rows.len();
  let partition_indices = spec.partition_indices()?;

  let mut groups: BTreeMap<PathBuf, Vec<Vec<Value>>> = BTreeMap::new();
  if partition_indices.is_empty() {
    groups.insert(PathBuf::new(), rows);
  } else {
    for row in rows {
      groups
        .entry(partition_dir(spec, &partition_indices, &row))
        .or_default()
        .push(row);
    }
  }

  let target = root.join(spec.name);
  let staging = root.join(format!(".{}-{}.staging", spec.name, Uuid::new_v4()));
  fs::create_dir_all(&staging).map_err(io(&staging))?;

  let written = groups
    .par_iter()
    .map(|(dir, rows)| write_part(spec, &staging.join(dir), rows))
    .collect::<Result<Vec<()>>>()
    .and_then(|_| {
      let marker = staging.join(SUCCESS_MARKER);
      fs::write(&marker, b"").map_err(io(marker))
    });
  if let Err(e) = written {
    if let Err(cleanup) = fs::remove_dir_all(&staging) {
      warn!(path = %staging.display(), error = %cleanup, "could not remove staging directory");
    }
    return Err(e);
  }

  if target.exists() {
    fs::remove_dir_all(&target).map_err(io(&target))?;
  }
  fs::rename(&staging, &target).map_err(io(&target))?;

  let summary = WriteSummary {
    table:      spec.name.to_owned(),
    rows:       row_count,
    partitions: groups.len(),
    files:      groups.len(),
  };
  info!(
    table = spec.name,
    rows = summary.rows,
    partitions = summary.partitions,
    "wrote table"
  );
  Ok(summary)
}

fn write_part(spec: &TableSpec, dir: &Path, rows: &[Vec<Value>]) -> Result<()> {
  fs::create_dir_all(dir).map_err(io(dir))?;
  let batch = record_batch(spec, rows)?;
  let path = dir.join(part_file_name(0));
  let file = File::create(&path).map_err(io(&path))?;

  let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(writer_properties()))?;
  writer.write(&batch)?;
  writer.close()?;

  debug!(table = spec.name, path = %path.display(), rows = rows.len(), "wrote part file");
  Ok(())
}

// ─── Read path ───────────────────────────────────────────────────────────────

fn load_table(dir: &Path, spec: &'static TableSpec) -> Result<Table> {
  if !dir.is_dir() {
    return Err(Error::TableNotFound(spec.name));
  }
  if !dir.join(SUCCESS_MARKER).is_file() {
    return Err(Error::Incomplete(spec.name));
  }

  let partition_indices = spec.partition_indices()?;
  let data_indices = spec.data_indices();
  let mut rows = Vec::new();

  for entry in WalkDir::new(dir).sort_by_file_name() {
    let entry = entry?;
    let path = entry.path();
    if !entry.file_type().is_file()
      || path.extension().and_then(|e| e.to_str()) != Some("parquet")
    {
      continue;
    }

    let relative = path
      .parent()
      .and_then(|p| p.strip_prefix(dir).ok())
      .unwrap_or_else(|| Path::new(""));
    let partition = partition_values(spec, &partition_indices, relative)?;

    let file = File::open(path).map_err(io(path))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    for batch in reader {
      let batch = batch?;
      let schema = batch.schema();
      let mut columns = data_indices
        .iter()
        .map(|&i| -> Result<std::vec::IntoIter<Value>> {
          let column = &spec.columns[i];
          let array = batch.column(schema.index_of(column.name)?);
          Ok(array_values(column, array.as_ref())?.into_iter())
        })
        .collect::<Result<Vec<_>>>()?;

      for _ in 0..batch.num_rows() {
        let mut row = vec![Value::Null; spec.columns.len()];
        for (cells, &i) in columns.iter_mut().zip(&data_indices) {
          row[i] = cells.next().unwrap_or(Value::Null);
        }
        for (value, &i) in partition.iter().zip(&partition_indices) {
          row[i] = value.clone();
        }
        rows.push(row);
      }
    }
    debug!(table = spec.name, path = %path.display(), "read part file");
  }

  info!(table = spec.name, rows = rows.len(), "read table");
  Ok(Table::new(spec, rows)?)
}
