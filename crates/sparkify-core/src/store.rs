//! The `TableStore` trait, the sink finished tables are handed to.
//!
//! Implemented by storage backends (e.g. `sparkify-store-parquet`). The
//! pipeline depends on this abstraction, not on any concrete backend.

use std::future::Future;

use serde::Serialize;

use crate::{schema::TableSpec, table::Table};

/// What a single [`TableStore::write_table`] call produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
  pub table:      String,
  pub rows:       usize,
  /// Distinct partition directories written (1 for unpartitioned tables).
  pub partitions: usize,
  pub files:      usize,
}

/// Abstraction over a star-schema table store.
///
/// Writes have overwrite semantics: a successful `write_table` fully replaces
/// whatever the store previously held for that table. Concurrent writes to
/// the same table are not supported and must be serialised by the caller.
pub trait TableStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `table`, replacing any previous contents.
  fn write_table(
    &self,
    table: Table,
  ) -> impl Future<Output = Result<WriteSummary, Self::Error>> + Send + '_;

  /// Load a previously written table. Row order is unspecified.
  fn read_table(
    &self,
    spec: &'static TableSpec,
  ) -> impl Future<Output = Result<Table, Self::Error>> + Send + '_;
}
