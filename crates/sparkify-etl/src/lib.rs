//! Orchestration layer for the Sparkify ETL.
//!
//! Wires the record readers, the transformation engine and any
//! [`TableStore`] into a two-phase run; see [`Pipeline`].

pub mod error;
pub mod pipeline;
pub mod report;

pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use report::RunReport;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sparkify_core::{
  schema::STAR_SCHEMA,
  store::TableStore,
  warehouse::{create_table_sql, drop_table_sql},
};
use sparkify_transform::{FactOptions, JoinPolicy};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Environment variable prefix, e.g. `SPARKIFY_OUTPUT_ROOT`.
pub const ENV_PREFIX: &str = "SPARKIFY";

/// Runtime configuration, deserialised from `sparkify.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone)]
pub struct EtlConfig {
  pub input_root:     PathBuf,
  pub output_root:    PathBuf,
  /// Song catalog directory, relative to `input_root`.
  #[serde(default = "default_song_data")]
  pub song_data:      PathBuf,
  /// Activity log directory, relative to `input_root`.
  #[serde(default = "default_log_data")]
  pub log_data:       PathBuf,
  #[serde(default)]
  pub join_policy:    JoinPolicy,
  /// Size of the rayon pool; all cores when unset.
  #[serde(default)]
  pub workers:        Option<usize>,
  #[serde(default = "default_partition_rows")]
  pub partition_rows: usize,
}

fn default_song_data() -> PathBuf { PathBuf::from("song_data") }

fn default_log_data() -> PathBuf { PathBuf::from("log_data") }

fn default_partition_rows() -> usize { FactOptions::default().partition_rows }

impl EtlConfig {
  pub fn song_root(&self) -> PathBuf { self.input_root.join(&self.song_data) }

  pub fn log_root(&self) -> PathBuf { self.input_root.join(&self.log_data) }

  pub fn fact_options(&self) -> FactOptions {
    FactOptions {
      policy:         self.join_policy,
      partition_rows: self.partition_rows,
    }
  }
}

/// Command-line values that take precedence over file and environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
  pub input_root:  Option<PathBuf>,
  pub output_root: Option<PathBuf>,
  pub join_policy: Option<String>,
}

/// Layer the optional config file, the environment and `overrides`.
pub fn load_config(path: &Path, overrides: Overrides) -> Result<EtlConfig> {
  let path_value = |p: PathBuf| p.to_string_lossy().into_owned();
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix(ENV_PREFIX))
    .set_override_option("input_root", overrides.input_root.map(path_value))?
    .set_override_option("output_root", overrides.output_root.map(path_value))?
    .set_override_option("join_policy", overrides.join_policy)?
    .build()?;
  Ok(settings.try_deserialize()?)
}

// ─── Warehouse schema ─────────────────────────────────────────────────────────

/// `CREATE TABLE` (or `DROP TABLE`) statements for every star-schema table.
pub fn warehouse_ddl(drop: bool) -> String {
  STAR_SCHEMA
    .iter()
    .map(|spec| if drop { drop_table_sql(spec) } else { create_table_sql(spec) })
    .collect::<Vec<_>>()
    .join("\n\n")
}

/// Box a store error for [`Error::Store`].
pub(crate) fn store_error<S: TableStore>(e: S::Error) -> Error { Error::Store(Box::new(e)) }

#[cfg(test)]
mod tests;
