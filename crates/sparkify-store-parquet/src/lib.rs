//! Partitioned parquet backend for the Sparkify table store.
//!
//! Each table lives under `<root>/<table>/`, split into hive-style
//! `column=value` directories by its partition columns. Writes go to a
//! staging directory that replaces the table directory only once every part
//! file has been written.

mod encode;
mod layout;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::ParquetStore;
