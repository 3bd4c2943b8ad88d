//! Core types and trait definitions for the Sparkify star schema.
//!
//! No file-format or storage dependencies live here; every other crate builds
//! on these types.

pub mod dimension;
pub mod error;
pub mod record;
pub mod schema;
pub mod store;
pub mod table;
pub mod time;
pub mod warehouse;

pub use error::{Error, Result};
pub use schema::{Column, ColumnType, TableSpec, Value};
pub use table::{Row, Table};
