//! Text → typed records.
//!
//! Pipeline:
//!   file contents
//!     └─ split by layout      → candidate JSON texts
//!          └─ serde_json       → JSON object (anything else is dropped)
//!               └─ typed_row() → Vec<Value> against `R::SCHEMA`
//!                    └─ R::from_values() → R

use serde_json::{Map, Value as Json};
use sparkify_core::record::Record;
use tracing::debug;

use crate::{ReadStats, coerce::typed_row};

/// How records are laid out inside one input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
  /// The whole file is one JSON object (song catalog).
  Document,
  /// One JSON object per line (activity log).
  Lines,
}

/// Decode every record in `text`. Never fails: malformed records are dropped
/// and counted.
pub fn decode<R: Record>(text: &str, layout: Layout) -> (Vec<R>, ReadStats) {
  let mut stats = ReadStats::default();
  let mut records = Vec::new();

  let mut accept = |candidate: &str, stats: &mut ReadStats| {
    stats.records += 1;
    let Some(object) = parse_object(candidate) else {
      stats.dropped += 1;
      debug!(source = R::NAME, "dropped record that is not a JSON object");
      return;
    };
    let (values, coerced) = typed_row(&object, R::SCHEMA);
    stats.null_coerced += coerced;
    match R::from_values(values) {
      Ok(record) => records.push(record),
      Err(e) => {
        stats.dropped += 1;
        debug!(source = R::NAME, error = %e, "dropped undecodable record");
      }
    }
  };

  match layout {
    Layout::Document => {
      if !text.trim().is_empty() {
        accept(text, &mut stats);
      }
    }
    Layout::Lines => {
      for line in text.lines().filter(|l| !l.trim().is_empty()) {
        accept(line, &mut stats);
      }
    }
  }

  (records, stats)
}

fn parse_object(text: &str) -> Option<Map<String, Json>> {
  match serde_json::from_str::<Json>(text) {
    Ok(Json::Object(object)) => Some(object),
    _ => None,
  }
}
