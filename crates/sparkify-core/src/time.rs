//! Epoch-millisecond → calendar decomposition for the `time` dimension.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::dimension::TimeDim;

/// Break an epoch-millisecond timestamp into its `time` dimension row.
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn decompose(epoch_millis: i64) -> Option<TimeDim> {
  let start_time = DateTime::<Utc>::from_timestamp_millis(epoch_millis)?;
  Some(TimeDim {
    start_time,
    hour: start_time.hour() as i32,
    day: start_time.day() as i32,
    week: start_time.iso_week().week() as i32,
    month: start_time.month() as i32,
    year: start_time.year(),
    weekday: start_time.weekday().number_from_sunday() as i32,
  })
}
