//! Input records: the song catalog and the user activity log.
//!
//! Both are read once per run and never mutated. Every field is optional:
//! readers coerce absent or malformed fields to null instead of rejecting the
//! whole record.

use crate::{
  Result,
  schema::{Column, ColumnType::*, Value},
  table::Cells,
};

/// Page action that marks an actual song play in the activity log.
pub const NEXT_SONG: &str = "NextSong";

/// A typed input record decoded from a row of coerced values.
pub trait Record: Sized + Send {
  const NAME: &'static str;
  /// Source field names and types, in decoding order.
  const SCHEMA: &'static [Column];

  fn from_values(values: Vec<Value>) -> Result<Self>;
}

// ─── Song catalog ────────────────────────────────────────────────────────────

pub const SONG_RECORD_SCHEMA: [Column; 10] = [
  Column::nullable("num_songs", Int32),
  Column::nullable("artist_id", Utf8),
  Column::nullable("artist_latitude", Float64),
  Column::nullable("artist_longitude", Float64),
  Column::nullable("artist_location", Utf8),
  Column::nullable("artist_name", Utf8),
  Column::nullable("song_id", Utf8),
  Column::nullable("title", Utf8),
  Column::nullable("duration", Float64),
  Column::nullable("year", Int32),
];

/// One song-catalog document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongRecord {
  pub num_songs:        Option<i32>,
  pub artist_id:        Option<String>,
  pub artist_latitude:  Option<f64>,
  pub artist_longitude: Option<f64>,
  pub artist_location:  Option<String>,
  pub artist_name:      Option<String>,
  /// Catalog-assigned id. Not used as the `songs` key; see `SongDim`.
  pub song_id:          Option<String>,
  pub title:            Option<String>,
  pub duration:         Option<f64>,
  pub year:             Option<i32>,
}

impl Record for SongRecord {
  const NAME: &'static str = "song_data";
  const SCHEMA: &'static [Column] = &SONG_RECORD_SCHEMA;

  fn from_values(values: Vec<Value>) -> Result<Self> {
    let mut c = Cells::new(Self::NAME, Self::SCHEMA, values)?;
    Ok(Self {
      num_songs:        c.int32()?,
      artist_id:        c.utf8()?,
      artist_latitude:  c.float64()?,
      artist_longitude: c.float64()?,
      artist_location:  c.utf8()?,
      artist_name:      c.utf8()?,
      song_id:          c.utf8()?,
      title:            c.utf8()?,
      duration:         c.float64()?,
      year:             c.int32()?,
    })
  }
}

// ─── Activity log ────────────────────────────────────────────────────────────

pub const LOG_EVENT_SCHEMA: [Column; 18] = [
  Column::nullable("artist", Utf8),
  Column::nullable("auth", Utf8),
  Column::nullable("firstName", Utf8),
  Column::nullable("gender", Utf8),
  Column::nullable("itemInSession", Int32),
  Column::nullable("lastName", Utf8),
  Column::nullable("length", Float64),
  Column::nullable("level", Utf8),
  Column::nullable("location", Utf8),
  Column::nullable("method", Utf8),
  Column::nullable("page", Utf8),
  Column::nullable("registration", Float64),
  Column::nullable("sessionId", Int32),
  Column::nullable("song", Utf8),
  Column::nullable("status", Int32),
  Column::nullable("ts", TimestampMillis),
  Column::nullable("userAgent", Utf8),
  Column::nullable("userId", Int32),
];

/// One line of the activity log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogEvent {
  pub artist:          Option<String>,
  pub auth:            Option<String>,
  pub first_name:      Option<String>,
  pub gender:          Option<String>,
  pub item_in_session: Option<i32>,
  pub last_name:       Option<String>,
  pub length:          Option<f64>,
  pub level:           Option<String>,
  pub location:        Option<String>,
  pub method:          Option<String>,
  pub page:            Option<String>,
  pub registration:    Option<f64>,
  pub session_id:      Option<i32>,
  pub song:            Option<String>,
  pub status:          Option<i32>,
  /// Event time in epoch milliseconds.
  pub ts:              Option<i64>,
  pub user_agent:      Option<String>,
  pub user_id:         Option<i32>,
}

impl LogEvent {
  /// `true` for actual plays, as opposed to logins, settings pages, etc.
  pub fn is_song_play(&self) -> bool { self.page.as_deref() == Some(NEXT_SONG) }
}

impl Record for LogEvent {
  const NAME: &'static str = "log_data";
  const SCHEMA: &'static [Column] = &LOG_EVENT_SCHEMA;

  fn from_values(values: Vec<Value>) -> Result<Self> {
    let mut c = Cells::new(Self::NAME, Self::SCHEMA, values)?;
    Ok(Self {
      artist:          c.utf8()?,
      auth:            c.utf8()?,
      first_name:      c.utf8()?,
      gender:          c.utf8()?,
      item_in_session: c.int32()?,
      last_name:       c.utf8()?,
      length:          c.float64()?,
      level:           c.utf8()?,
      location:        c.utf8()?,
      method:          c.utf8()?,
      page:            c.utf8()?,
      registration:    c.float64()?,
      session_id:      c.int32()?,
      song:            c.utf8()?,
      status:          c.int32()?,
      ts:              c.timestamp_millis()?,
      user_agent:      c.utf8()?,
      user_id:         c.int32()?,
    })
  }
}
