//! Star-schema rows: four dimensions and the song-play fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  schema::{ARTISTS, SONGPLAYS, SONGS, TIME, TableSpec, USERS, Value},
  table::{Cells, Row, required},
};

// ─── Songs ───────────────────────────────────────────────────────────────────

/// One distinct (title, artist_id, year, duration) tuple from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongDim {
  /// Content-derived surrogate key.
  pub song_id:   String,
  pub title:     String,
  pub artist_id: String,
  pub year:      Option<i32>,
  pub duration:  f64,
}

impl Row for SongDim {
  fn spec() -> &'static TableSpec { &SONGS }

  fn into_values(self) -> Vec<Value> {
    vec![
      Value::Utf8(self.song_id),
      Value::Utf8(self.title),
      Value::Utf8(self.artist_id),
      self.year.into(),
      Value::Float64(self.duration),
    ]
  }

  fn from_values(values: Vec<Value>) -> Result<Self> {
    let mut c = Cells::new(SONGS.name, SONGS.columns, values)?;
    Ok(Self {
      song_id:   required("song_id", c.utf8()?)?,
      title:     required("title", c.utf8()?)?,
      artist_id: required("artist_id", c.utf8()?)?,
      year:      c.int32()?,
      duration:  required("duration", c.float64()?)?,
    })
  }
}

// ─── Artists ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistDim {
  pub artist_id: String,
  pub name:      Option<String>,
  pub location:  Option<String>,
  pub latitude:  Option<f64>,
  pub longitude: Option<f64>,
}

impl Row for ArtistDim {
  fn spec() -> &'static TableSpec { &ARTISTS }

  fn into_values(self) -> Vec<Value> {
    vec![
      Value::Utf8(self.artist_id),
      self.name.into(),
      self.location.into(),
      self.latitude.into(),
      self.longitude.into(),
    ]
  }

  fn from_values(values: Vec<Value>) -> Result<Self> {
    let mut c = Cells::new(ARTISTS.name, ARTISTS.columns, values)?;
    Ok(Self {
      artist_id: required("artist_id", c.utf8()?)?,
      name:      c.utf8()?,
      location:  c.utf8()?,
      latitude:  c.float64()?,
      longitude: c.float64()?,
    })
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// A user as seen in play events. A user who changed subscription level
/// appears once per level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserDim {
  pub user_id:    i32,
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub gender:     Option<String>,
  pub level:      Option<String>,
}

impl Row for UserDim {
  fn spec() -> &'static TableSpec { &USERS }

  fn into_values(self) -> Vec<Value> {
    vec![
      Value::Int32(self.user_id),
      self.first_name.into(),
      self.last_name.into(),
      self.gender.into(),
      self.level.into(),
    ]
  }

  fn from_values(values: Vec<Value>) -> Result<Self> {
    let mut c = Cells::new(USERS.name, USERS.columns, values)?;
    Ok(Self {
      user_id:    required("user_id", c.int32()?)?,
      first_name: c.utf8()?,
      last_name:  c.utf8()?,
      gender:     c.utf8()?,
      level:      c.utf8()?,
    })
  }
}

// ─── Time ────────────────────────────────────────────────────────────────────

/// Calendar breakdown of one play timestamp (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeDim {
  pub start_time: DateTime<Utc>,
  pub hour:       i32,
  pub day:        i32,
  /// ISO 8601 week number.
  pub week:       i32,
  pub month:      i32,
  pub year:       i32,
  /// 1 = Sunday … 7 = Saturday.
  pub weekday:    i32,
}

impl Row for TimeDim {
  fn spec() -> &'static TableSpec { &TIME }

  fn into_values(self) -> Vec<Value> {
    vec![
      Value::timestamp(self.start_time),
      Value::Int32(self.hour),
      Value::Int32(self.day),
      Value::Int32(self.week),
      Value::Int32(self.month),
      Value::Int32(self.year),
      Value::Int32(self.weekday),
    ]
  }

  fn from_values(values: Vec<Value>) -> Result<Self> {
    let mut c = Cells::new(TIME.name, TIME.columns, values)?;
    Ok(Self {
      start_time: required("start_time", c.timestamp()?)?,
      hour:       required("hour", c.int32()?)?,
      day:        required("day", c.int32()?)?,
      week:       required("week", c.int32()?)?,
      month:      required("month", c.int32()?)?,
      year:       required("year", c.int32()?)?,
      weekday:    required("weekday", c.int32()?)?,
    })
  }
}

// ─── Song plays ──────────────────────────────────────────────────────────────

/// One play event with its dimension keys resolved.
///
/// `song_id`/`artist_id` and the time attributes are only ever null when the
/// fact builder runs with the left-join policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongplayFact {
  pub songplay_id: i64,
  pub start_time:  Option<DateTime<Utc>>,
  pub user_id:     Option<i32>,
  pub level:       Option<String>,
  pub song_id:     Option<String>,
  pub artist_id:   Option<String>,
  pub session_id:  Option<i32>,
  pub location:    Option<String>,
  pub user_agent:  Option<String>,
  pub year:        Option<i32>,
  pub month:       Option<i32>,
}

impl Row for SongplayFact {
  fn spec() -> &'static TableSpec { &SONGPLAYS }

  fn into_values(self) -> Vec<Value> {
    vec![
      Value::Int64(self.songplay_id),
      self.start_time.into(),
      self.user_id.into(),
      self.level.into(),
      self.song_id.into(),
      self.artist_id.into(),
      self.session_id.into(),
      self.location.into(),
      self.user_agent.into(),
      self.year.into(),
      self.month.into(),
    ]
  }

  fn from_values(values: Vec<Value>) -> Result<Self> {
    let mut c = Cells::new(SONGPLAYS.name, SONGPLAYS.columns, values)?;
    Ok(Self {
      songplay_id: required("songplay_id", c.int64()?)?,
      start_time:  c.timestamp()?,
      user_id:     c.int32()?,
      level:       c.utf8()?,
      song_id:     c.utf8()?,
      artist_id:   c.utf8()?,
      session_id:  c.int32()?,
      location:    c.utf8()?,
      user_agent:  c.utf8()?,
      year:        c.int32()?,
      month:       c.int32()?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::{Error, table::Table};

  #[test]
  fn fact_survives_table_conversion() {
    let fact = SongplayFact {
      songplay_id: (3_i64 << 32) | 7,
      start_time:  Some(Utc.timestamp_millis_opt(1542241826796).unwrap()),
      user_id:     Some(26),
      level:       Some("free".into()),
      song_id:     None,
      artist_id:   None,
      session_id:  Some(583),
      location:    Some("San Jose-Sunnyvale-Santa Clara, CA".into()),
      user_agent:  None,
      year:        Some(2018),
      month:       Some(11),
    };

    let table = Table::from_rows([fact.clone()]).unwrap();
    assert_eq!(table.len(), 1);
    let back: Vec<SongplayFact> = table.into_rows().unwrap();
    assert_eq!(back, vec![fact]);
  }

  #[test]
  fn required_column_rejects_null() {
    let values = vec![
      Value::Null,
      Value::Utf8("Let It Be".into()),
      Value::Utf8("AR1".into()),
      Value::Int32(1970),
      Value::Float64(243.0),
    ];
    let err = SongDim::from_values(values).unwrap_err();
    assert!(matches!(err, Error::NullInRequiredColumn("song_id")));
  }

  #[test]
  fn into_rows_checks_table_identity() {
    let table = Table::from_rows(Vec::<UserDim>::new()).unwrap();
    let err = table.into_rows::<ArtistDim>().unwrap_err();
    assert!(matches!(
      err,
      Error::SpecMismatch { expected: "artists", found: "users" }
    ));
  }
}
