//! Dimension builders: input records → deduplicated dimension rows.
//!
//! Each builder is independent of the others. Row-level selection runs in
//! parallel; deduplication is the only global step.

use rayon::prelude::*;
use sparkify_core::{
  Result,
  dimension::{ArtistDim, SongDim, TimeDim, UserDim},
  record::{LogEvent, SongRecord},
  schema::SONGS,
  time::decompose,
};
use tracing::info;

use crate::{
  dedup::dedup_by_key,
  keys::{ensure_unique, song_id},
};

/// Distinct (title, artist_id, year, duration) tuples with content-derived
/// ids. Records missing a title, artist id or duration are skipped.
pub fn build_songs(records: &[SongRecord]) -> Result<Vec<SongDim>> {
  let tuples: Vec<(String, String, Option<i32>, f64)> = records
    .par_iter()
    .filter_map(|r| {
      Some((r.title.clone()?, r.artist_id.clone()?, r.year, r.duration?))
    })
    .collect();

  let distinct = dedup_by_key(tuples, |(title, artist_id, year, duration)| {
    (title.clone(), artist_id.clone(), *year, duration.to_bits())
  });

  let songs: Vec<SongDim> = distinct
    .into_par_iter()
    .map(|(title, artist_id, year, duration)| SongDim {
      song_id: song_id(&title, &artist_id, year, duration),
      title,
      artist_id,
      year,
      duration,
    })
    .collect();

  ensure_unique(SONGS.name, songs.iter().map(|s| s.song_id.as_str()))?;
  info!(rows = songs.len(), "built songs dimension");
  Ok(songs)
}

/// One row per artist id; the first catalog record for an artist wins.
pub fn build_artists(records: &[SongRecord]) -> Vec<ArtistDim> {
  let candidates: Vec<ArtistDim> = records
    .par_iter()
    .filter_map(|r| {
      Some(ArtistDim {
        artist_id: r.artist_id.clone()?,
        name:      r.artist_name.clone(),
        location:  r.artist_location.clone(),
        latitude:  r.artist_latitude,
        longitude: r.artist_longitude,
      })
    })
    .collect();

  let artists = dedup_by_key(candidates, |a| a.artist_id.clone());
  info!(rows = artists.len(), "built artists dimension");
  artists
}

/// Distinct user tuples seen in play events. A level change yields a second
/// row for the same user id.
pub fn build_users(events: &[LogEvent]) -> Vec<UserDim> {
  let candidates: Vec<UserDim> = events
    .par_iter()
    .filter(|e| e.is_song_play())
    .filter_map(|e| {
      Some(UserDim {
        user_id:    e.user_id?,
        first_name: e.first_name.clone(),
        last_name:  e.last_name.clone(),
        gender:     e.gender.clone(),
        level:      e.level.clone(),
      })
    })
    .collect();

  let users = dedup_by_key(candidates, UserDim::clone);
  info!(rows = users.len(), "built users dimension");
  users
}

/// One row per distinct play timestamp.
pub fn build_time(events: &[LogEvent]) -> Vec<TimeDim> {
  let candidates: Vec<TimeDim> = events
    .par_iter()
    .filter(|e| e.is_song_play())
    .filter_map(|e| decompose(e.ts?))
    .collect();

  let times = dedup_by_key(candidates, |t| t.start_time);
  info!(rows = times.len(), "built time dimension");
  times
}
