//! The songplays fact builder.
//!
//! Play events are matched against songs joined to artists on
//! `(title, artist name)`, exact and case-sensitive, and against the time
//! dimension on the converted timestamp. Events are processed in fixed-size
//! partitions; each partition owns a [`PartitionSequence`] so ids are unique
//! without coordination.

use std::{collections::HashMap, fmt};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sparkify_core::{
  Result,
  dimension::{ArtistDim, SongDim, SongplayFact, TimeDim},
  record::LogEvent,
  schema::SONGPLAYS,
};
use tracing::{debug, info};

use crate::keys::{PartitionSequence, ensure_unique};

/// What happens to a play event whose song or time lookup finds nothing.
/// Applied identically to both joins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinPolicy {
  /// Drop the event.
  #[default]
  Inner,
  /// Keep the event with null keys.
  Left,
}

impl fmt::Display for JoinPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Inner => f.write_str("inner"),
      Self::Left => f.write_str("left"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactOptions {
  pub policy:         JoinPolicy,
  /// Events per parallel task; also the capacity of one id partition.
  pub partition_rows: usize,
}

impl Default for FactOptions {
  fn default() -> Self { Self { policy: JoinPolicy::Inner, partition_rows: 4096 } }
}

#[derive(Debug, Clone, Default)]
pub struct FactOutput {
  pub facts:             Vec<SongplayFact>,
  /// Play events with no matching (title, artist name) pair.
  pub unresolved_songs:  usize,
  /// Play events with no matching time row.
  pub unresolved_times:  usize,
}

// ─── Join indexes ────────────────────────────────────────────────────────────

type SongKey<'a> = (&'a str, &'a str);

/// `(title, artist name)` → `(song_id, artist_id)`. Ambiguous pairs resolve
/// to the smallest song id.
fn song_index<'a>(
  songs: &'a [SongDim],
  artists: &'a [ArtistDim],
) -> HashMap<SongKey<'a>, (&'a str, &'a str)> {
  let names: HashMap<&str, &str> = artists
    .iter()
    .filter_map(|a| Some((a.artist_id.as_str(), a.name.as_deref()?)))
    .collect();

  let mut index: HashMap<SongKey<'a>, (&'a str, &'a str)> = HashMap::new();
  for song in songs {
    let Some(&name) = names.get(song.artist_id.as_str()) else { continue };
    let candidate = (song.song_id.as_str(), song.artist_id.as_str());
    index
      .entry((song.title.as_str(), name))
      .and_modify(|current| {
        if candidate.0 < current.0 {
          *current = candidate;
        }
      })
      .or_insert(candidate);
  }
  index
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Build the fact table from play events and the finished dimensions.
pub fn build_songplays(
  events: &[LogEvent],
  songs: &[SongDim],
  artists: &[ArtistDim],
  times: &[TimeDim],
  opts: FactOptions,
) -> Result<FactOutput> {
  let song_lookup = song_index(songs, artists);
  let time_lookup: HashMap<i64, &TimeDim> = times
    .iter()
    .map(|t| (t.start_time.timestamp_millis(), t))
    .collect();

  let plays: Vec<&LogEvent> = events.iter().filter(|e| e.is_song_play()).collect();

  let partitions: Vec<FactOutput> = plays
    .par_chunks(opts.partition_rows.max(1))
    .enumerate()
    .map(|(partition, chunk)| -> Result<FactOutput> {
      let mut ids = PartitionSequence::new(partition)?;
      let mut out = FactOutput::default();

      for event in chunk {
        let song = match (event.song.as_deref(), event.artist.as_deref()) {
          (Some(title), Some(artist)) => song_lookup.get(&(title, artist)).copied(),
          _ => None,
        };
        let time = event.ts.and_then(|ts| time_lookup.get(&ts).copied());

        if song.is_none() {
          out.unresolved_songs += 1;
        }
        if time.is_none() {
          out.unresolved_times += 1;
        }
        if opts.policy == JoinPolicy::Inner && (song.is_none() || time.is_none()) {
          continue;
        }

        out.facts.push(SongplayFact {
          songplay_id: ids.next_id()?,
          start_time:  time.map(|t| t.start_time),
          user_id:     event.user_id,
          level:       event.level.clone(),
          song_id:     song.map(|(id, _)| id.to_owned()),
          artist_id:   song.map(|(_, id)| id.to_owned()),
          session_id:  event.session_id,
          location:    event.location.clone(),
          user_agent:  event.user_agent.clone(),
          year:        time.map(|t| t.year),
          month:       time.map(|t| t.month),
        });
      }

      debug!(partition, rows = out.facts.len(), "built songplays partition");
      Ok(out)
    })
    .collect::<Result<_>>()?;

  let mut output = FactOutput::default();
  for part in partitions {
    output.facts.extend(part.facts);
    output.unresolved_songs += part.unresolved_songs;
    output.unresolved_times += part.unresolved_times;
  }

  ensure_unique(SONGPLAYS.name, output.facts.iter().map(|f| f.songplay_id))?;
  info!(
    rows = output.facts.len(),
    unresolved_songs = output.unresolved_songs,
    unresolved_times = output.unresolved_times,
    policy = %opts.policy,
    "built songplays fact table"
  );
  Ok(output)
}
