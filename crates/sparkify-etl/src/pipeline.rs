//! The two-phase ETL run.
//!
//! ```text
//! phase 1 (concurrent)
//!   song phase: song_data ─ read ─┬─ build_songs   ─ write songs
//!                                 └─ build_artists ─ write artists
//!   log phase:  log_data  ─ read ─┬─ build_users   ─ write users
//!                                 └─ build_time    ─ write time
//! phase 2
//!   read songs + artists back from the store
//!   build_songplays(events, songs, artists, time) ─ write songplays
//! ```
//!
//! The fact builder only sees songs and artists after they have been durably
//! written. Any source or sink failure aborts the run.

use std::{sync::Arc, time::Instant};

use sparkify_core::{
  Row, Table, TableSpec,
  dimension::{ArtistDim, SongDim, TimeDim},
  record::LogEvent,
  schema::{ARTISTS, SONGS},
  store::{TableStore, WriteSummary},
};
use sparkify_json::ReadStats;
use sparkify_transform::{
  build_artists, build_songplays, build_songs, build_time, build_users,
};
use tokio::task::spawn_blocking;
use tracing::info;

use crate::{EtlConfig, Result, RunReport, store_error};

struct SongPhase {
  stats:   ReadStats,
  written: [WriteSummary; 2],
}

struct LogPhase {
  stats:   ReadStats,
  events:  Vec<LogEvent>,
  times:   Vec<TimeDim>,
  written: [WriteSummary; 2],
}

/// Runs the ETL against a [`TableStore`].
pub struct Pipeline<S> {
  store:  Arc<S>,
  config: EtlConfig,
}

impl<S: TableStore + 'static> Pipeline<S> {
  pub fn new(store: Arc<S>, config: EtlConfig) -> Self { Self { store, config } }

  pub fn config(&self) -> &EtlConfig { &self.config }

  /// Execute a full run, replacing every table in the store.
  pub async fn run(&self) -> Result<RunReport> {
    let started = Instant::now();
    info!(
      input = %self.config.input_root.display(),
      output = %self.config.output_root.display(),
      policy = %self.config.join_policy,
      "starting run"
    );

    let (songs, logs) = tokio::try_join!(self.song_phase(), self.log_phase())?;

    // Phase 2: facts from the written dimensions.
    let song_rows: Vec<SongDim> = self.read(&SONGS).await?;
    let artist_rows: Vec<ArtistDim> = self.read(&ARTISTS).await?;
    let opts = self.config.fact_options();
    let LogPhase { stats: log_stats, events, times, written: log_written } = logs;
    let facts = spawn_blocking(move || {
      build_songplays(&events, &song_rows, &artist_rows, &times, opts)
    })
    .await??;
    let songplays = self.write(facts.facts).await?;

    let mut tables = Vec::with_capacity(5);
    tables.extend(songs.written);
    tables.extend(log_written);
    tables.push(songplays);

    let report = RunReport {
      song_input: songs.stats,
      log_input: log_stats,
      tables,
      join_policy: self.config.join_policy,
      unresolved_songs: facts.unresolved_songs,
      unresolved_times: facts.unresolved_times,
      elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    info!(elapsed_ms = report.elapsed_ms, "run complete");
    Ok(report)
  }

  async fn song_phase(&self) -> Result<SongPhase> {
    let root = self.config.song_root();
    let (stats, songs, artists) = spawn_blocking(move || -> Result<_> {
      let (records, stats) = sparkify_json::read_song_records(&root)?;
      let songs = build_songs(&records)?;
      let artists = build_artists(&records);
      Ok((stats, songs, artists))
    })
    .await??;

    let written = [self.write(songs).await?, self.write(artists).await?];
    Ok(SongPhase { stats, written })
  }

  async fn log_phase(&self) -> Result<LogPhase> {
    let root = self.config.log_root();
    let (stats, events, users, times) = spawn_blocking(move || -> Result<_> {
      let (events, stats) = sparkify_json::read_log_events(&root)?;
      let users = build_users(&events);
      let times = build_time(&events);
      Ok((stats, events, users, times))
    })
    .await??;

    let written = [self.write(users).await?, self.write(times.clone()).await?];
    Ok(LogPhase { stats, events, times, written })
  }

  async fn write<R: Row>(&self, rows: Vec<R>) -> Result<WriteSummary> {
    let table = Table::from_rows(rows)?;
    self.store.write_table(table).await.map_err(store_error::<S>)
  }

  async fn read<R: Row>(&self, spec: &'static TableSpec) -> Result<Vec<R>> {
    let table = self.store.read_table(spec).await.map_err(store_error::<S>)?;
    Ok(table.into_rows()?)
  }
}
