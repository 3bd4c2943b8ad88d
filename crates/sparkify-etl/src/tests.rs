//! End-to-end runs against on-disk fixtures.

use std::{fs, path::Path, sync::Arc};

use sparkify_core::{
  dimension::{ArtistDim, SongDim, SongplayFact, TimeDim, UserDim},
  schema::{ARTISTS, SONGPLAYS, SONGS, TIME, USERS},
  store::TableStore,
};
use sparkify_store_parquet::ParquetStore;
use sparkify_transform::JoinPolicy;
use tempfile::TempDir;

use crate::{EtlConfig, Overrides, Pipeline, load_config, warehouse_ddl};

// ─── Fixtures ────────────────────────────────────────────────────────────────

const SONGS_JSON: [(&str, &str); 3] = [
  (
    "A/A/A/TRAAAAW128F429D538.json",
    r#"{"num_songs": 1, "artist_id": "AR1", "artist_latitude": 53.4, "artist_longitude": -2.98, "artist_location": "Liverpool", "artist_name": "Beatles", "song_id": "SOX", "title": "Let It Be", "duration": 243.0, "year": 1970}"#,
  ),
  (
    "A/A/B/TRAABCL128F4286650.json",
    r#"{"num_songs": 1, "artist_id": "AR1", "artist_latitude": 53.4, "artist_longitude": -2.98, "artist_location": "Liverpool", "artist_name": "Beatles", "song_id": "SOY", "title": "Hey Jude", "duration": 431.0, "year": 1968}"#,
  ),
  (
    "A/B/A/TRABACN128F425B784.json",
    r#"{"num_songs": 1, "artist_id": "AR1", "artist_latitude": 53.4, "artist_longitude": -2.98, "artist_location": "Liverpool", "artist_name": "Beatles", "song_id": "SOZ", "title": "Let It Be", "duration": 243.0, "year": 1970}"#,
  ),
];

fn play(song: &str, artist: &str, level: &str, ts: i64) -> String {
  format!(
    r#"{{"artist":"{artist}","auth":"Logged In","firstName":"Ryan","gender":"M","itemInSession":0,"lastName":"Smith","length":243.0,"level":"{level}","location":"San Jose-Sunnyvale-Santa Clara, CA","method":"PUT","page":"NextSong","registration":1541016707796.0,"sessionId":583,"song":"{song}","status":200,"ts":{ts},"userAgent":"Mozilla/5.0","userId":"26"}}"#
  )
}

fn log_lines() -> String {
  [
    play("Let It Be", "Beatles", "free", 1542241826796),
    play("Unknown Song", "Nobody", "free", 1542241900000),
    r#"{"artist":null,"auth":"Logged In","firstName":"Lily","gender":"F","itemInSession":1,"lastName":"Koch","length":null,"level":"paid","location":"Chicago","method":"GET","page":"Home","registration":1541048010796.0,"sessionId":818,"song":null,"status":200,"ts":1542242000000,"userAgent":"Mozilla/5.0","userId":"15"}"#.to_string(),
    play("Hey Jude", "Beatles", "paid", 1543300000000),
    "{this is not json".to_string(),
  ]
  .join("\n")
}

fn write_fixtures(input: &Path) {
  for (relative, body) in SONGS_JSON {
    let path = input.join("song_data").join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
  }
  let log_dir = input.join("log_data/2018/11");
  fs::create_dir_all(&log_dir).unwrap();
  fs::write(log_dir.join("2018-11-15-events.json"), log_lines()).unwrap();
}

fn config(tmp: &TempDir, policy: JoinPolicy) -> EtlConfig {
  EtlConfig {
    input_root:     tmp.path().join("input"),
    output_root:    tmp.path().join("output"),
    song_data:      "song_data".into(),
    log_data:       "log_data".into(),
    join_policy:    policy,
    workers:        None,
    partition_rows: 2,
  }
}

async fn pipeline(tmp: &TempDir, policy: JoinPolicy) -> Pipeline<ParquetStore> {
  let cfg = config(tmp, policy);
  write_fixtures(&cfg.input_root);
  let store = ParquetStore::open(&cfg.output_root).await.unwrap();
  Pipeline::new(Arc::new(store), cfg)
}

// ─── Runs ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_run_builds_every_table() {
  let tmp = TempDir::new().unwrap();
  let p = pipeline(&tmp, JoinPolicy::Inner).await;
  let report = p.run().await.unwrap();

  assert_eq!(report.song_input.files, 3);
  assert_eq!(report.log_input.records, 5);
  assert_eq!(report.log_input.dropped, 1);

  let rows = |name: &str| report.table(name).map(|t| t.rows);
  assert_eq!(rows("songs"), Some(2));
  assert_eq!(rows("artists"), Some(1));
  assert_eq!(rows("users"), Some(2));
  assert_eq!(rows("time"), Some(3));
  assert_eq!(rows("songplays"), Some(2));
  assert_eq!(report.unresolved_songs, 1);
  assert_eq!(report.unresolved_times, 0);

  let out = tmp.path().join("output");
  assert!(out.join("songplays/year=2018/month=11").is_dir());
  assert!(out.join("users/level=free").is_dir());
  assert!(out.join("users/level=paid").is_dir());
  assert!(out.join("songs/year=1970/artist_id=AR1").is_dir());
  assert!(out.join("artists/part-00000.parquet").is_file());
}

#[tokio::test]
async fn facts_reference_written_dimensions() {
  let tmp = TempDir::new().unwrap();
  let p = pipeline(&tmp, JoinPolicy::Inner).await;
  p.run().await.unwrap();

  let store = ParquetStore::open(tmp.path().join("output")).await.unwrap();
  let songs: Vec<SongDim> = store.read_table(&SONGS).await.unwrap().into_rows().unwrap();
  let facts: Vec<SongplayFact> =
    store.read_table(&SONGPLAYS).await.unwrap().into_rows().unwrap();

  let let_it_be = songs.iter().find(|s| s.title == "Let It Be").unwrap();
  let fact = facts
    .iter()
    .find(|f| f.song_id.as_deref() == Some(let_it_be.song_id.as_str()))
    .unwrap();
  assert_eq!(fact.artist_id.as_deref(), Some("AR1"));
  assert_eq!(fact.user_id, Some(26));
  assert_eq!((fact.year, fact.month), (Some(2018), Some(11)));
}

#[tokio::test]
async fn left_policy_keeps_unmatched_plays() {
  let tmp = TempDir::new().unwrap();
  let p = pipeline(&tmp, JoinPolicy::Left).await;
  let report = p.run().await.unwrap();
  assert_eq!(report.table("songplays").map(|t| t.rows), Some(3));

  let store = ParquetStore::open(tmp.path().join("output")).await.unwrap();
  let facts: Vec<SongplayFact> =
    store.read_table(&SONGPLAYS).await.unwrap().into_rows().unwrap();
  assert_eq!(facts.iter().filter(|f| f.song_id.is_none()).count(), 1);
}

#[tokio::test]
async fn left_policy_keeps_plays_without_a_timestamp() {
  let tmp = TempDir::new().unwrap();
  let p = pipeline(&tmp, JoinPolicy::Left).await;
  let untimed = play("Let It Be", "Beatles", "free", 0).replace(r#""ts":0,"#, "");
  fs::write(
    p.config().log_root().join("2018/11/2018-11-16-events.json"),
    untimed,
  )
  .unwrap();

  let report = p.run().await.unwrap();
  assert_eq!(report.table("songplays").map(|t| t.rows), Some(4));
  assert_eq!(report.unresolved_times, 1);

  let store = ParquetStore::open(tmp.path().join("output")).await.unwrap();
  assert!(
    store
      .table_dir(&SONGPLAYS)
      .join("year=__HIVE_DEFAULT_PARTITION__/month=__HIVE_DEFAULT_PARTITION__")
      .is_dir()
  );
  let facts: Vec<SongplayFact> =
    store.read_table(&SONGPLAYS).await.unwrap().into_rows().unwrap();
  let untimed: Vec<_> = facts.iter().filter(|f| f.start_time.is_none()).collect();
  assert_eq!(untimed.len(), 1);
  assert_eq!((untimed[0].year, untimed[0].month), (None, None));
  assert_eq!(untimed[0].artist_id.as_deref(), Some("AR1"));
}

#[tokio::test]
async fn marker_spelled_artist_id_survives_the_run() {
  let tmp = TempDir::new().unwrap();
  let p = pipeline(&tmp, JoinPolicy::Inner).await;
  let song_dir = p.config().song_root().join("B/A/A");
  fs::create_dir_all(&song_dir).unwrap();
  fs::write(
    song_dir.join("TRBAAAA128F4286650.json"),
    r#"{"num_songs": 1, "artist_id": "__HIVE_DEFAULT_PARTITION__", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Hive", "song_id": "SOH", "title": "Marker", "duration": 120.0, "year": 2001}"#,
  )
  .unwrap();
  fs::write(
    p.config().log_root().join("2018/11/2018-11-16-events.json"),
    play("Marker", "Hive", "free", 1542300000000),
  )
  .unwrap();

  let report = p.run().await.unwrap();
  assert_eq!(report.table("songs").map(|t| t.rows), Some(3));
  assert_eq!(report.table("songplays").map(|t| t.rows), Some(3));

  let store = ParquetStore::open(tmp.path().join("output")).await.unwrap();
  let songs: Vec<SongDim> = store.read_table(&SONGS).await.unwrap().into_rows().unwrap();
  assert!(songs.iter().any(|s| s.artist_id == "__HIVE_DEFAULT_PARTITION__"));
  let facts: Vec<SongplayFact> =
    store.read_table(&SONGPLAYS).await.unwrap().into_rows().unwrap();
  assert!(
    facts
      .iter()
      .any(|f| f.artist_id.as_deref() == Some("__HIVE_DEFAULT_PARTITION__"))
  );
}

#[tokio::test]
async fn rerun_reproduces_dimensions_and_fact_count() {
  let tmp = TempDir::new().unwrap();
  let p = pipeline(&tmp, JoinPolicy::Inner).await;
  let store = ParquetStore::open(tmp.path().join("output")).await.unwrap();

  p.run().await.unwrap();
  let first = snapshot(&store).await;
  p.run().await.unwrap();
  let second = snapshot(&store).await;

  assert_eq!(first.songs, second.songs);
  assert_eq!(first.artists, second.artists);
  assert_eq!(first.users, second.users);
  assert_eq!(first.times, second.times);
  assert_eq!(first.fact_count, second.fact_count);
}

#[tokio::test]
async fn report_is_written_as_json() {
  let tmp = TempDir::new().unwrap();
  let p = pipeline(&tmp, JoinPolicy::Inner).await;
  let report = p.run().await.unwrap();

  let path = tmp.path().join("run.json");
  report.write_json(&path).unwrap();
  let json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();

  assert_eq!(json["join_policy"], "inner");
  assert_eq!(json["song_input"]["files"], 3);
  assert_eq!(json["log_input"]["dropped"], 1);
  assert_eq!(json["unresolved_songs"], 1);
  let tables = json["tables"].as_array().unwrap();
  assert_eq!(tables.len(), 5);
  assert_eq!(tables[4]["table"], "songplays");
  assert_eq!(tables[4]["rows"], 2);
}

#[test]
fn report_to_missing_directory_is_an_io_error() {
  let tmp = TempDir::new().unwrap();
  let report = crate::RunReport {
    song_input:       Default::default(),
    log_input:        Default::default(),
    tables:           Vec::new(),
    join_policy:      JoinPolicy::Left,
    unresolved_songs: 0,
    unresolved_times: 0,
    elapsed_ms:       0,
  };
  let err = report.write_json(&tmp.path().join("absent/run.json")).unwrap_err();
  assert!(matches!(err, crate::Error::Io { .. }));
}

#[tokio::test]
async fn missing_input_aborts_the_run() {
  let tmp = TempDir::new().unwrap();
  let cfg = config(&tmp, JoinPolicy::Inner);
  let store = ParquetStore::open(&cfg.output_root).await.unwrap();
  let err = Pipeline::new(Arc::new(store), cfg).run().await.unwrap_err();
  assert!(matches!(err, crate::Error::Read(_)));
}

struct Snapshot {
  songs:      Vec<SongDim>,
  artists:    Vec<ArtistDim>,
  users:      Vec<UserDim>,
  times:      Vec<TimeDim>,
  fact_count: usize,
}

async fn snapshot(store: &ParquetStore) -> Snapshot {
  let mut songs: Vec<SongDim> = store.read_table(&SONGS).await.unwrap().into_rows().unwrap();
  let mut artists: Vec<ArtistDim> =
    store.read_table(&ARTISTS).await.unwrap().into_rows().unwrap();
  let mut users: Vec<UserDim> = store.read_table(&USERS).await.unwrap().into_rows().unwrap();
  let mut times: Vec<TimeDim> = store.read_table(&TIME).await.unwrap().into_rows().unwrap();
  songs.sort_by(|a, b| a.song_id.cmp(&b.song_id));
  artists.sort_by(|a, b| a.artist_id.cmp(&b.artist_id));
  users.sort_by(|a, b| (a.user_id, &a.level).cmp(&(b.user_id, &b.level)));
  times.sort_by_key(|t| t.start_time);
  Snapshot {
    songs,
    artists,
    users,
    times,
    fact_count: store.read_table(&SONGPLAYS).await.unwrap().len(),
  }
}

// ─── Configuration ───────────────────────────────────────────────────────────

#[test]
fn config_file_is_layered_under_overrides() {
  let tmp = TempDir::new().unwrap();
  let path = tmp.path().join("sparkify.toml");
  fs::write(
    &path,
    "input_root = \"/data/in\"\noutput_root = \"/data/out\"\njoin_policy = \"left\"\nworkers = 4\n",
  )
  .unwrap();

  let cfg = load_config(&path, Overrides {
    output_root: Some("/elsewhere".into()),
    ..Overrides::default()
  })
  .unwrap();

  assert_eq!(cfg.input_root, Path::new("/data/in"));
  assert_eq!(cfg.output_root, Path::new("/elsewhere"));
  assert_eq!(cfg.join_policy, JoinPolicy::Left);
  assert_eq!(cfg.workers, Some(4));
  assert_eq!(cfg.partition_rows, 4096);
  assert_eq!(cfg.song_root(), Path::new("/data/in/song_data"));
  assert_eq!(cfg.log_root(), Path::new("/data/in/log_data"));
}

#[test]
fn missing_file_uses_overrides_and_defaults() {
  let tmp = TempDir::new().unwrap();
  let cfg = load_config(&tmp.path().join("absent.toml"), Overrides {
    input_root:  Some("in".into()),
    output_root: Some("out".into()),
    join_policy: Some("inner".into()),
  })
  .unwrap();
  assert_eq!(cfg.join_policy, JoinPolicy::Inner);
  assert_eq!(cfg.workers, None);
}

#[test]
fn ddl_covers_the_star_schema() {
  let create = warehouse_ddl(false);
  for table in ["songs", "artists", "users", "time", "songplays"] {
    assert!(create.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")));
  }
  assert_eq!(warehouse_ddl(true).matches("DROP TABLE IF EXISTS").count(), 5);
}
