//! Transformation engine: input records → star-schema rows.
//!
//! All stages are synchronous and data-parallel on the ambient rayon pool.
//! Callers running inside an async runtime should wrap them in
//! `spawn_blocking`.

pub mod dedup;
pub mod dimensions;
pub mod facts;
pub mod keys;

pub use dimensions::{build_artists, build_songs, build_time, build_users};
pub use facts::{FactOptions, FactOutput, JoinPolicy, build_songplays};
