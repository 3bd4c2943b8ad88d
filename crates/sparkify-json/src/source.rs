//! Input discovery and parallel file decoding.

use std::{
  fs,
  io::ErrorKind,
  path::{Path, PathBuf},
};

use rayon::prelude::*;
use sparkify_core::record::Record;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::{
  Error, ReadStats, Result,
  parse::{Layout, decode},
};

/// List every `*.json` file under `root`, in a stable (sorted) order.
///
/// An unreachable `root` is fatal.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
  fs::metadata(root).map_err(|source| Error::InputUnreachable {
    path: root.to_path_buf(),
    source,
  })?;

  let mut files = Vec::new();
  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry?;
    let is_json = entry
      .path()
      .extension()
      .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if entry.file_type().is_file() && is_json {
      files.push(entry.into_path());
    }
  }
  Ok(files)
}

/// Decode all records of type `R` found under `root`.
///
/// Files are decoded in parallel; the returned records keep file order, so
/// repeated reads of the same corpus yield the same sequence.
pub fn read_records<R: Record>(
  root: &Path,
  layout: Layout,
) -> Result<(Vec<R>, ReadStats)> {
  let files = discover(root)?;

  let per_file = files
    .par_iter()
    .map(|path| read_file::<R>(path, layout))
    .collect::<Result<Vec<_>>>()?;

  let mut records = Vec::new();
  let mut stats = ReadStats { files: files.len(), ..ReadStats::default() };
  for (mut batch, file_stats) in per_file {
    records.append(&mut batch);
    stats += file_stats;
  }

  info!(
    source = R::NAME,
    files = stats.files,
    records = stats.records,
    dropped = stats.dropped,
    null_coerced = stats.null_coerced,
    "read input records"
  );
  Ok((records, stats))
}

fn read_file<R: Record>(path: &Path, layout: Layout) -> Result<(Vec<R>, ReadStats)> {
  match fs::read_to_string(path) {
    Ok(text) => Ok(decode(&text, layout)),
    // Not UTF-8: the file is malformed, not the source.
    Err(e) if e.kind() == ErrorKind::InvalidData => {
      warn!(path = %path.display(), error = %e, "skipping undecodable file");
      let stats = ReadStats { records: 1, dropped: 1, ..ReadStats::default() };
      Ok((Vec::new(), stats))
    }
    Err(source) => Err(Error::Io { path: path.to_path_buf(), source }),
  }
}
