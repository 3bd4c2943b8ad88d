//! Key-based deduplication with a parallel hash shuffle.
//!
//! Rows are routed to shards by the hash of their key, each shard keeps the
//! first row (in input order) per key, and survivors are returned in input
//! order. The representative for a key is therefore deterministic for a
//! given input sequence, independent of the number of worker threads.

use std::{
  collections::HashSet,
  hash::{BuildHasher, Hash},
};

use rayon::prelude::*;

/// Collapse rows whose keys are equal to the first such row.
pub fn dedup_by_key<T, K, F>(rows: Vec<T>, key: F) -> Vec<T>
where
  T: Send,
  K: Hash + Eq + Send,
  F: Fn(&T) -> K + Sync,
{
  let shard_count = rayon::current_num_threads().max(1);
  let hasher = std::hash::BuildHasherDefault::<std::hash::DefaultHasher>::default();

  let keyed: Vec<(usize, u64, K, T)> = rows
    .into_par_iter()
    .enumerate()
    .map(|(i, row)| {
      let k = key(&row);
      (i, hasher.hash_one(&k), k, row)
    })
    .collect();

  let mut shards: Vec<Vec<(usize, K, T)>> =
    (0..shard_count).map(|_| Vec::new()).collect();
  for (i, hash, k, row) in keyed {
    shards[(hash % shard_count as u64) as usize].push((i, k, row));
  }

  let mut survivors: Vec<(usize, T)> = shards
    .into_par_iter()
    .flat_map_iter(|shard| {
      let mut seen = HashSet::with_capacity(shard.len());
      shard
        .into_iter()
        .filter_map(move |(i, k, row)| seen.insert(k).then_some((i, row)))
    })
    .collect();

  survivors.par_sort_unstable_by_key(|(i, _)| *i);
  survivors.into_iter().map(|(_, row)| row).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keeps_first_occurrence_in_input_order() {
    let rows = vec![("b", 1), ("a", 2), ("b", 3), ("c", 4), ("a", 5)];
    let out = dedup_by_key(rows, |(k, _)| *k);
    assert_eq!(out, vec![("b", 1), ("a", 2), ("c", 4)]);
  }

  #[test]
  fn full_tuple_key_keeps_distinct_rows() {
    let rows = vec![(1, "free"), (1, "paid"), (1, "free")];
    let out = dedup_by_key(rows, |r| *r);
    assert_eq!(out, vec![(1, "free"), (1, "paid")]);
  }

  #[test]
  fn large_input_is_deterministic() {
    let rows: Vec<u32> = (0..50_000).map(|i| i % 997).collect();
    let first = dedup_by_key(rows.clone(), |v| *v);
    let second = dedup_by_key(rows, |v| *v);
    assert_eq!(first.len(), 997);
    assert_eq!(first, second);
    assert_eq!(first, (0..997).collect::<Vec<_>>());
  }

  #[test]
  fn empty_input() {
    let out = dedup_by_key(Vec::<u8>::new(), |v| *v);
    assert!(out.is_empty());
  }
}
