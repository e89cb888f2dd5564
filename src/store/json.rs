// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Single-file JSON store.
//!
//! The whole store is loaded at open and rewritten on every save, via a
//! temporary file and rename so a crash mid-write cannot corrupt it. That
//! is plenty for this workload: saves happen once per completed search,
//! which for interesting N is minutes to days apart.

use super::{ResultStore, StoreError, StoreStats};
use crate::search::{SolutionResult, SolutionStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    results: Vec<SolutionResult>,
    /// Optimal sets per N, each list free of duplicates.
    optimal_sets: BTreeMap<u32, Vec<Vec<u64>>>,
}

/// File-backed [`ResultStore`].
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    data: StoreData,
}

impl JsonStore {
    /// Open (or implicitly create) the store at `path`. A missing file is
    /// an empty store; it is materialised on the first save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Format {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => StoreData::default(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let bytes = serde_json::to_vec_pretty(&self.data).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl ResultStore for JsonStore {
    fn has_optimal(&self, n: u32) -> Result<bool, StoreError> {
        Ok(self
            .data
            .results
            .iter()
            .any(|r| r.n == n && r.status == SolutionStatus::Optimal))
    }

    fn best_bound(&self, n: u32) -> Result<Option<u64>, StoreError> {
        Ok(self
            .data
            .results
            .iter()
            .filter(|r| r.n == n && r.status == SolutionStatus::Optimal)
            .map(|r| r.max_value)
            .min())
    }

    fn save_result(&mut self, result: &SolutionResult) -> Result<(), StoreError> {
        let existing = self
            .data
            .results
            .iter_mut()
            .find(|r| r.n == result.n && r.max_value == result.max_value && r.set == result.set);
        match existing {
            Some(slot) => *slot = result.clone(),
            None => self.data.results.push(result.clone()),
        }
        self.data.results.sort_by_key(|r| (r.n, r.max_value));
        self.flush()
    }

    fn save_optimal_sets(&mut self, n: u32, sets: &[Vec<u64>]) -> Result<(), StoreError> {
        let stored = self.data.optimal_sets.entry(n).or_default();
        for set in sets {
            if !stored.contains(set) {
                stored.push(set.clone());
            }
        }
        self.flush()
    }

    fn last_solved_n(&self) -> Result<Option<u32>, StoreError> {
        Ok(self
            .data
            .results
            .iter()
            .filter(|r| r.status == SolutionStatus::Optimal)
            .map(|r| r.n)
            .max())
    }

    fn results(&self) -> Result<Vec<SolutionResult>, StoreError> {
        Ok(self.data.results.clone())
    }

    fn optimal_sets(&self, n: u32) -> Result<Vec<Vec<u64>>, StoreError> {
        Ok(self.data.optimal_sets.get(&n).cloned().unwrap_or_default())
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let optimal: Vec<_> = self
            .data
            .results
            .iter()
            .filter(|r| r.status == SolutionStatus::Optimal)
            .collect();
        Ok(StoreStats {
            total_results: self.data.results.len(),
            optimal_results: optimal.len(),
            max_n_solved: optimal.iter().map(|r| r.n).max().unwrap_or(0),
            total_computation_time: self
                .data
                .results
                .iter()
                .map(|r| r.computation_time)
                .sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(n: u32, max: u64, set: &[u64], status: SolutionStatus) -> SolutionResult {
        SolutionResult {
            n,
            max_value: max,
            set: set.to_vec(),
            computation_time: 0.5,
            status,
            nodes_explored: 100,
            timestamp: 1_700_000_000,
        }
    }

    fn open_temp() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::open(dir.path().join("results.json")).expect("open");
        (dir, store)
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let (_dir, store) = open_temp();
        assert!(!store.has_optimal(3).unwrap());
        assert_eq!(store.best_bound(3).unwrap(), None);
        assert_eq!(store.last_solved_n().unwrap(), None);
        assert!(store.results().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let (dir, mut store) = open_temp();
        store
            .save_result(&result(3, 4, &[1, 2, 4], SolutionStatus::Optimal))
            .unwrap();
        store
            .save_optimal_sets(3, &[vec![1, 2, 4], vec![2, 3, 4]])
            .unwrap();

        let reopened = JsonStore::open(dir.path().join("results.json")).unwrap();
        assert!(reopened.has_optimal(3).unwrap());
        assert_eq!(reopened.best_bound(3).unwrap(), Some(4));
        assert_eq!(reopened.last_solved_n().unwrap(), Some(3));
        assert_eq!(
            reopened.optimal_sets(3).unwrap(),
            vec![vec![1, 2, 4], vec![2, 3, 4]]
        );
    }

    #[test]
    fn test_duplicate_result_is_replaced() {
        let (_dir, mut store) = open_temp();
        let first = result(4, 7, &[3, 5, 6, 7], SolutionStatus::Optimal);
        let mut second = first.clone();
        second.nodes_explored = 999;
        store.save_result(&first).unwrap();
        store.save_result(&second).unwrap();

        let results = store.results().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].nodes_explored, 999);
    }

    #[test]
    fn test_duplicate_optimal_sets_are_ignored() {
        let (_dir, mut store) = open_temp();
        store.save_optimal_sets(3, &[vec![1, 2, 4]]).unwrap();
        store
            .save_optimal_sets(3, &[vec![1, 2, 4], vec![2, 3, 4]])
            .unwrap();
        assert_eq!(
            store.optimal_sets(3).unwrap(),
            vec![vec![1, 2, 4], vec![2, 3, 4]]
        );
    }

    #[test]
    fn test_interrupted_results_do_not_seed_bounds() {
        let (_dir, mut store) = open_temp();
        store
            .save_result(&result(5, 0, &[], SolutionStatus::Interrupted))
            .unwrap();
        assert!(!store.has_optimal(5).unwrap());
        assert_eq!(store.best_bound(5).unwrap(), None);
        assert_eq!(store.last_solved_n().unwrap(), None);
    }

    #[test]
    fn test_stats() {
        let (_dir, mut store) = open_temp();
        store
            .save_result(&result(2, 2, &[1, 2], SolutionStatus::Optimal))
            .unwrap();
        store
            .save_result(&result(3, 4, &[1, 2, 4], SolutionStatus::Optimal))
            .unwrap();
        store
            .save_result(&result(5, 0, &[], SolutionStatus::Interrupted))
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_results, 3);
        assert_eq!(stats.optimal_results, 2);
        assert_eq!(stats.max_n_solved, 3);
        assert!((stats.total_computation_time - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            JsonStore::open(&path),
            Err(StoreError::Format { .. })
        ));
    }
}
