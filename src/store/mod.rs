// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Persistence of solved results.
//!
//! The search core never talks to a store directly: the runner queries it
//! for already-solved N values and bound seeds before a search, and writes
//! results back afterwards. Anything implementing [`ResultStore`] can back
//! this; [`JsonStore`] is the bundled single-file implementation.

pub mod json;

pub use json::JsonStore;

use crate::search::SolutionResult;
use std::path::PathBuf;
use thiserror::Error;

/// Store access errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file {path} is not valid JSON: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Aggregate statistics over a store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreStats {
    pub total_results: usize,
    pub optimal_results: usize,
    /// Largest N with an optimal result, 0 when none.
    pub max_n_solved: u32,
    /// Sum of computation times over all stored results, in seconds.
    pub total_computation_time: f64,
}

/// Durable record of solved (N -> best set) mappings.
///
/// Writers serialise externally (the runner holds the store behind a
/// mutex); implementations only need interior consistency.
pub trait ResultStore {
    /// Is an optimal result recorded for `n`?
    fn has_optimal(&self, n: u32) -> Result<bool, StoreError>;

    /// Smallest recorded max for `n`, usable as an initial bound seed.
    fn best_bound(&self, n: u32) -> Result<Option<u64>, StoreError>;

    /// Record a completed search. Results with the same (n, max, set) are
    /// replaced, not duplicated.
    fn save_result(&mut self, result: &SolutionResult) -> Result<(), StoreError>;

    /// Record the full list of optimal sets for `n`. Sets already recorded
    /// for `n` are kept; duplicates are ignored.
    fn save_optimal_sets(&mut self, n: u32, sets: &[Vec<u64>]) -> Result<(), StoreError>;

    /// Largest N with an optimal result, for resuming a range run.
    fn last_solved_n(&self) -> Result<Option<u32>, StoreError>;

    /// All stored results, ordered by N.
    fn results(&self) -> Result<Vec<SolutionResult>, StoreError>;

    /// All recorded optimal sets for `n`.
    fn optimal_sets(&self, n: u32) -> Result<Vec<Vec<u64>>, StoreError>;

    /// Aggregate statistics.
    fn stats(&self) -> Result<StoreStats, StoreError>;
}
