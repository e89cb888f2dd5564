// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Worker pool farming independent N values across threads.
//!
//! Each N is an independent search with its own solver and manager, so the
//! only shared state is the store (behind a mutex, written once per
//! completed search) and the stop flag. Workers pull the next N from an
//! atomic cursor; there is no ordering guarantee across workers.

use crate::search::{
    default_bound, SolutionResult, SolutionStatus, Solver, SolverConfig, SolverError,
    DEFAULT_LOG_INTERVAL,
};
use crate::sums::ManagerKind;
use crate::store::{ResultStore, StoreError};
use log::info;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// Options shared by every search a run performs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub find_all_optimal: bool,
    pub first_only: bool,
    /// Requested manager kind; individual searches still downgrade at
    /// [`FAST_MODE_LIMIT`](crate::search::FAST_MODE_LIMIT).
    pub manager_kind: ManagerKind,
    /// Explicit initial bound; 0 means default, possibly tightened from
    /// the store.
    pub initial_bound: u64,
    pub log_interval: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            find_all_optimal: false,
            first_only: false,
            manager_kind: ManagerKind::Fast,
            initial_bound: 0,
            log_interval: DEFAULT_LOG_INTERVAL,
        }
    }
}

/// Errors surfaced by a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn lock<S>(store: &Mutex<S>) -> std::sync::MutexGuard<'_, S> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Solve a single N: skip if already solved, seed the bound from the
/// store, search, persist an optimal outcome.
///
/// Returns `None` when the store already holds an optimal result for `n`.
pub fn run_single<S: ResultStore>(
    n: u32,
    store: &Mutex<S>,
    options: &RunOptions,
    stop_flag: &Arc<AtomicBool>,
) -> Result<Option<SolutionResult>, RunnerError> {
    if lock(store).has_optimal(n)? {
        info!("N={n} already solved, skipping");
        return Ok(None);
    }

    let mut config = SolverConfig::new(n);
    config.find_all_optimal = options.find_all_optimal;
    config.first_only = options.first_only;
    config.manager_kind = options.manager_kind;
    config.log_interval = options.log_interval;
    config.stop_flag = Arc::clone(stop_flag);
    config.initial_bound = options.initial_bound;
    if config.initial_bound == 0 {
        if let Some(bound) = lock(store).best_bound(n)? {
            if bound < default_bound(n) {
                info!("N={n}: seeding bound {bound} from store");
                config.initial_bound = bound;
            }
        }
    }

    let mut solver = Solver::new(config)?;
    let (result, optimal_sets) = if options.find_all_optimal {
        let (result, sets) = solver.solve_all()?;
        (result, Some(sets))
    } else {
        (solver.solve()?, None)
    };

    if result.status == SolutionStatus::Optimal {
        let mut store = lock(store);
        store.save_result(&result)?;
        if let Some(sets) = &optimal_sets {
            if !sets.is_empty() {
                store.save_optimal_sets(n, sets)?;
            }
        }
    }
    Ok(Some(result))
}

/// Solve every N in `start..=max` across `workers` threads.
///
/// `start == 0` resumes after the last solved N in the store. Returns the
/// first error any worker hit; the stop flag aborts all workers
/// cooperatively.
pub fn run_range<S: ResultStore + Send>(
    start: u32,
    max: u32,
    workers: u32,
    store: &Mutex<S>,
    options: &RunOptions,
    stop_flag: &Arc<AtomicBool>,
) -> Result<(), RunnerError> {
    let start = if start == 0 {
        lock(store).last_solved_n()?.map_or(1, |n| n + 1)
    } else {
        start
    };
    let workers = workers.max(1);
    info!("Solving N={start}..={max} across {workers} workers");

    let cursor = AtomicU32::new(start);
    let outcome = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers as usize);
        for _ in 0..workers {
            handles.push(scope.spawn(|| -> Result<(), RunnerError> {
                loop {
                    if stop_flag.load(Ordering::Acquire) {
                        return Ok(());
                    }
                    let n = cursor.fetch_add(1, Ordering::Relaxed);
                    if n > max {
                        return Ok(());
                    }
                    run_single(n, store, options, stop_flag)?;
                }
            }));
        }
        let mut outcome = Ok(());
        for handle in handles {
            let joined = handle.join().expect("worker thread panicked");
            if outcome.is_ok() {
                outcome = joined;
            }
        }
        outcome
    });

    if stop_flag.load(Ordering::Acquire) {
        info!("Run interrupted");
    } else if outcome.is_ok() {
        info!("All searches in N={start}..={max} complete");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonStore;

    fn temp_store() -> (tempfile::TempDir, Mutex<JsonStore>) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::open(dir.path().join("results.json")).expect("open");
        (dir, Mutex::new(store))
    }

    #[test]
    fn test_run_single_persists_optimal() {
        let (_dir, store) = temp_store();
        let stop = Arc::new(AtomicBool::new(false));
        let result = run_single(4, &store, &RunOptions::default(), &stop)
            .unwrap()
            .expect("not yet solved");
        assert_eq!(result.max_value, 7);

        let guard = lock(&store);
        assert!(guard.has_optimal(4).unwrap());
        assert_eq!(guard.best_bound(4).unwrap(), Some(7));
    }

    #[test]
    fn test_run_single_skips_solved() {
        let (_dir, store) = temp_store();
        let stop = Arc::new(AtomicBool::new(false));
        let options = RunOptions::default();
        assert!(run_single(3, &store, &options, &stop).unwrap().is_some());
        assert!(run_single(3, &store, &options, &stop).unwrap().is_none());
    }

    #[test]
    fn test_run_single_saves_all_optima() {
        let (_dir, store) = temp_store();
        let stop = Arc::new(AtomicBool::new(false));
        let options = RunOptions {
            find_all_optimal: true,
            ..RunOptions::default()
        };
        run_single(3, &store, &options, &stop).unwrap();
        assert_eq!(
            lock(&store).optimal_sets(3).unwrap(),
            vec![vec![1, 2, 4], vec![2, 3, 4]]
        );
    }

    #[test]
    fn test_run_range_solves_every_n() {
        let (_dir, store) = temp_store();
        let stop = Arc::new(AtomicBool::new(false));
        run_range(1, 5, 2, &store, &RunOptions::default(), &stop).unwrap();

        let guard = lock(&store);
        for n in 1..=5 {
            assert!(guard.has_optimal(n).unwrap(), "N={n} missing");
        }
        assert_eq!(guard.last_solved_n().unwrap(), Some(5));
    }

    #[test]
    fn test_run_range_resumes_after_last_solved() {
        let (_dir, store) = temp_store();
        let stop = Arc::new(AtomicBool::new(false));
        let options = RunOptions::default();
        run_range(1, 3, 1, &store, &options, &stop).unwrap();
        // start=0 resumes at 4; 1..=3 are not re-run (they would be
        // skipped anyway, but the cursor must start past them).
        run_range(0, 5, 1, &store, &options, &stop).unwrap();
        assert_eq!(lock(&store).last_solved_n().unwrap(), Some(5));
    }

    #[test]
    fn test_run_range_honours_stop_flag() {
        let (_dir, store) = temp_store();
        let stop = Arc::new(AtomicBool::new(true));
        run_range(1, 3, 2, &store, &RunOptions::default(), &stop).unwrap();
        assert_eq!(lock(&store).last_solved_n().unwrap(), None);
    }
}
