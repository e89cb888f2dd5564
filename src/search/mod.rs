// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Branch-and-bound search for minimal sum-distinct sets.
//!
//! The solver enumerates strictly increasing sequences of positive
//! integers, using a [`SumManager`] as the collision oracle: a candidate is
//! extended only if `try_push` accepts it, and every acceptance is undone
//! with `pop` when the subtree is exhausted. Because the oracle's rollback
//! is exact, the search needs no state of its own beyond the best solution
//! found so far.
//!
//! The bound is dynamic: before the first complete set, candidates are
//! limited by the configured initial bound; afterwards by the best maximum
//! found, which only shrinks. Two prunes cut subtrees that cannot beat it:
//!
//! - **P1**: the cheapest completion from a node takes consecutive integers
//!   `min_next, min_next+1, …`, so `min_next + remaining >= best_max` means
//!   no improvement below this node.
//! - **P2**: the same test applied per candidate inside the enumeration
//!   loop; once it trips, all larger candidates trip too, so the loop
//!   breaks.
//!
//! Cancellation is cooperative via the shared stop flag, checked at every
//! node and every candidate. The search unwinds normally (every push is
//! popped), so the manager is reusable afterwards.

pub mod config;
pub mod errors;
pub mod result;

pub use config::{default_bound, SolverConfig, DEFAULT_LOG_INTERVAL, FAST_MODE_LIMIT};
pub use errors::SolverError;
pub use result::{format_set, SearchStats, SolutionResult, SolutionStatus};

use crate::sums::{ManagerKind, SumManager, MAX_ITERATIVE_ELEMENTS};
use log::{info, warn};
use std::sync::atomic::Ordering;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Node count after which progress checks become sparser.
const PROGRESS_NODES_THRESHOLD: u64 = 100_000;
/// Progress check every 1024 nodes, early in the search.
const PROGRESS_MASK_EARLY: u64 = 0x3FF;
/// Progress check every 65 536 nodes, once the search is hot.
const PROGRESS_MASK_LATE: u64 = 0xFFFF;

type SolutionCallback = Box<dyn FnMut(u32, u64, &[u64])>;
type ProgressCallback = Box<dyn FnMut(&SearchStats)>;

/// Depth-first branch-and-bound solver for one value of N.
pub struct Solver {
    config: SolverConfig,
    /// Resolved exclusive upper bound (config value or the default).
    initial_bound: u64,
    manager: SumManager,
    best_max: u64,
    best_solution: Vec<u64>,
    has_solution: bool,
    /// Every optimal set, in discovery (lexicographic) order. Only filled
    /// when `find_all_optimal` is set.
    optimal: Vec<Vec<u64>>,
    stats: SearchStats,
    solution_callback: Option<SolutionCallback>,
    progress_callback: Option<ProgressCallback>,
}

impl Solver {
    /// Build a solver for `config`.
    ///
    /// Requests for the fast manager at `n >= FAST_MODE_LIMIT` are
    /// downgraded to iterative with a warning. Iterative searches beyond
    /// the 64-bit mask limit are refused.
    pub fn new(config: SolverConfig) -> Result<Self, SolverError> {
        let mut kind = config.manager_kind;
        if kind == ManagerKind::Fast && config.n >= FAST_MODE_LIMIT {
            warn!(
                "N={} is too large for the fast manager, switching to iterative",
                config.n
            );
            kind = ManagerKind::Iterative;
        }
        if kind == ManagerKind::Iterative && config.n as usize > MAX_ITERATIVE_ELEMENTS + 1 {
            return Err(SolverError::UnsupportedSize(config.n));
        }
        let initial_bound = if config.initial_bound == 0 {
            default_bound(config.n)
        } else {
            config.initial_bound
        };
        Ok(Self {
            manager: SumManager::new(kind),
            initial_bound,
            best_max: initial_bound,
            best_solution: Vec::new(),
            has_solution: false,
            optimal: Vec::new(),
            stats: SearchStats::new(),
            solution_callback: None,
            progress_callback: None,
            config,
        })
    }

    /// Install a callback invoked for every strictly improving completion
    /// (and for the N=1 special case).
    pub fn on_solution(&mut self, callback: impl FnMut(u32, u64, &[u64]) + 'static) {
        self.solution_callback = Some(Box::new(callback));
    }

    /// Install a callback invoked with a stats snapshot at every mask-gated
    /// progress check.
    pub fn on_progress(&mut self, callback: impl FnMut(&SearchStats) + 'static) {
        self.progress_callback = Some(Box::new(callback));
    }

    /// Manager kind actually in use (after any downgrade).
    pub fn manager_kind(&self) -> ManagerKind {
        self.manager.kind()
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Optimal sets collected by the last `solve_all` run.
    pub fn optimal_sets(&self) -> &[Vec<u64>] {
        &self.optimal
    }

    /// Search for one optimal set.
    pub fn solve(&mut self) -> Result<SolutionResult, SolverError> {
        self.manager.reset();
        self.best_solution.clear();
        self.optimal.clear();
        self.has_solution = false;
        self.stats = SearchStats::new();
        self.best_max = self.initial_bound;
        self.stats.best_max = self.initial_bound;

        info!(
            "Starting N={}, upper bound {}",
            self.config.n, self.initial_bound
        );
        let started = Instant::now();

        if self.config.n == 1 {
            self.record_single_element();
        } else {
            self.expand(0, 1)?;
        }

        let elapsed = started.elapsed().as_secs_f64();
        let status = if self.has_solution {
            SolutionStatus::Optimal
        } else if self.stopped() {
            SolutionStatus::Interrupted
        } else {
            SolutionStatus::NoSolution
        };
        let result = SolutionResult {
            n: self.config.n,
            max_value: if self.has_solution { self.best_max } else { 0 },
            set: if self.has_solution {
                self.best_solution.clone()
            } else {
                Vec::new()
            },
            computation_time: elapsed,
            status,
            nodes_explored: self.stats.nodes_explored,
            timestamp: unix_now(),
        };
        match status {
            SolutionStatus::Optimal => info!(
                "Finished N={}, max={}, nodes={}, time={:.2}s",
                result.n, result.max_value, result.nodes_explored, elapsed
            ),
            SolutionStatus::Interrupted => info!(
                "Interrupted N={}, nodes={}, time={:.2}s",
                result.n, result.nodes_explored, elapsed
            ),
            SolutionStatus::NoSolution => info!(
                "No solution for N={}, nodes={}, time={:.2}s",
                result.n, result.nodes_explored, elapsed
            ),
        }
        Ok(result)
    }

    /// Search for every optimal set. Returns the result record together
    /// with all optima, in lexicographic discovery order, each exactly
    /// once.
    pub fn solve_all(&mut self) -> Result<(SolutionResult, Vec<Vec<u64>>), SolverError> {
        self.config.find_all_optimal = true;
        let result = self.solve()?;
        info!(
            "Found {} optimal sets for N={}",
            self.optimal.len(),
            self.config.n
        );
        Ok((result, self.optimal.clone()))
    }

    #[inline]
    fn stopped(&self) -> bool {
        self.config.stop_flag.load(Ordering::Acquire)
    }

    /// Can a completion whose maximum is at least `value` still matter?
    ///
    /// First-improvement mode only cares about strict improvements, so
    /// `value >= best_max` is hopeless. Enumerate-all mode must also reach
    /// every completion that ties best_max, so only `value > best_max` is.
    #[inline]
    fn beyond_best(&self, value: u64) -> bool {
        if self.config.find_all_optimal {
            value > self.best_max
        } else {
            value >= self.best_max
        }
    }

    /// Recursive enumeration of candidates at `depth`, all `>= min_next`.
    fn expand(&mut self, depth: u32, min_next: u64) -> Result<(), SolverError> {
        if self.stopped() {
            return Ok(());
        }

        self.stats.nodes_explored += 1;
        self.stats.current_depth = depth;
        let mask = if self.stats.nodes_explored > PROGRESS_NODES_THRESHOLD {
            PROGRESS_MASK_LATE
        } else {
            PROGRESS_MASK_EARLY
        };
        if self.stats.nodes_explored & mask == 0 {
            self.check_progress();
        }

        if depth == self.config.n {
            self.record_completion();
            return Ok(());
        }

        // P1: the cheapest completion uses consecutive integers from
        // min_next, so its maximum is min_next + remaining. When collecting
        // every optimum, subtrees that can still tie best_max must survive,
        // so the cutoff is strict there.
        let remaining = u64::from(self.config.n - depth - 1);
        if self.has_solution && self.beyond_best(min_next.saturating_add(remaining)) {
            return Ok(());
        }

        let mut candidate = min_next;
        loop {
            if self.stopped() {
                return Ok(());
            }
            // Dynamic upper bound: best_max once a set is known, the
            // initial bound before that.
            if self.has_solution {
                if self.beyond_best(candidate) {
                    break;
                }
            } else if candidate >= self.initial_bound {
                break;
            }
            // P2: this and every larger candidate already forces a maximum
            // of at least candidate + remaining.
            if self.has_solution && self.beyond_best(candidate.saturating_add(remaining)) {
                break;
            }

            if self.manager.try_push(candidate)? {
                self.expand(depth + 1, candidate + 1)?;
                self.manager.pop();
                if self.config.first_only && self.has_solution {
                    return Ok(());
                }
            }
            candidate += 1;
        }
        Ok(())
    }

    /// Depth reached N: compare the completed set against the best.
    fn record_completion(&mut self) {
        let current_max = self.manager.elements().iter().copied().max().unwrap_or(0);
        if !self.config.find_all_optimal {
            if current_max < self.best_max {
                self.save_best(current_max);
            }
        } else if !self.has_solution || current_max < self.best_max {
            self.optimal.clear();
            self.save_best(current_max);
            self.push_optimal();
        } else if current_max == self.best_max {
            self.push_optimal();
            self.stats.solutions_found += 1;
            if let Some(callback) = self.solution_callback.as_mut() {
                callback(self.config.n, current_max, self.manager.elements());
            }
            if self.optimal.len() <= 10 {
                info!(
                    "Found another optimal: N={}, total={}",
                    self.config.n,
                    self.optimal.len()
                );
            }
        }
    }

    fn save_best(&mut self, current_max: u64) {
        self.best_solution.clear();
        self.best_solution.extend_from_slice(self.manager.elements());
        self.best_max = current_max;
        self.has_solution = true;
        self.stats.best_max = current_max;
        self.stats.solutions_found += 1;
        if let Some(callback) = self.solution_callback.as_mut() {
            callback(self.config.n, current_max, &self.best_solution);
        }
        info!("Found better: N={}, max={}", self.config.n, current_max);
    }

    fn push_optimal(&mut self) {
        self.optimal.push(self.manager.elements().to_vec());
    }

    /// N=1 has the unique optimum {1}; no recursion needed.
    fn record_single_element(&mut self) {
        self.best_solution = vec![1];
        self.best_max = 1;
        self.has_solution = true;
        self.stats.best_max = 1;
        self.stats.solutions_found = 1;
        if self.config.find_all_optimal {
            self.optimal.push(vec![1]);
        }
        if let Some(callback) = self.solution_callback.as_mut() {
            callback(self.config.n, 1, &self.best_solution);
        }
        info!("Found better: N=1, max=1");
    }

    fn check_progress(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.stats.last_log_time) >= self.config.log_interval {
            self.stats.last_log_time = now;
            let elapsed = now.duration_since(self.stats.start_time).as_secs_f64();
            info!(
                "N={}: nodes={}, time={:.1}s, depth={}, best={}",
                self.config.n,
                self.stats.nodes_explored,
                elapsed,
                self.stats.current_depth,
                self.stats.best_max
            );
        }
        if let Some(callback) = self.progress_callback.as_mut() {
            callback(&self.stats);
        }
    }
}

/// Does `values`, pushed in order, form a set with pairwise-distinct
/// non-empty subset sums?
pub fn is_valid_sidon_set(values: &[u64]) -> bool {
    let mut manager = SumManager::new(ManagerKind::Fast);
    values
        .iter()
        .all(|&v| matches!(manager.try_push(v), Ok(true)))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
