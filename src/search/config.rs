// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Solver configuration.

use crate::sums::ManagerKind;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Element counts from this size up force the iterative manager; the fast
/// manager's O(2^n) sum storage is no longer practical.
pub const FAST_MODE_LIMIT: u32 = 25;

/// Default interval between progress log lines.
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Everything a single search needs from the outside world.
///
/// The stop flag is the only shared state: the caller keeps a clone of the
/// `Arc` and stores `true` (release ordering) to request cooperative
/// cancellation. Bound seeding from a persistence layer happens here too:
/// the caller writes the stored bound into `initial_bound` instead of the
/// search talking to a store.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Size of the sought set.
    pub n: u32,
    /// Initial exclusive upper bound on candidates; 0 means use
    /// [`default_bound`].
    pub initial_bound: u64,
    /// Collect every optimal set, not just one witness.
    pub find_all_optimal: bool,
    /// Return as soon as the first complete set is found.
    pub first_only: bool,
    /// Requested manager kind. Searches with `n >=` [`FAST_MODE_LIMIT`]
    /// are downgraded to iterative regardless.
    pub manager_kind: ManagerKind,
    /// Minimum interval between progress log lines.
    pub log_interval: Duration,
    /// Cooperative cancellation flag shared with the caller.
    pub stop_flag: Arc<AtomicBool>,
}

impl SolverConfig {
    /// Configuration with defaults: automatic bound, fast manager, single
    /// witness, fresh (never-set) stop flag.
    pub fn new(n: u32) -> Self {
        Self {
            n,
            initial_bound: 0,
            find_all_optimal: false,
            first_only: false,
            manager_kind: ManagerKind::Fast,
            log_interval: DEFAULT_LOG_INTERVAL,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Default exclusive upper bound for a size-`n` search: `2^(n-1) + 1`
/// (the powers of two 1, 2, …, 2^(n-1) are always a valid completion), `1`
/// for `n = 0`. Saturates at `u64::MAX` when the shift would overflow.
pub fn default_bound(n: u32) -> u64 {
    if n == 0 {
        return 1;
    }
    match 1u64.checked_shl(n - 1) {
        Some(pow) => pow + 1,
        None => u64::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bound_small() {
        assert_eq!(default_bound(0), 1);
        assert_eq!(default_bound(1), 2);
        assert_eq!(default_bound(2), 3);
        assert_eq!(default_bound(5), 17);
        assert_eq!(default_bound(10), 513);
    }

    #[test]
    fn test_default_bound_saturates() {
        assert_eq!(default_bound(64), (1u64 << 63) + 1);
        assert_eq!(default_bound(65), u64::MAX);
        assert_eq!(default_bound(u32::MAX), u64::MAX);
    }
}
