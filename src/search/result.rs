// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Result and statistics records surfaced by a search.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use strum::{Display, EnumString};

/// Terminal state of a search.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SolutionStatus {
    /// A best set was found; it is optimal within the explored bound.
    Optimal,
    /// The bound admitted no complete set.
    NoSolution,
    /// The stop flag was raised before any complete set was found.
    Interrupted,
}

/// Outcome of one completed (or aborted) search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionResult {
    /// Size of the sought set.
    pub n: u32,
    /// Largest element of the best set, 0 when none was found.
    pub max_value: u64,
    /// The best set in increasing order, empty when none was found.
    pub set: Vec<u64>,
    /// Wall-clock search time in seconds.
    pub computation_time: f64,
    pub status: SolutionStatus,
    /// Search-tree nodes explored.
    pub nodes_explored: u64,
    /// Completion time, seconds since the Unix epoch.
    pub timestamp: u64,
}

/// Live search counters, snapshotted to the progress callback.
#[derive(Debug, Clone, Copy)]
pub struct SearchStats {
    pub nodes_explored: u64,
    pub current_depth: u32,
    /// Current best maximum (the initial bound until a set is found).
    pub best_max: u64,
    pub solutions_found: u32,
    pub start_time: Instant,
    pub last_log_time: Instant,
}

impl SearchStats {
    pub(crate) fn new() -> Self {
        let now = Instant::now();
        Self {
            nodes_explored: 0,
            current_depth: 0,
            best_max: 0,
            solutions_found: 0,
            start_time: now,
            last_log_time: now,
        }
    }
}

/// Render a set as `{a, b, c}` for logs and the CLI.
pub fn format_set(values: &[u64]) -> String {
    let mut out = String::from("{");
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&v.to_string());
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trips_as_screaming_snake() {
        assert_eq!(SolutionStatus::Optimal.to_string(), "OPTIMAL");
        assert_eq!(SolutionStatus::NoSolution.to_string(), "NO_SOLUTION");
        assert_eq!(SolutionStatus::Interrupted.to_string(), "INTERRUPTED");
        assert_eq!(
            SolutionStatus::from_str("NO_SOLUTION").unwrap(),
            SolutionStatus::NoSolution
        );
    }

    #[test]
    fn test_result_serde_round_trip() {
        let result = SolutionResult {
            n: 3,
            max_value: 4,
            set: vec![1, 2, 4],
            computation_time: 0.25,
            status: SolutionStatus::Optimal,
            nodes_explored: 17,
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"OPTIMAL\""));
        let back: SolutionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_format_set() {
        assert_eq!(format_set(&[]), "{}");
        assert_eq!(format_set(&[1, 2, 4]), "{1, 2, 4}");
    }
}
