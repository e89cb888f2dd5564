// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Error types for the search layer.

use crate::sums::ManagerError;
use thiserror::Error;

/// Errors a search can report. The search itself never panics; everything
/// here is a usage error detectable before or during `try_push`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// The iterative manager enumerates subsets with a 64-bit mask, so the
    /// deepest push (on top of n-1 elements) requires n <= 63.
    #[error("n={0} is beyond the iterative manager's 64-bit mask limit (n <= 63)")]
    UnsupportedSize(u32),

    /// Usage error surfaced by the subset-sum manager.
    #[error(transparent)]
    Manager(#[from] ManagerError),
}
