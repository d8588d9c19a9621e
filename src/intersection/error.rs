//! Intersection operation errors.

use crate::core::Direction;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors returned by intersection light operations.
///
/// All variants are caller errors surfaced synchronously; none are retried
/// internally and none leave the intersection partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntersectionError {
    /// The operation referenced a direction this intersection does not have.
    #[error("direction not configured at this intersection: {direction}")]
    UnknownDirection { direction: Direction },

    /// The intersection is paused; resume before mutating light state.
    #[error("intersection is paused")]
    Paused,

    /// The requested configuration would put conflicting directions at green.
    ///
    /// Carries the full set of mutually conflicting directions. The caller
    /// must choose a non-conflicting configuration; the core never resolves
    /// conflicts on its own.
    #[error("conflicting directions cannot be green simultaneously: {directions:?}")]
    Conflict { directions: BTreeSet<Direction> },
}
