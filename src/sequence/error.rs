//! Custom sequence construction errors.

use crate::core::Direction;
use thiserror::Error;

/// Errors detected when building a custom phase sequence.
///
/// All validation happens eagerly at construction; a sequence that builds
/// successfully can never produce an intra-phase conflict at advance time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("phase list must not be empty. Provide at least one phase")]
    Empty,

    #[error("phase {phase} contains conflicting directions: {first} and {second}")]
    ConflictingPhase {
        phase: usize,
        first: Direction,
        second: Direction,
    },
}
