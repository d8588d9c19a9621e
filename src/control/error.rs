//! Control-layer errors.

use crate::intersection::{BuildError, IntersectionError};
use thiserror::Error;

/// Errors surfaced by the controller facade and the phase orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// No intersection registered under the given id.
    #[error("intersection not found: {id}")]
    UnknownIntersection { id: String },

    /// An intersection with this id is already registered.
    #[error("intersection with id '{id}' already exists")]
    DuplicateIntersection { id: String },

    /// An underlying intersection operation failed.
    #[error(transparent)]
    Intersection(#[from] IntersectionError),

    /// Intersection construction failed.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// A graduated phase transition was cancelled before completing.
    ///
    /// The intersection is left conflict-safe: vacating directions are moved
    /// from yellow to red on a best-effort basis before this is reported.
    #[error("phase transition cancelled before completion")]
    TransitionCancelled,

    /// A graduated phase transition task failed before its red step.
    #[error("phase transition interrupted before completion")]
    TransitionInterrupted,
}
