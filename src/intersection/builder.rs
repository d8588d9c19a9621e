//! Builder for constructing intersections.

use super::Intersection;
use crate::core::Direction;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur when building an intersection.
///
/// Construction problems are always detected at build time, never during
/// later light operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("intersection id is required and must not be blank. Call .id(...)")]
    MissingId,

    #[error("at least one direction must be configured. Call .direction(...)")]
    NoDirections,
}

/// Builder for [`Intersection`] with a fluent API.
///
/// # Example
///
/// ```rust
/// use crosslight::core::Direction;
/// use crosslight::intersection::IntersectionBuilder;
///
/// let intersection = IntersectionBuilder::new()
///     .id("main-and-first")
///     .name("Main St & 1st Ave")
///     .standard_four_way()
///     .build()
///     .unwrap();
///
/// assert_eq!(intersection.directions().len(), 4);
/// assert!(intersection.directions().contains(&Direction::North));
/// ```
#[derive(Default)]
pub struct IntersectionBuilder {
    id: Option<String>,
    name: Option<String>,
    directions: BTreeSet<Direction>,
}

impl IntersectionBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unique intersection id (required, non-blank).
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the display name. Defaults to a name derived from the id.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a single direction.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.directions.insert(direction);
        self
    }

    /// Add multiple directions at once.
    pub fn directions(mut self, directions: impl IntoIterator<Item = Direction>) -> Self {
        self.directions.extend(directions);
        self
    }

    /// Configure the standard four-way layout: north, south, east, west.
    pub fn standard_four_way(self) -> Self {
        self.directions([
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ])
    }

    /// Build the intersection.
    ///
    /// All lights start red, each with an initial history event.
    pub fn build(self) -> Result<Intersection, BuildError> {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(BuildError::MissingId),
        };
        if self.directions.is_empty() {
            return Err(BuildError::NoDirections);
        }
        let name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => format!("Intersection {id}"),
        };

        Ok(Intersection::from_parts(id, name, self.directions))
    }
}
