//! Traffic directions and the lane conflict relation.
//!
//! Directions are grouped into lanes; two directions conflict exactly when
//! their lanes are mutually exclusive. The relation is fixed at design time:
//! straight lanes conflict with the perpendicular axis and with that axis's
//! protected turns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A traffic-flow approach at an intersection.
///
/// Each direction belongs to exactly one [`Lane`], which determines which
/// other directions it may safely share a green light with.
///
/// # Example
///
/// ```rust
/// use crosslight::core::Direction;
///
/// assert!(Direction::North.conflicts_with(Direction::East));
/// assert!(!Direction::North.conflicts_with(Direction::South));
/// // A direction never conflicts with itself.
/// assert!(!Direction::East.conflicts_with(Direction::East));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthLeftTurn,
    SouthLeftTurn,
    EastLeftTurn,
    WestLeftTurn,
}

impl Direction {
    /// All directions, in declaration order.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthLeftTurn,
        Direction::SouthLeftTurn,
        Direction::EastLeftTurn,
        Direction::WestLeftTurn,
    ];

    /// The lane this direction belongs to.
    pub fn lane(&self) -> Lane {
        match self {
            Direction::North | Direction::South => Lane::NorthSouth,
            Direction::East | Direction::West => Lane::EastWest,
            Direction::NorthLeftTurn | Direction::SouthLeftTurn => Lane::NorthSouthLeft,
            Direction::EastLeftTurn | Direction::WestLeftTurn => Lane::EastWestLeft,
        }
    }

    /// Check whether this direction conflicts with another (pure).
    ///
    /// Conflicting directions must never both show green. The relation is
    /// symmetric and never reflexive.
    pub fn conflicts_with(&self, other: Direction) -> bool {
        if *self == other {
            return false;
        }
        self.lane().conflicting_lanes().contains(&other.lane())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "North",
            Direction::South => "South",
            Direction::East => "East",
            Direction::West => "West",
            Direction::NorthLeftTurn => "NorthLeftTurn",
            Direction::SouthLeftTurn => "SouthLeftTurn",
            Direction::EastLeftTurn => "EastLeftTurn",
            Direction::WestLeftTurn => "WestLeftTurn",
        };
        write!(f, "{name}")
    }
}

/// A group of directions that can safely show green together.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Lane {
    NorthSouth,
    EastWest,
    NorthSouthLeft,
    EastWestLeft,
}

impl Lane {
    /// The lanes that conflict with this lane.
    pub fn conflicting_lanes(&self) -> &'static [Lane] {
        match self {
            Lane::NorthSouth => &[Lane::EastWest, Lane::EastWestLeft],
            Lane::EastWest => &[Lane::NorthSouth, Lane::NorthSouthLeft],
            Lane::NorthSouthLeft => &[Lane::EastWest, Lane::EastWestLeft],
            Lane::EastWestLeft => &[Lane::NorthSouth, Lane::NorthSouthLeft],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_lane_never_conflicts() {
        assert!(!Direction::North.conflicts_with(Direction::South));
        assert!(!Direction::East.conflicts_with(Direction::West));
        assert!(!Direction::NorthLeftTurn.conflicts_with(Direction::SouthLeftTurn));
    }

    #[test]
    fn perpendicular_axes_conflict() {
        assert!(Direction::North.conflicts_with(Direction::East));
        assert!(Direction::South.conflicts_with(Direction::West));
        assert!(Direction::West.conflicts_with(Direction::North));
    }

    #[test]
    fn straight_conflicts_with_perpendicular_turns() {
        assert!(Direction::North.conflicts_with(Direction::EastLeftTurn));
        assert!(Direction::East.conflicts_with(Direction::SouthLeftTurn));
    }

    #[test]
    fn straight_does_not_conflict_with_parallel_turns() {
        assert!(!Direction::North.conflicts_with(Direction::NorthLeftTurn));
        assert!(!Direction::East.conflicts_with(Direction::WestLeftTurn));
    }

    #[test]
    fn conflict_relation_is_symmetric_and_irreflexive() {
        for a in Direction::ALL {
            assert!(!a.conflicts_with(a));
            for b in Direction::ALL {
                assert_eq!(a.conflicts_with(b), b.conflicts_with(a));
            }
        }
    }
}
