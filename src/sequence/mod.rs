//! Phase sequencers for automated signal cycles.
//!
//! A sequencer is a stateful cursor over an ordered cycle of phases. Each
//! [`LightSequence::advance_phase`] call computes the next full light
//! configuration for an intersection and applies it through the
//! intersection's atomic batch update, so the sequencer itself never performs
//! conflict detection. The cursor advances exactly once per call, modulo the
//! cycle length, whether or not the batch is accepted.

mod error;

pub use error::SequenceError;

use crate::core::{Direction, LightState, StateChangeEvent};
use crate::intersection::{Intersection, IntersectionError};
use std::collections::{BTreeMap, BTreeSet};

/// Capability to advance an intersection through a phase cycle.
pub trait LightSequence {
    /// Apply the next phase of the cycle to `intersection`.
    ///
    /// Returns the events produced by the applied batch; an empty list means
    /// the step had nothing to do for this intersection's direction set.
    fn advance_phase(
        &mut self,
        intersection: &Intersection,
    ) -> Result<Vec<StateChangeEvent>, IntersectionError>;
}

/// Simple two-phase cycle: north-south green, then east-west green.
///
/// Four steps per cycle: NS green / NS yellow / EW green / EW yellow. Axis
/// membership is derived from the intersection's configured directions;
/// steps touching an absent axis contribute nothing.
pub fn two_phase() -> TwoPhaseSequence {
    TwoPhaseSequence { cursor: 0 }
}

/// Four-phase cycle with protected left turns.
///
/// Eight steps: straight green/yellow and turn green/yellow for each axis in
/// turn. Every step resets all unmentioned configured directions to red.
pub fn four_phase_with_protected_turns() -> FourPhaseSequence {
    FourPhaseSequence { cursor: 0 }
}

/// Custom cycle from a caller-supplied phase list.
///
/// Each phase names the directions that should show green; all other
/// configured directions go red. Construction fails eagerly if the list is
/// empty or any single phase contains two conflicting directions.
///
/// # Example
///
/// ```rust
/// use crosslight::core::Direction;
/// use crosslight::sequence::{custom, SequenceError};
/// use std::collections::BTreeSet;
///
/// let ns: BTreeSet<_> = [Direction::North, Direction::South].into_iter().collect();
/// let ew: BTreeSet<_> = [Direction::East, Direction::West].into_iter().collect();
/// assert!(custom(vec![ns, ew]).is_ok());
///
/// let bad: BTreeSet<_> = [Direction::North, Direction::East].into_iter().collect();
/// assert!(matches!(
///     custom(vec![bad]),
///     Err(SequenceError::ConflictingPhase { .. })
/// ));
/// ```
pub fn custom(phases: Vec<BTreeSet<Direction>>) -> Result<CustomSequence, SequenceError> {
    CustomSequence::new(phases)
}

fn set_if_present(
    states: &mut BTreeMap<Direction, LightState>,
    configured: &BTreeSet<Direction>,
    direction: Direction,
    state: LightState,
) {
    if configured.contains(&direction) {
        states.insert(direction, state);
    }
}

/// Two-phase sequencer state. Built by [`two_phase`].
pub struct TwoPhaseSequence {
    cursor: usize,
}

impl TwoPhaseSequence {
    const STEPS: usize = 4;
}

impl LightSequence for TwoPhaseSequence {
    fn advance_phase(
        &mut self,
        intersection: &Intersection,
    ) -> Result<Vec<StateChangeEvent>, IntersectionError> {
        let step = self.cursor;
        self.cursor = (self.cursor + 1) % Self::STEPS;

        let configured = intersection.directions();
        let has_ns =
            configured.contains(&Direction::North) || configured.contains(&Direction::South);
        let has_ew =
            configured.contains(&Direction::East) || configured.contains(&Direction::West);

        let mut states = BTreeMap::new();
        match step {
            0 => {
                if has_ns {
                    set_if_present(&mut states, configured, Direction::North, LightState::Green);
                    set_if_present(&mut states, configured, Direction::South, LightState::Green);
                }
                if has_ew {
                    set_if_present(&mut states, configured, Direction::East, LightState::Red);
                    set_if_present(&mut states, configured, Direction::West, LightState::Red);
                }
            }
            1 => {
                if has_ns {
                    set_if_present(&mut states, configured, Direction::North, LightState::Yellow);
                    set_if_present(&mut states, configured, Direction::South, LightState::Yellow);
                }
            }
            2 => {
                if has_ns {
                    set_if_present(&mut states, configured, Direction::North, LightState::Red);
                    set_if_present(&mut states, configured, Direction::South, LightState::Red);
                }
                if has_ew {
                    set_if_present(&mut states, configured, Direction::East, LightState::Green);
                    set_if_present(&mut states, configured, Direction::West, LightState::Green);
                }
            }
            _ => {
                if has_ew {
                    set_if_present(&mut states, configured, Direction::East, LightState::Yellow);
                    set_if_present(&mut states, configured, Direction::West, LightState::Yellow);
                }
            }
        }

        if states.is_empty() {
            return Ok(Vec::new());
        }
        intersection.set_light_states(&states)
    }
}

/// Four-phase protected-turn sequencer state. Built by
/// [`four_phase_with_protected_turns`].
pub struct FourPhaseSequence {
    cursor: usize,
}

impl FourPhaseSequence {
    // 4 phases, each with a green and a yellow step
    const STEPS: usize = 8;

    fn step_directions(step: usize) -> ([Direction; 2], LightState) {
        match step {
            0 => ([Direction::North, Direction::South], LightState::Green),
            1 => ([Direction::North, Direction::South], LightState::Yellow),
            2 => (
                [Direction::NorthLeftTurn, Direction::SouthLeftTurn],
                LightState::Green,
            ),
            3 => (
                [Direction::NorthLeftTurn, Direction::SouthLeftTurn],
                LightState::Yellow,
            ),
            4 => ([Direction::East, Direction::West], LightState::Green),
            5 => ([Direction::East, Direction::West], LightState::Yellow),
            6 => (
                [Direction::EastLeftTurn, Direction::WestLeftTurn],
                LightState::Green,
            ),
            _ => (
                [Direction::EastLeftTurn, Direction::WestLeftTurn],
                LightState::Yellow,
            ),
        }
    }
}

impl LightSequence for FourPhaseSequence {
    fn advance_phase(
        &mut self,
        intersection: &Intersection,
    ) -> Result<Vec<StateChangeEvent>, IntersectionError> {
        let step = self.cursor;
        self.cursor = (self.cursor + 1) % Self::STEPS;

        let configured = intersection.directions();

        // Reset everything to red, then overlay this step's pair.
        let mut states: BTreeMap<Direction, LightState> = configured
            .iter()
            .map(|&direction| (direction, LightState::Red))
            .collect();
        let (pair, state) = Self::step_directions(step);
        for direction in pair {
            set_if_present(&mut states, configured, direction, state);
        }

        intersection.set_light_states(&states)
    }
}

/// User-defined phase cycle. Built by [`custom`].
#[derive(Debug)]
pub struct CustomSequence {
    phases: Vec<BTreeSet<Direction>>,
    cursor: usize,
}

impl CustomSequence {
    fn new(phases: Vec<BTreeSet<Direction>>) -> Result<Self, SequenceError> {
        if phases.is_empty() {
            return Err(SequenceError::Empty);
        }
        for (index, phase) in phases.iter().enumerate() {
            Self::validate_phase(index, phase)?;
        }
        Ok(Self { phases, cursor: 0 })
    }

    /// Pairwise conflict check, independent of any intersection.
    fn validate_phase(index: usize, phase: &BTreeSet<Direction>) -> Result<(), SequenceError> {
        let directions: Vec<Direction> = phase.iter().copied().collect();
        for (i, &a) in directions.iter().enumerate() {
            for &b in &directions[i + 1..] {
                if a.conflicts_with(b) {
                    return Err(SequenceError::ConflictingPhase {
                        phase: index,
                        first: a,
                        second: b,
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of phases in the cycle.
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Whether the cycle has no phases. Always false for a built sequence.
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

impl LightSequence for CustomSequence {
    fn advance_phase(
        &mut self,
        intersection: &Intersection,
    ) -> Result<Vec<StateChangeEvent>, IntersectionError> {
        let step = self.cursor;
        self.cursor = (self.cursor + 1) % self.phases.len();

        let configured = intersection.directions();
        let green = &self.phases[step];

        let mut states: BTreeMap<Direction, LightState> = configured
            .iter()
            .map(|&direction| (direction, LightState::Red))
            .collect();
        for &direction in green {
            set_if_present(&mut states, configured, direction, LightState::Green);
        }

        intersection.set_light_states(&states)
    }
}
