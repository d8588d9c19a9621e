//! Crosslight: conflict-safe traffic intersection state machines
//!
//! Crosslight models independently operated road intersections. Each
//! intersection owns one traffic light per configured direction and enforces
//! a single safety invariant: no two directions in conflicting lanes ever
//! show green at the same time. Every state change is recorded in an
//! append-only audit history.
//!
//! # Core Concepts
//!
//! - **Direction / Lane**: traffic approaches and the fixed conflict relation
//!   between them
//! - **Intersection**: the aggregate state machine with atomic single and
//!   batch light updates, pause/resume override, and consistent snapshots
//! - **Sequences**: two-phase, protected-turn, and custom phase cycles that
//!   drive an intersection through its configuration
//! - **Controller**: the async shell that runs sequences on timers and
//!   performs graduated green -> yellow -> red changeovers
//!
//! # Example
//!
//! ```rust
//! use crosslight::core::{Direction, LightState};
//! use crosslight::intersection::IntersectionBuilder;
//! use std::collections::BTreeMap;
//!
//! let intersection = IntersectionBuilder::new()
//!     .id("main-and-first")
//!     .standard_four_way()
//!     .build()
//!     .unwrap();
//!
//! // North-south gets green in one atomic batch.
//! let changes: BTreeMap<_, _> = [
//!     (Direction::North, LightState::Green),
//!     (Direction::South, LightState::Green),
//! ]
//! .into_iter()
//! .collect();
//! intersection.set_light_states(&changes).unwrap();
//!
//! // A conflicting green is rejected and nothing changes.
//! assert!(intersection
//!     .set_light_state(Direction::East, LightState::Green)
//!     .is_err());
//!
//! // 4 initial events + 2 from the batch.
//! assert_eq!(intersection.history().len(), 6);
//! ```

pub mod control;
pub mod core;
pub mod intersection;
pub mod sequence;

// Re-export commonly used types
pub use control::{ControlError, IntersectionRegistry, PhaseTransition, TrafficController};
pub use core::{Direction, Lane, LightSnapshot, LightState, StateChangeEvent, TrafficLight};
pub use intersection::{
    BuildError, Intersection, IntersectionBuilder, IntersectionError, IntersectionSnapshot,
};
pub use sequence::{
    custom, four_phase_with_protected_turns, two_phase, CustomSequence, FourPhaseSequence,
    LightSequence, SequenceError, TwoPhaseSequence,
};
