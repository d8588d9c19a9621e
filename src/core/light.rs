//! A single direction's traffic light.

use super::direction::Direction;
use super::event::StateChangeEvent;
use super::state::LightState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutable signal state for one direction.
///
/// A `TrafficLight` is owned exclusively by one intersection, which serializes
/// all access through its own lock; mutation here is plain `&mut` and performs
/// no conflict checking. Conflict validation is the intersection's job.
#[derive(Clone, Debug)]
pub struct TrafficLight {
    direction: Direction,
    state: LightState,
    changed_at: DateTime<Utc>,
}

impl TrafficLight {
    /// Create a light in the given initial state.
    pub fn new(direction: Direction, initial: LightState) -> Self {
        Self {
            direction,
            state: initial,
            changed_at: Utc::now(),
        }
    }

    /// The direction this light controls.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current signal state.
    pub fn state(&self) -> LightState {
        self.state
    }

    /// When the state last changed.
    pub fn changed_at(&self) -> DateTime<Utc> {
        self.changed_at
    }

    /// Whether this light currently allows traffic.
    pub fn allows_traffic(&self) -> bool {
        self.state.allows_traffic()
    }

    /// Replace the state, stamping the change time.
    ///
    /// Returns the event describing the transition.
    pub fn set_state(&mut self, new_state: LightState) -> StateChangeEvent {
        let previous = self.state;
        self.state = new_state;
        self.changed_at = Utc::now();
        StateChangeEvent {
            direction: self.direction,
            previous: Some(previous),
            new_state,
            timestamp: self.changed_at,
        }
    }

    /// Advance to the next state in the standard cycle.
    pub fn advance(&mut self) -> StateChangeEvent {
        self.set_state(self.state.next())
    }

    /// Immutable copy of this light's current state.
    pub fn snapshot(&self) -> LightSnapshot {
        LightSnapshot {
            direction: self.direction,
            state: self.state,
            changed_at: self.changed_at,
        }
    }
}

/// Point-in-time copy of a traffic light's state.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LightSnapshot {
    pub direction: Direction,
    pub state: LightState,
    pub changed_at: DateTime<Utc>,
}
