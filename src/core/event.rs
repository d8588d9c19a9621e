//! Immutable state change records.
//!
//! Every mutation of a traffic light produces one [`StateChangeEvent`].
//! Events are append-only audit values; once created they are never modified.

use super::direction::Direction;
use super::state::LightState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of a single light state change.
///
/// `previous` is `None` only for the synthetic event recorded when a light is
/// first configured at an intersection.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct StateChangeEvent {
    /// The direction whose light changed
    pub direction: Direction,
    /// The state before the change; absent for the initial event
    pub previous: Option<LightState>,
    /// The state after the change
    pub new_state: LightState,
    /// When the change occurred
    pub timestamp: DateTime<Utc>,
}

impl StateChangeEvent {
    /// Create an event stamped with the current time.
    pub fn now(direction: Direction, previous: LightState, new_state: LightState) -> Self {
        Self {
            direction,
            previous: Some(previous),
            new_state,
            timestamp: Utc::now(),
        }
    }

    /// Create the initial event for a newly configured light (no previous state).
    pub fn initial(direction: Direction, state: LightState) -> Self {
        Self {
            direction,
            previous: None,
            new_state: state,
            timestamp: Utc::now(),
        }
    }

    /// Whether this is the initial event for its light.
    pub fn is_initial(&self) -> bool {
        self.previous.is_none()
    }
}
