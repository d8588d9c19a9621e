//! Consistent point-in-time copies of intersection state.

use crate::core::{Direction, LightSnapshot, LightState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable copy of an intersection's full state at one instant.
///
/// Captured under a single read-lock acquisition, so no snapshot ever mixes
/// pre- and post-mutation states of a concurrent write.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct IntersectionSnapshot {
    pub id: String,
    pub name: String,
    pub lights: BTreeMap<Direction, LightSnapshot>,
    pub paused: bool,
    pub captured_at: DateTime<Utc>,
}

impl IntersectionSnapshot {
    /// The captured state of one direction's light, if configured.
    pub fn light_state(&self, direction: Direction) -> Option<LightState> {
        self.lights.get(&direction).map(|light| light.state)
    }

    /// Directions that were green at capture time.
    pub fn green_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        self.lights
            .values()
            .filter(|light| light.state.allows_traffic())
            .map(|light| light.direction)
    }
}
