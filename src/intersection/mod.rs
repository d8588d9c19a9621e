//! The intersection state machine.
//!
//! An [`Intersection`] owns one traffic light per configured direction and
//! enforces the safety invariant across all of them: no two directions in
//! conflicting lanes ever show green at the same time. All mutation happens
//! under an exclusive write lock so validation and mutation are observed as a
//! single atomic step; batch updates either apply completely or not at all.
//!
//! Every successful mutation appends to an ordered, append-only history of
//! [`StateChangeEvent`] values covering all lights.

mod builder;
mod error;
mod snapshot;

pub use builder::{BuildError, IntersectionBuilder};
pub use error::IntersectionError;
pub use snapshot::IntersectionSnapshot;

use crate::core::{Direction, LightState, StateChangeEvent, TrafficLight};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

/// Mutable interior, guarded by a single lock.
///
/// The history lives behind the same lock as the lights: every writer already
/// holds the write lock for its mutation, and readers clone under the read
/// lock, so history iteration never observes a torn append.
#[derive(Debug)]
struct Inner {
    lights: BTreeMap<Direction, TrafficLight>,
    paused: bool,
    history: Vec<StateChangeEvent>,
}

/// A traffic intersection with one light per configured direction.
///
/// Identified by an immutable id and display name. The set of configured
/// directions is fixed at construction; lights are never added or removed.
///
/// # Example
///
/// ```rust
/// use crosslight::core::{Direction, LightState};
/// use crosslight::intersection::IntersectionBuilder;
///
/// let intersection = IntersectionBuilder::new()
///     .id("demo")
///     .standard_four_way()
///     .build()
///     .unwrap();
///
/// intersection
///     .set_light_state(Direction::North, LightState::Green)
///     .unwrap();
///
/// // East conflicts with the now-green North and is rejected.
/// assert!(intersection
///     .set_light_state(Direction::East, LightState::Green)
///     .is_err());
/// ```
#[derive(Debug)]
pub struct Intersection {
    id: String,
    name: String,
    directions: BTreeSet<Direction>,
    inner: RwLock<Inner>,
}

impl Intersection {
    /// Start building an intersection.
    pub fn builder() -> IntersectionBuilder {
        IntersectionBuilder::new()
    }

    pub(crate) fn from_parts(id: String, name: String, directions: BTreeSet<Direction>) -> Self {
        let mut lights = BTreeMap::new();
        let mut history = Vec::with_capacity(directions.len());
        for &direction in &directions {
            lights.insert(direction, TrafficLight::new(direction, LightState::Red));
            history.push(StateChangeEvent::initial(direction, LightState::Red));
        }
        Self {
            id,
            name,
            directions,
            inner: RwLock::new(Inner {
                lights,
                paused: false,
                history,
            }),
        }
    }

    /// Unique id, assigned once at construction.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fixed set of configured directions.
    pub fn directions(&self) -> &BTreeSet<Direction> {
        &self.directions
    }

    /// Whether the intersection is currently paused.
    pub fn is_paused(&self) -> bool {
        self.inner.read().paused
    }

    /// Current state of one direction's light.
    pub fn light_state(&self, direction: Direction) -> Result<LightState, IntersectionError> {
        let inner = self.inner.read();
        inner
            .lights
            .get(&direction)
            .map(TrafficLight::state)
            .ok_or(IntersectionError::UnknownDirection { direction })
    }

    /// Directions currently showing green, read under one consistent view.
    pub fn green_directions(&self) -> BTreeSet<Direction> {
        let inner = self.inner.read();
        inner
            .lights
            .values()
            .filter(|light| light.allows_traffic())
            .map(TrafficLight::direction)
            .collect()
    }

    /// Set the state of a single direction's light.
    ///
    /// When the new state is green, validates that no currently-green
    /// direction conflicts with `direction`. Validation and mutation happen
    /// under one exclusive lock acquisition.
    pub fn set_light_state(
        &self,
        direction: Direction,
        new_state: LightState,
    ) -> Result<StateChangeEvent, IntersectionError> {
        let mut inner = self.inner.write();
        if inner.paused {
            return Err(IntersectionError::Paused);
        }
        if !inner.lights.contains_key(&direction) {
            return Err(IntersectionError::UnknownDirection { direction });
        }

        if new_state == LightState::Green {
            let conflicting: BTreeSet<Direction> = inner
                .lights
                .values()
                .filter(|light| {
                    light.direction() != direction
                        && light.allows_traffic()
                        && direction.conflicts_with(light.direction())
                })
                .map(TrafficLight::direction)
                .collect();
            if !conflicting.is_empty() {
                let mut directions = conflicting;
                directions.insert(direction);
                return Err(IntersectionError::Conflict { directions });
            }
        }

        let event = inner
            .lights
            .get_mut(&direction)
            .map(|light| light.set_state(new_state))
            .ok_or(IntersectionError::UnknownDirection { direction })?;
        inner.history.push(event.clone());
        Ok(event)
    }

    /// Apply multiple light changes atomically.
    ///
    /// The resulting configuration is computed by overlaying `changes` onto
    /// the current states; all pairs of directions that would be green in
    /// that configuration are checked for conflicts. On any conflict the
    /// whole batch is rejected with no partial mutation. Checking the batch
    /// as a whole permits legal combined transitions, such as turning one
    /// direction red while a previously-conflicting direction turns green in
    /// the same call.
    pub fn set_light_states(
        &self,
        changes: &BTreeMap<Direction, LightState>,
    ) -> Result<Vec<StateChangeEvent>, IntersectionError> {
        let mut inner = self.inner.write();
        if inner.paused {
            return Err(IntersectionError::Paused);
        }
        for &direction in changes.keys() {
            if !inner.lights.contains_key(&direction) {
                return Err(IntersectionError::UnknownDirection { direction });
            }
        }

        Self::validate_resulting_configuration(&inner, changes)?;

        let Inner { lights, history, .. } = &mut *inner;
        let mut events = Vec::with_capacity(changes.len());
        for (&direction, &new_state) in changes {
            if let Some(light) = lights.get_mut(&direction) {
                let event = light.set_state(new_state);
                history.push(event.clone());
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Pause the intersection, forcing every non-red light to red.
    ///
    /// Idempotent: pausing an already-paused intersection changes nothing and
    /// returns an empty event list. The forced move to all-red bypasses
    /// conflict checking (all-red can never conflict) but still runs under
    /// the exclusive lock for its full duration.
    pub fn pause(&self) -> Vec<StateChangeEvent> {
        let mut inner = self.inner.write();
        if inner.paused {
            return Vec::new();
        }
        inner.paused = true;

        let Inner { lights, history, .. } = &mut *inner;
        let mut events = Vec::new();
        for light in lights.values_mut() {
            if light.state() != LightState::Red {
                let event = light.set_state(LightState::Red);
                history.push(event.clone());
                events.push(event);
            }
        }
        events
    }

    /// Resume after a pause. Lights stay wherever `pause` left them.
    pub fn resume(&self) {
        self.inner.write().paused = false;
    }

    /// Consistent point-in-time copy of the whole intersection.
    pub fn snapshot(&self) -> IntersectionSnapshot {
        let inner = self.inner.read();
        IntersectionSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            lights: inner
                .lights
                .iter()
                .map(|(&direction, light)| (direction, light.snapshot()))
                .collect(),
            paused: inner.paused,
            captured_at: Utc::now(),
        }
    }

    /// The full append-only history of state changes, oldest first.
    pub fn history(&self) -> Vec<StateChangeEvent> {
        self.inner.read().history.clone()
    }

    /// History filtered to one direction, in chronological order.
    pub fn history_for(&self, direction: Direction) -> Vec<StateChangeEvent> {
        self.inner
            .read()
            .history
            .iter()
            .filter(|event| event.direction == direction)
            .cloned()
            .collect()
    }

    /// History entries strictly after the given time.
    pub fn history_since(&self, since: DateTime<Utc>) -> Vec<StateChangeEvent> {
        self.inner
            .read()
            .history
            .iter()
            .filter(|event| event.timestamp > since)
            .cloned()
            .collect()
    }

    /// Check all pairs of would-be-green directions in the overlaid
    /// configuration. Yellow is a caution interval and is never checked.
    fn validate_resulting_configuration(
        inner: &Inner,
        changes: &BTreeMap<Direction, LightState>,
    ) -> Result<(), IntersectionError> {
        let would_be_green: Vec<Direction> = inner
            .lights
            .iter()
            .filter(|&(direction, light)| {
                changes.get(direction).copied().unwrap_or_else(|| light.state())
                    == LightState::Green
            })
            .map(|(&direction, _)| direction)
            .collect();

        let mut conflicting = BTreeSet::new();
        for (i, &a) in would_be_green.iter().enumerate() {
            for &b in &would_be_green[i + 1..] {
                if a.conflicts_with(b) {
                    conflicting.insert(a);
                    conflicting.insert(b);
                }
            }
        }

        if conflicting.is_empty() {
            Ok(())
        } else {
            Err(IntersectionError::Conflict {
                directions: conflicting,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_way(id: &str) -> Intersection {
        Intersection::builder()
            .id(id)
            .standard_four_way()
            .build()
            .unwrap()
    }

    fn batch(changes: &[(Direction, LightState)]) -> BTreeMap<Direction, LightState> {
        changes.iter().copied().collect()
    }

    #[test]
    fn single_green_succeeds() {
        let intersection = four_way("t1");
        let event = intersection
            .set_light_state(Direction::North, LightState::Green)
            .unwrap();
        assert_eq!(event.new_state, LightState::Green);
        assert_eq!(
            intersection.light_state(Direction::North).unwrap(),
            LightState::Green
        );
    }

    #[test]
    fn conflicting_green_is_rejected_with_full_set() {
        let intersection = four_way("t2");
        intersection
            .set_light_state(Direction::North, LightState::Green)
            .unwrap();

        let err = intersection
            .set_light_state(Direction::East, LightState::Green)
            .unwrap_err();
        match err {
            IntersectionError::Conflict { directions } => {
                assert!(directions.contains(&Direction::North));
                assert!(directions.contains(&Direction::East));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        // The rejected call mutated nothing.
        assert_eq!(
            intersection.light_state(Direction::East).unwrap(),
            LightState::Red
        );
    }

    #[test]
    fn parallel_directions_may_both_be_green() {
        let intersection = four_way("t3");
        intersection
            .set_light_state(Direction::North, LightState::Green)
            .unwrap();
        intersection
            .set_light_state(Direction::South, LightState::Green)
            .unwrap();

        let green = intersection.green_directions();
        assert!(green.contains(&Direction::North));
        assert!(green.contains(&Direction::South));
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let intersection = Intersection::builder()
            .id("t4")
            .direction(Direction::North)
            .build()
            .unwrap();

        let err = intersection
            .set_light_state(Direction::East, LightState::Green)
            .unwrap_err();
        assert_eq!(
            err,
            IntersectionError::UnknownDirection {
                direction: Direction::East
            }
        );
    }

    #[test]
    fn batch_swap_succeeds_in_one_call() {
        let intersection = four_way("t5");
        intersection
            .set_light_states(&batch(&[
                (Direction::North, LightState::Green),
                (Direction::South, LightState::Green),
            ]))
            .unwrap();

        // NS -> red and EW -> green together; per-key sequential checking
        // would spuriously reject this.
        intersection
            .set_light_states(&batch(&[
                (Direction::North, LightState::Red),
                (Direction::South, LightState::Red),
                (Direction::East, LightState::Green),
                (Direction::West, LightState::Green),
            ]))
            .unwrap();

        let green = intersection.green_directions();
        assert_eq!(
            green,
            [Direction::East, Direction::West].into_iter().collect()
        );
    }

    #[test]
    fn conflicting_batch_is_rejected_without_partial_mutation() {
        let intersection = four_way("t6");
        let before = intersection.snapshot();
        let history_before = intersection.history().len();

        let err = intersection
            .set_light_states(&batch(&[
                (Direction::North, LightState::Green),
                (Direction::East, LightState::Green),
            ]))
            .unwrap_err();
        assert!(matches!(err, IntersectionError::Conflict { .. }));

        let after = intersection.snapshot();
        for (direction, light) in &before.lights {
            assert_eq!(light.state, after.lights[direction].state);
        }
        assert_eq!(intersection.history().len(), history_before);
    }

    #[test]
    fn batch_overlay_keeps_unmentioned_directions() {
        let intersection = four_way("t7");
        intersection
            .set_light_state(Direction::North, LightState::Green)
            .unwrap();

        // East green conflicts with the kept North green even though the
        // batch itself never mentions North.
        let err = intersection
            .set_light_states(&batch(&[(Direction::East, LightState::Green)]))
            .unwrap_err();
        assert!(matches!(err, IntersectionError::Conflict { .. }));
    }

    #[test]
    fn yellow_is_never_conflict_checked() {
        let intersection = four_way("t8");
        intersection
            .set_light_state(Direction::North, LightState::Green)
            .unwrap();

        // A conflicting direction may hold yellow while North is green.
        intersection
            .set_light_states(&batch(&[(Direction::East, LightState::Yellow)]))
            .unwrap();
        assert_eq!(
            intersection.light_state(Direction::East).unwrap(),
            LightState::Yellow
        );
    }

    #[test]
    fn batch_with_unknown_direction_is_rejected() {
        let intersection = Intersection::builder()
            .id("t9")
            .directions([Direction::North, Direction::South])
            .build()
            .unwrap();

        let err = intersection
            .set_light_states(&batch(&[
                (Direction::North, LightState::Green),
                (Direction::West, LightState::Red),
            ]))
            .unwrap_err();
        assert_eq!(
            err,
            IntersectionError::UnknownDirection {
                direction: Direction::West
            }
        );
        assert_eq!(
            intersection.light_state(Direction::North).unwrap(),
            LightState::Red
        );
    }

    #[test]
    fn pause_forces_all_red_and_blocks_mutation() {
        let intersection = four_way("t10");
        intersection
            .set_light_state(Direction::North, LightState::Green)
            .unwrap();

        let events = intersection.pause();
        assert_eq!(events.len(), 1);
        assert!(intersection.is_paused());
        for &direction in intersection.directions() {
            assert_eq!(
                intersection.light_state(direction).unwrap(),
                LightState::Red
            );
        }

        let err = intersection
            .set_light_state(Direction::North, LightState::Green)
            .unwrap_err();
        assert_eq!(err, IntersectionError::Paused);
    }

    #[test]
    fn pause_is_idempotent() {
        let intersection = four_way("t11");
        intersection
            .set_light_state(Direction::North, LightState::Green)
            .unwrap();

        let first = intersection.pause();
        let second = intersection.pause();
        assert!(!first.is_empty());
        assert!(second.is_empty());
    }

    #[test]
    fn resume_reenables_mutation_without_touching_lights() {
        let intersection = four_way("t12");
        intersection.pause();
        intersection.resume();

        assert!(!intersection.is_paused());
        for &direction in intersection.directions() {
            assert_eq!(
                intersection.light_state(direction).unwrap(),
                LightState::Red
            );
        }
        intersection
            .set_light_state(Direction::East, LightState::Green)
            .unwrap();
    }

    #[test]
    fn history_grows_by_one_per_successful_mutation() {
        let intersection = four_way("t13");
        assert_eq!(intersection.history().len(), 4);

        intersection
            .set_light_state(Direction::North, LightState::Green)
            .unwrap();
        intersection
            .set_light_state(Direction::North, LightState::Yellow)
            .unwrap();
        intersection
            .set_light_state(Direction::North, LightState::Red)
            .unwrap();

        assert_eq!(intersection.history().len(), 7);
    }

    #[test]
    fn history_for_direction_is_chronological() {
        let intersection = four_way("t14");
        intersection
            .set_light_state(Direction::North, LightState::Green)
            .unwrap();
        intersection
            .set_light_state(Direction::East, LightState::Yellow)
            .unwrap();
        intersection
            .set_light_state(Direction::North, LightState::Yellow)
            .unwrap();

        let north = intersection.history_for(Direction::North);
        assert_eq!(north.len(), 3); // initial + two changes
        assert!(north.iter().all(|event| event.direction == Direction::North));
        assert!(north.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(north[1].new_state, LightState::Green);
        assert_eq!(north[2].new_state, LightState::Yellow);
    }

    #[test]
    fn history_since_filters_strictly_after() {
        let intersection = four_way("t15");
        let cutoff = Utc::now();
        intersection
            .set_light_state(Direction::North, LightState::Green)
            .unwrap();

        let recent = intersection.history_since(cutoff);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].new_state, LightState::Green);
    }

    #[test]
    fn snapshot_captures_paused_flag() {
        let intersection = four_way("t16");
        intersection.pause();
        let snap = intersection.snapshot();
        assert!(snap.paused);
        assert!(snap.green_directions().next().is_none());
    }
}
