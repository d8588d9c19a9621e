//! Imperative shell: controller facade, sequence tasks, phase orchestration.
//!
//! [`TrafficController`] exposes the intersection operations by id, drives
//! automated phase sequences as background tasks (one cancellable slot per
//! intersection), and performs graduated green -> yellow -> red changeovers
//! with a configurable caution dwell. All async machinery lives here; the
//! state machines themselves are synchronous.

mod error;
mod registry;

pub use error::ControlError;
pub use registry::IntersectionRegistry;

use crate::core::{Direction, LightState, StateChangeEvent};
use crate::intersection::{Intersection, IntersectionSnapshot};
use crate::sequence::LightSequence;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One running automated sequence.
struct SequenceTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Handle to an in-flight graduated phase transition.
///
/// The transition runs as its own task; dropping the handle does not stop
/// it. [`cancel`](PhaseTransition::cancel) requests cooperative cancellation:
/// if the dwell wait is still pending, the pending timer is dropped, vacating
/// directions are moved to red on a best-effort basis, and
/// [`wait`](PhaseTransition::wait) reports
/// [`ControlError::TransitionCancelled`].
pub struct PhaseTransition {
    token: CancellationToken,
    handle: JoinHandle<Result<Vec<StateChangeEvent>, ControlError>>,
}

impl PhaseTransition {
    /// Request cancellation of the transition.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the transition task has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the transition to complete.
    ///
    /// Yields the ordered event list from all sub-steps, or the failure that
    /// ended the transition.
    pub async fn wait(self) -> Result<Vec<StateChangeEvent>, ControlError> {
        match self.handle.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_cancelled() => Err(ControlError::TransitionCancelled),
            Err(_) => Err(ControlError::TransitionInterrupted),
        }
    }
}

/// Facade over a registry of intersections.
///
/// Intersections are addressed by id. The controller owns the background
/// tasks that drive automated sequences and tracks one task slot per
/// intersection, so starting a new sequence deterministically cancels the
/// previous one.
pub struct TrafficController {
    registry: Arc<IntersectionRegistry>,
    sequences: Mutex<HashMap<String, SequenceTask>>,
    /// Parent token for all in-flight phase transitions; cancelled on shutdown.
    transitions: CancellationToken,
}

impl Default for TrafficController {
    fn default() -> Self {
        Self::new()
    }
}

impl TrafficController {
    /// Create a controller with its own empty registry.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(IntersectionRegistry::new()))
    }

    /// Create a controller over an existing registry.
    pub fn with_registry(registry: Arc<IntersectionRegistry>) -> Self {
        Self {
            registry,
            sequences: Mutex::new(HashMap::new()),
            transitions: CancellationToken::new(),
        }
    }

    /// The registry this controller operates on.
    pub fn registry(&self) -> &Arc<IntersectionRegistry> {
        &self.registry
    }

    /// Register an existing intersection.
    pub fn register_intersection(
        &self,
        intersection: Arc<Intersection>,
    ) -> Result<(), ControlError> {
        self.registry.register(intersection)
    }

    /// Build and register a standard four-way intersection.
    pub fn create_standard_intersection(
        &self,
        id: &str,
        name: &str,
    ) -> Result<Arc<Intersection>, ControlError> {
        let intersection = Arc::new(
            Intersection::builder()
                .id(id)
                .name(name)
                .standard_four_way()
                .build()?,
        );
        self.registry.register(Arc::clone(&intersection))?;
        info!(intersection = id, "registered standard four-way intersection");
        Ok(intersection)
    }

    /// Look up an intersection by id.
    pub fn intersection(&self, id: &str) -> Result<Arc<Intersection>, ControlError> {
        self.registry
            .get(id)
            .ok_or_else(|| ControlError::UnknownIntersection { id: id.to_string() })
    }

    /// Remove an intersection, stopping any running sequence first.
    pub fn remove_intersection(&self, id: &str) -> bool {
        self.stop_sequence(id);
        self.registry.remove(id)
    }

    /// Consistent snapshot of an intersection's state.
    pub fn state(&self, id: &str) -> Result<IntersectionSnapshot, ControlError> {
        Ok(self.intersection(id)?.snapshot())
    }

    /// Set a single light state.
    pub fn set_light_state(
        &self,
        id: &str,
        direction: Direction,
        state: LightState,
    ) -> Result<StateChangeEvent, ControlError> {
        Ok(self.intersection(id)?.set_light_state(direction, state)?)
    }

    /// Apply a batch of light states atomically.
    pub fn set_light_states(
        &self,
        id: &str,
        states: &BTreeMap<Direction, LightState>,
    ) -> Result<Vec<StateChangeEvent>, ControlError> {
        Ok(self.intersection(id)?.set_light_states(states)?)
    }

    /// Pause an intersection; all its lights go red.
    pub fn pause(&self, id: &str) -> Result<Vec<StateChangeEvent>, ControlError> {
        Ok(self.intersection(id)?.pause())
    }

    /// Resume a paused intersection.
    pub fn resume(&self, id: &str) -> Result<(), ControlError> {
        self.intersection(id)?.resume();
        Ok(())
    }

    /// Pause every registered intersection.
    ///
    /// Returns the forced-red events per intersection id.
    pub fn emergency_stop_all(&self) -> HashMap<String, Vec<StateChangeEvent>> {
        let mut results = HashMap::new();
        for intersection in self.registry.all() {
            warn!(intersection = intersection.id(), "emergency stop");
            results.insert(intersection.id().to_string(), intersection.pause());
        }
        results
    }

    /// Full state change history of an intersection.
    pub fn history(&self, id: &str) -> Result<Vec<StateChangeEvent>, ControlError> {
        Ok(self.intersection(id)?.history())
    }

    /// History for one direction of an intersection.
    pub fn history_for(
        &self,
        id: &str,
        direction: Direction,
    ) -> Result<Vec<StateChangeEvent>, ControlError> {
        Ok(self.intersection(id)?.history_for(direction))
    }

    /// History entries after the given time.
    pub fn history_since(
        &self,
        id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<StateChangeEvent>, ControlError> {
        Ok(self.intersection(id)?.history_since(since))
    }

    /// Start an automated sequence for an intersection.
    ///
    /// The sequence's `advance_phase` runs once per `period` on a background
    /// task. A sequence already running for the same intersection is
    /// cancelled before the new one starts. Advance failures are logged and
    /// do not stop the task, so a paused intersection picks its cycle back up
    /// after `resume`. Must be called from within a Tokio runtime.
    pub fn start_sequence<S>(
        &self,
        id: &str,
        sequence: S,
        period: Duration,
    ) -> Result<(), ControlError>
    where
        S: LightSequence + Send + 'static,
    {
        let intersection = self.intersection(id)?;
        let token = CancellationToken::new();
        let task_token = token.clone();

        // Cancel the previous slot before the new task is spawned; its first
        // tick fires immediately and must never interleave with the old
        // sequencer's phases.
        let mut sequences = self.sequences.lock();
        if let Some(previous) = sequences.remove(id) {
            previous.token.cancel();
            debug!(intersection = id, "cancelled previous sequence");
        }

        let handle = tokio::spawn(async move {
            let mut sequence = sequence;
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // Cancellation wins over a tick that became ready in the
                // same poll.
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = interval.tick() => {
                        match sequence.advance_phase(&intersection) {
                            Ok(events) => debug!(
                                intersection = intersection.id(),
                                applied = events.len(),
                                "advanced phase"
                            ),
                            Err(error) => warn!(
                                intersection = intersection.id(),
                                %error,
                                "phase advance failed"
                            ),
                        }
                    }
                }
            }
            debug!(intersection = intersection.id(), "sequence task stopped");
        });

        sequences.insert(id.to_string(), SequenceTask { token, handle });
        drop(sequences);
        info!(intersection = id, period_ms = period.as_millis() as u64, "sequence started");
        Ok(())
    }

    /// Stop the automated sequence for an intersection.
    ///
    /// Returns whether a sequence was running.
    pub fn stop_sequence(&self, id: &str) -> bool {
        if let Some(task) = self.sequences.lock().remove(id) {
            task.token.cancel();
            info!(intersection = id, "sequence stopped");
            true
        } else {
            false
        }
    }

    /// Perform a graduated phase changeover to a new green set.
    ///
    /// Directions leaving green go yellow, hold for `dwell`, then go red;
    /// directions entering green are set last. The work runs on its own task
    /// and the returned handle can cancel it; cancellation during the dwell
    /// drops the pending timer and moves the yellow directions to red before
    /// reporting [`ControlError::TransitionCancelled`]. Must be called from
    /// within a Tokio runtime.
    pub fn transition_phase(
        &self,
        id: &str,
        target_green: BTreeSet<Direction>,
        dwell: Duration,
    ) -> Result<PhaseTransition, ControlError> {
        let intersection = self.intersection(id)?;
        // Child of the controller-wide token, so shutdown cancels in-flight
        // transitions along with the sequence tasks.
        let token = self.transitions.child_token();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            run_transition(intersection, target_green, dwell, task_token).await
        });

        Ok(PhaseTransition { token, handle })
    }

    /// Cancel all outstanding background work and wait for it to finish.
    ///
    /// Sequence tasks that do not stop within `grace` are aborted. In-flight
    /// phase transitions are cancelled too (their holders observe
    /// [`ControlError::TransitionCancelled`] after the usual yellow-to-red
    /// cleanup), and no new transition started afterwards will run its dwell.
    pub async fn shutdown(&self, grace: Duration) {
        self.transitions.cancel();
        let tasks: Vec<(String, SequenceTask)> = self.sequences.lock().drain().collect();
        for (_, task) in &tasks {
            task.token.cancel();
        }

        let deadline = tokio::time::Instant::now() + grace;
        for (id, mut task) in tasks {
            match tokio::time::timeout_at(deadline, &mut task.handle).await {
                Ok(_) => debug!(intersection = %id, "sequence task joined"),
                Err(_) => {
                    warn!(intersection = %id, "sequence task exceeded shutdown grace, aborting");
                    task.handle.abort();
                }
            }
        }
        info!("controller shut down");
    }
}

/// The graduated changeover itself: yellow, dwell, red, then the new greens.
async fn run_transition(
    intersection: Arc<Intersection>,
    target_green: BTreeSet<Direction>,
    dwell: Duration,
    token: CancellationToken,
) -> Result<Vec<StateChangeEvent>, ControlError> {
    let current_green = intersection.green_directions();
    let vacating: BTreeSet<Direction> = current_green
        .difference(&target_green)
        .copied()
        .collect();

    let mut events = Vec::new();

    if !vacating.is_empty() {
        let yellow: BTreeMap<Direction, LightState> = vacating
            .iter()
            .map(|&direction| (direction, LightState::Yellow))
            .collect();
        events.extend(intersection.set_light_states(&yellow)?);

        tokio::select! {
            _ = token.cancelled() => {
                // Do not leave the vacating set stranded in yellow.
                let red: BTreeMap<Direction, LightState> = vacating
                    .iter()
                    .map(|&direction| (direction, LightState::Red))
                    .collect();
                if let Err(error) = intersection.set_light_states(&red) {
                    warn!(
                        intersection = intersection.id(),
                        %error,
                        "cleanup after cancelled transition failed"
                    );
                }
                return Err(ControlError::TransitionCancelled);
            }
            _ = tokio::time::sleep(dwell) => {}
        }

        let red: BTreeMap<Direction, LightState> = vacating
            .iter()
            .map(|&direction| (direction, LightState::Red))
            .collect();
        events.extend(intersection.set_light_states(&red)?);
    }

    if !target_green.is_empty() {
        let green: BTreeMap<Direction, LightState> = target_green
            .iter()
            .map(|&direction| (direction, LightState::Green))
            .collect();
        events.extend(intersection.set_light_states(&green)?);
    }

    debug!(
        intersection = intersection.id(),
        events = events.len(),
        "phase transition complete"
    );
    Ok(events)
}
