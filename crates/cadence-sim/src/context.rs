//! Explicit simulation context threaded through scan and apply

use crate::config::SimConfig;
use cadence_core::EntityId;
use cadence_ecs::EntityWorld;
use cadence_runtime::{EventBus, InputState, SimEvent};
use log::info;

/// Read-only view handed to every entity scan
pub struct ScanContext<'a> {
    /// Seconds since the previous tick
    pub dt: f64,
    /// Simulation time of this tick
    pub total_time: f64,
    /// Pre-tick world snapshot
    pub world: &'a EntityWorld,
    pub input: &'a InputState,
    pub config: &'a SimConfig,
}

/// Level-wide mutable state: score, camera, pending level transition
#[derive(Debug, Default)]
pub struct SimState {
    score: i64,
    /// The entity the player controls and views through
    pub camera: Option<EntityId>,
    pending_state: Option<String>,
    pub events: EventBus,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    /// Award points for an entity's death
    pub fn add_score(&mut self, entity: EntityId, points: i64) {
        self.score += points;
        info!("{} points!", points);
        info!("Score: {}", self.score);
        self.events.push(SimEvent::ScoreAwarded {
            entity,
            points,
            total: self.score,
        });
    }

    pub fn reset_score(&mut self) {
        self.score = 0;
    }

    /// Ask for a level transition once the current tick completes. A later
    /// request in the same tick replaces an earlier one.
    pub fn request_state(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.events.push(SimEvent::StateRequested(path.clone()));
        self.pending_state = Some(path);
    }

    pub fn pending_state(&self) -> Option<&str> {
        self.pending_state.as_deref()
    }

    pub fn take_state_request(&mut self) -> Option<String> {
        self.pending_state.take()
    }
}
