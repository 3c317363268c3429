//! Simulation events reported to collaborators after a tick

use cadence_core::EntityId;

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A kill with score notification awarded points
    ScoreAwarded {
        entity: EntityId,
        points: i64,
        total: i64,
    },
    EntityKilled(EntityId),
    TouchStarted {
        target: EntityId,
        toucher: EntityId,
    },
    TouchEnded {
        target: EntityId,
        toucher: EntityId,
    },
    /// A scan or action failed; the rest of the tick carried on
    ActionFault {
        entity: EntityId,
        message: String,
    },
    /// A level transition was requested (e.g. after the player fell)
    StateRequested(String),
    /// A level transition completed
    StateLoaded(String),
    /// A level transition failed; the previous level keeps running
    StateFailed { path: String, message: String },
}

impl SimEvent {
    /// Something went wrong but the tick completed anyway
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            SimEvent::ActionFault { .. } | SimEvent::StateFailed { .. }
        )
    }
}

/// Events collected during a tick, handed out with its report
#[derive(Debug, Default)]
pub struct EventBus {
    pending: Vec<SimEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.pending.push(event);
    }

    /// Take everything queued since the last drain, oldest first
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
