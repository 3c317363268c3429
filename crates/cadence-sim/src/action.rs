//! Deferred entity mutations
//!
//! Scans never touch the world; they describe what should happen as
//! [`Action`]s bound to one entity. The scheduler runs each entity's queue
//! in FIFO order during the apply phase.

use cadence_core::{EntityId, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Trigger sent to a behavior by another entity or by a level script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Start,
    Stop,
    Show,
    Hide,
    Toggle,
    BeginFall,
}

/// Commit of a behavior's own state, computed during scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    PlatformAnchor { start_time: f64, start_position: Vec3 },
    FallVelocity(f32),
    HiddenPhase(f32),
    AddRider(EntityId),
    RemoveRider(EntityId),
    Pressed(bool),
    RippleAnchor(f64),
    RippleCursor(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Translate(Vec3),
    SetPosition(Vec3),
    /// Euler delta in degrees
    Rotate(Vec3),
    AttachChild(EntityId),
    DetachChild(EntityId),
    Kill { notify_score: bool },
    Signal(Signal),
    Step(Step),
}

impl Action {
    /// True for actions that change the owning entity's transform
    pub fn moves_entity(&self) -> bool {
        matches!(
            self,
            Action::Translate(_) | Action::SetPosition(_) | Action::Rotate(_)
        )
    }
}

/// Per-entity FIFO queue, stored as a component
#[derive(Debug, Default)]
pub struct ActionQueue {
    actions: VecDeque<Action>,
}

impl ActionQueue {
    pub fn push(&mut self, action: Action) {
        self.actions.push_back(action);
    }

    /// Remove every queued action, oldest first
    pub fn take(&mut self) -> VecDeque<Action> {
        std::mem::take(&mut self.actions)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Actions collected during one scan phase, flushed into queues once every
/// participant has scanned
#[derive(Debug, Default)]
pub struct ActionBuffer {
    pending: Vec<(EntityId, Action)>,
}

impl ActionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: EntityId, action: Action) {
        self.pending.push((entity, action));
    }

    pub fn extend(&mut self, actions: impl IntoIterator<Item = (EntityId, Action)>) {
        self.pending.extend(actions);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Actions queued for one entity, in push order
    pub fn for_entity(&self, entity: EntityId) -> Vec<Action> {
        self.pending
            .iter()
            .filter(|(id, _)| *id == entity)
            .map(|(_, action)| *action)
            .collect()
    }

    pub fn drain(&mut self) -> Vec<(EntityId, Action)> {
        std::mem::take(&mut self.pending)
    }
}

/// Entities whose transform changed during an apply phase, in first-change
/// order without duplicates
#[derive(Debug, Default)]
pub struct TouchedSet {
    order: Vec<EntityId>,
    seen: HashSet<EntityId>,
}

impl TouchedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: EntityId) -> bool {
        if self.seen.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, id: EntityId) {
        if self.seen.remove(&id) {
            self.order.retain(|e| *e != id);
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.seen.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_vec(self) -> Vec<EntityId> {
        self.order
    }
}
