//! Cadence Sim - gameplay scheduling
//!
//! Entities carry a [`Behavior`] and an [`ActionQueue`]. Each tick the
//! [`Scheduler`] scans every sim object and entity against the pre-tick
//! world, then applies the collected actions and reports which transforms
//! changed. Level files describe the entities; [`SimConfig`] holds tuning.

pub mod action;
pub mod behavior;
pub mod collab;
pub mod config;
pub mod context;
pub mod level;
pub mod object;
pub mod scheduler;
pub mod watchers;

pub use action::{Action, ActionBuffer, ActionQueue, Signal, Step, TouchedSet};
pub use behavior::{Behavior, EntityBehavior};
pub use collab::{NoRayCaster, ProximityRayCaster, RayCaster, RayHit, StateHandle, StateLoader};
pub use config::SimConfig;
pub use context::{ScanContext, SimState};
pub use level::{BehaviorDef, EntityDef, LevelFile, TomlStateLoader};
pub use object::{ObjectContext, ObjectHandle, SimObject, SimObjectRegistry, UpdateContext};
pub use scheduler::{Scheduler, TickReport};
pub use watchers::{DeathWatcher, UseScanner};
