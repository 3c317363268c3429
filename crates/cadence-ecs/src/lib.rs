//! Cadence ECS - Entity arena with stable handles
//!
//! This crate wraps hecs with stable entity identifiers, a parent/child
//! ownership tree that rejects cycles, and transform mutators guarded by
//! the current tick phase.

mod entity;
mod world;

pub use entity::EntityInfo;
pub use world::{EntityWorld, Phase, Priority};
