//! Cadence Core - Foundational types for the Cadence simulation core
//!
//! This crate provides the core types that all other Cadence crates depend on:
//! - `EntityId` - Stable entity handles
//! - `Transform`, `Vec3` - Spatial types and matrix helpers
//! - Error types and Result alias

mod error;
mod id;
mod types;

pub use error::{CadenceError, Result};
pub use id::EntityId;
pub use types::{mat4_inverse_affine, mat4_mul, mat4_translation, transform_point, Transform, Vec3};
