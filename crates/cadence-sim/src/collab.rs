//! Traits for the engine pieces the scheduler consumes but does not own:
//! spatial queries and level loading.

use crate::scheduler::Scheduler;
use cadence_core::{EntityId, Result, Vec3};
use cadence_ecs::EntityWorld;

/// Result of a successful ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: EntityId,
    /// Index of the face that was hit, when the caster knows geometry
    pub face: Option<usize>,
    /// Distance along the ray
    pub distance: f32,
}

/// Spatial query collaborator
pub trait RayCaster {
    fn cast_ray(&self, world: &EntityWorld, origin: Vec3, direction: Vec3) -> Option<RayHit>;
}

/// Never hits anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRayCaster;

impl RayCaster for NoRayCaster {
    fn cast_ray(&self, _world: &EntityWorld, _origin: Vec3, _direction: Vec3) -> Option<RayHit> {
        None
    }
}

/// Geometry-free ray caster: treats every live entity as a sphere of
/// `radius` around its world position and returns the nearest one within
/// `reach`. Entities sitting exactly at the origin (the caster) are skipped.
#[derive(Debug, Clone, Copy)]
pub struct ProximityRayCaster {
    pub reach: f32,
    pub radius: f32,
}

impl ProximityRayCaster {
    pub fn new(reach: f32, radius: f32) -> Self {
        Self { reach, radius }
    }
}

impl RayCaster for ProximityRayCaster {
    fn cast_ray(&self, world: &EntityWorld, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        let dir = direction.normalized();
        if dir.length() == 0.0 {
            return None;
        }

        let mut best: Option<RayHit> = None;
        for id in world.scan_order() {
            let Some(center) = world.world_position(id) else {
                continue;
            };
            let along = (center - origin).dot(&dir);
            if along <= 1e-4 || along > self.reach {
                continue;
            }
            let closest = origin + dir * along;
            if closest.distance(&center) > self.radius {
                continue;
            }
            if best.map_or(true, |hit| along < hit.distance) {
                best = Some(RayHit {
                    entity: id,
                    face: None,
                    distance: along,
                });
            }
        }
        best
    }
}

/// Opaque handle to a loaded level state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHandle(pub u64);

/// Map/state loader collaborator.
///
/// `load_state` parses and caches a level; `set_state` replaces the
/// scheduler's world with it. Both run between ticks.
pub trait StateLoader {
    fn load_state(&mut self, path: &str) -> Result<StateHandle>;

    fn set_state(&mut self, handle: StateHandle, scheduler: &mut Scheduler) -> Result<()>;
}
