//! Simulation objects: scan participants that are not entities
//!
//! Sim objects have no transform and no place in the hierarchy. They scan
//! before entities each tick and get an `update` call once the scan barrier
//! has passed, which is where deferred effects such as level transitions
//! are requested.

use crate::action::ActionBuffer;
use crate::collab::RayCaster;
use crate::config::SimConfig;
use crate::context::SimState;
use cadence_core::{EntityId, Result};
use cadence_ecs::EntityWorld;
use cadence_runtime::InputState;

/// What a sim object sees during the scan phase
pub struct ObjectContext<'a> {
    pub dt: f64,
    pub total_time: f64,
    pub world: &'a EntityWorld,
    /// Mutable so button edges can be consumed
    pub input: &'a mut InputState,
    pub actions: &'a mut ActionBuffer,
    pub camera: Option<EntityId>,
    pub ray_caster: &'a dyn RayCaster,
    pub config: &'a SimConfig,
    retire: bool,
}

impl<'a> ObjectContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dt: f64,
        total_time: f64,
        world: &'a EntityWorld,
        input: &'a mut InputState,
        actions: &'a mut ActionBuffer,
        camera: Option<EntityId>,
        ray_caster: &'a dyn RayCaster,
        config: &'a SimConfig,
    ) -> Self {
        Self {
            dt,
            total_time,
            world,
            input,
            actions,
            camera,
            ray_caster,
            config,
            retire: false,
        }
    }

    /// Deregister the scanning object once its scan returns
    pub fn retire(&mut self) {
        self.retire = true;
    }

    pub fn is_retiring(&self) -> bool {
        self.retire
    }
}

/// What a sim object sees during the update phase
pub struct UpdateContext<'a> {
    pub total_time: f64,
    pub world: &'a EntityWorld,
    pub state: &'a mut SimState,
}

/// A non-positional scan participant
pub trait SimObject {
    /// Human-readable name for logs
    fn name(&self) -> &str;

    fn scan(&mut self, ctx: &mut ObjectContext<'_>) -> Result<()>;

    fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Index-stable handle to a registered sim object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(usize);

enum Slot {
    Vacant,
    Occupied(Box<dyn SimObject>),
    /// Taken out for a scan or update call
    Lent,
}

/// Flat registry of sim objects, iterated in registration order.
///
/// Handles stay valid for the life of the registry. Deregistering vacates
/// the slot without shifting the others, so removal during an ongoing
/// iteration (including an object retiring itself) is safe.
#[derive(Default)]
pub struct SimObjectRegistry {
    slots: Vec<Slot>,
}

impl SimObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, object: Box<dyn SimObject>) -> ObjectHandle {
        self.slots.push(Slot::Occupied(object));
        ObjectHandle(self.slots.len() - 1)
    }

    /// Remove an object. Returns false when the handle was already vacant.
    pub fn deregister(&mut self, handle: ObjectHandle) -> bool {
        match self.slots.get_mut(handle.0) {
            Some(slot) if !matches!(slot, Slot::Vacant) => {
                *slot = Slot::Vacant;
                true
            }
            _ => false,
        }
    }

    pub fn is_registered(&self, handle: ObjectHandle) -> bool {
        matches!(
            self.slots.get(handle.0),
            Some(Slot::Occupied(_) | Slot::Lent)
        )
    }

    /// Handles of every registered object, in registration order
    pub fn handles(&self) -> Vec<ObjectHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !matches!(slot, Slot::Vacant))
            .map(|(i, _)| ObjectHandle(i))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lend an object out for a call
    pub fn take(&mut self, handle: ObjectHandle) -> Option<Box<dyn SimObject>> {
        let slot = self.slots.get_mut(handle.0)?;
        match std::mem::replace(slot, Slot::Lent) {
            Slot::Occupied(object) => Some(object),
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Return a lent object. Dropped if the slot was deregistered meanwhile.
    pub fn restore(&mut self, handle: ObjectHandle, object: Box<dyn SimObject>) {
        if let Some(slot) = self.slots.get_mut(handle.0) {
            if matches!(slot, Slot::Lent) {
                *slot = Slot::Occupied(object);
            }
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Occupied(object) => Some(object.name().to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
