//! EntityWorld - entity arena with stable IDs and an ownership tree

use crate::entity::EntityInfo;
use bimap::BiMap;
use cadence_core::{
    mat4_inverse_affine, mat4_mul, mat4_translation, CadenceError, EntityId, Result, Transform,
    Vec3,
};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Which half of a tick the world is currently in.
///
/// Transforms may only be mutated while applying queued actions; the
/// ownership tree may be edited during setup (`Idle`) or `Apply`, never
/// during `Scan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Between ticks: level setup, contact notifications, state loading
    #[default]
    Idle,
    /// Read-only observation
    Scan,
    /// Queued actions executing
    Apply,
}

/// Explicit scan/apply ordering key. Lower runs first; ties keep
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Priority(pub i32);

/// The entity arena for Cadence
///
/// Wraps hecs::World with:
/// - Stable EntityId handles that are never reused
/// - Named entity lookup
/// - A parent/child tree that cannot contain cycles
/// - Phase-guarded transform mutation
pub struct EntityWorld {
    /// The underlying hecs world
    world: hecs::World,
    /// Bidirectional mapping: EntityId <-> hecs::Entity
    id_map: BiMap<EntityId, hecs::Entity>,
    /// Entity name <-> EntityId
    names: BiMap<String, EntityId>,
    /// Parent relationships: child -> parent
    parents: HashMap<EntityId, EntityId>,
    /// Children in attach order: parent -> children
    children: HashMap<EntityId, Vec<EntityId>>,
    /// Live entities in registration order
    order: Vec<EntityId>,
    /// Killed entities; handles resolve to `DanglingReference`
    dead: HashSet<EntityId>,
    phase: Phase,
}

impl Default for EntityWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityWorld {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            world: hecs::World::new(),
            id_map: BiMap::new(),
            names: BiMap::new(),
            parents: HashMap::new(),
            children: HashMap::new(),
            order: Vec::new(),
            dead: HashSet::new(),
            phase: Phase::Idle,
        }
    }

    /// Current tick phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Enter a tick phase. Driven by the scheduler.
    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Spawn a new entity with a name at the origin
    pub fn spawn(&mut self, name: impl Into<String>) -> Result<EntityId> {
        self.spawn_with_transform(name, Transform::IDENTITY)
    }

    /// Spawn a new entity with a name and an initial transform
    pub fn spawn_with_transform(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<EntityId> {
        let name = name.into();
        self.guard_tree("spawn")?;

        if self.names.contains_left(&name) {
            return Err(CadenceError::DuplicateEntityName(name));
        }

        let id = EntityId::new();
        self.insert_entity(id, name, transform);
        Ok(id)
    }

    fn insert_entity(&mut self, id: EntityId, name: String, transform: Transform) {
        let hecs_entity = self.world.spawn((transform, Priority::default()));
        self.id_map.insert(id, hecs_entity);
        self.names.insert(name, id);
        self.order.push(id);
    }

    /// Attach an arbitrary component to an entity, replacing any previous one
    pub fn insert<C: hecs::Component>(&mut self, id: EntityId, component: C) -> Result<()> {
        self.guard_tree("insert component")?;
        let entity = self.resolve(id)?;
        self.world
            .insert_one(entity, component)
            .map_err(|_| CadenceError::EntityNotFound(id.to_string()))
    }

    /// Borrow a component immutably
    pub fn get<C: hecs::Component>(&self, id: EntityId) -> Option<hecs::Ref<'_, C>> {
        let entity = self.id_map.get_by_left(&id)?;
        self.world.get::<&C>(*entity).ok()
    }

    /// Borrow a component mutably
    pub fn get_mut<C: hecs::Component>(&mut self, id: EntityId) -> Option<&mut C> {
        let entity = *self.id_map.get_by_left(&id)?;
        self.world.query_one_mut::<&mut C>(entity).ok()
    }

    /// Check whether an entity carries a component
    pub fn has<C: hecs::Component>(&self, id: EntityId) -> bool {
        self.get::<C>(id).is_some()
    }

    /// Get a copy of an entity's local transform
    pub fn transform(&self, id: EntityId) -> Option<Transform> {
        self.get::<Transform>(id).map(|t| *t)
    }

    /// Get an entity's local position
    pub fn position(&self, id: EntityId) -> Option<Vec3> {
        self.transform(id).map(|t| t.position)
    }

    /// Replace an entity's transform during level setup
    pub fn place(&mut self, id: EntityId, transform: Transform) -> Result<()> {
        if self.phase != Phase::Idle {
            return Err(CadenceError::InvalidTransition(format!(
                "place {} outside setup",
                id
            )));
        }
        *self.transform_mut(id)? = transform;
        Ok(())
    }

    /// Move an entity by `delta`. Valid only while applying queued actions.
    pub fn translate(&mut self, id: EntityId, delta: Vec3) -> Result<()> {
        self.guard_apply("translate", id)?;
        self.transform_mut(id)?.position += delta;
        Ok(())
    }

    /// Set an entity's local position. Valid only while applying queued actions.
    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> Result<()> {
        self.guard_apply("set_position", id)?;
        self.transform_mut(id)?.position = position;
        Ok(())
    }

    /// Rotate an entity by `delta` Euler degrees. Valid only while applying
    /// queued actions.
    pub fn rotate(&mut self, id: EntityId, delta: Vec3) -> Result<()> {
        self.guard_apply("rotate", id)?;
        self.transform_mut(id)?.rotation += delta;
        Ok(())
    }

    fn transform_mut(&mut self, id: EntityId) -> Result<&mut Transform> {
        let entity = self.resolve(id)?;
        self.world
            .query_one_mut::<&mut Transform>(entity)
            .map_err(|_| CadenceError::EntityNotFound(id.to_string()))
    }

    /// Set the scan/apply ordering key of an entity
    pub fn set_priority(&mut self, id: EntityId, priority: i32) -> Result<()> {
        self.guard_tree("set priority")?;
        let entity = self.resolve(id)?;
        let slot = self
            .world
            .query_one_mut::<&mut Priority>(entity)
            .map_err(|_| CadenceError::EntityNotFound(id.to_string()))?;
        *slot = Priority(priority);
        Ok(())
    }

    /// Live entities in scan/apply order: ascending priority, then
    /// registration order.
    pub fn scan_order(&self) -> Vec<EntityId> {
        let mut ids = self.order.clone();
        ids.sort_by_key(|id| self.get::<Priority>(*id).map(|p| *p).unwrap_or_default());
        ids
    }

    // --- Hierarchy ---

    /// Get parent of an entity
    pub fn parent(&self, child: EntityId) -> Option<EntityId> {
        self.parents.get(&child).copied()
    }

    /// Get children of an entity in attach order
    pub fn children(&self, parent: EntityId) -> &[EntityId] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True if `ancestor` appears on `node`'s parent chain (or is `node`)
    pub fn is_descendant_of(&self, node: EntityId, ancestor: EntityId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parents.get(&id).copied();
        }
        false
    }

    /// Attach `child` under `parent`.
    ///
    /// A child that already has a parent is detached from it first. The
    /// child's world position is preserved. Attaching an entity under itself
    /// or one of its descendants fails with `CyclicParent` and leaves the
    /// tree unchanged.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<()> {
        self.guard_tree("add_child")?;
        self.resolve(parent)?;
        self.resolve(child)?;

        if self.is_descendant_of(parent, child) {
            return Err(CadenceError::CyclicParent {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        if self.parents.get(&child) == Some(&parent) {
            return Ok(());
        }

        let child_world = self.world_matrix(child);
        self.unlink(child);
        self.parents.insert(child, parent);
        self.children.entry(parent).or_default().push(child);

        let parent_inverse = self
            .world_matrix(parent)
            .and_then(|m| mat4_inverse_affine(&m));
        if let (Some(child_world), Some(parent_inverse)) = (child_world, parent_inverse) {
            let local = mat4_mul(&parent_inverse, &child_world);
            self.transform_mut(child)?.position = mat4_translation(&local);
        }

        debug!("attached {} under {}", child, parent);
        Ok(())
    }

    /// Detach `child` from `parent`. Returns false when `child` was not
    /// attached to `parent`. The child keeps its world position.
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> Result<bool> {
        self.guard_tree("remove_child")?;
        self.resolve(parent)?;
        self.resolve(child)?;

        if self.parents.get(&child) != Some(&parent) {
            return Ok(false);
        }
        self.detach_in_place(child)?;
        debug!("detached {} from {}", child, parent);
        Ok(true)
    }

    fn detach_in_place(&mut self, child: EntityId) -> Result<()> {
        let world_position = self.world_position(child);
        self.unlink(child);
        if let Some(position) = world_position {
            self.transform_mut(child)?.position = position;
        }
        Ok(())
    }

    fn unlink(&mut self, child: EntityId) {
        if let Some(old_parent) = self.parents.remove(&child) {
            if let Some(siblings) = self.children.get_mut(&old_parent) {
                siblings.retain(|c| *c != child);
                if siblings.is_empty() {
                    self.children.remove(&old_parent);
                }
            }
        }
    }

    /// Get the world-space transform matrix for an entity, walking the parent chain
    pub fn world_matrix(&self, id: EntityId) -> Option<[[f32; 4]; 4]> {
        let local = self.transform(id)?;
        match self.parents.get(&id) {
            Some(parent_id) => {
                let parent_mat = self.world_matrix(*parent_id)?;
                Some(mat4_mul(&parent_mat, &local.to_matrix()))
            }
            None => Some(local.to_matrix()),
        }
    }

    /// Get the world-space position for an entity
    pub fn world_position(&self, id: EntityId) -> Option<Vec3> {
        let mat = self.world_matrix(id)?;
        Some(mat4_translation(&mat))
    }

    // --- Lifecycle ---

    /// Kill an entity: detach it from its parent, orphan its children (they
    /// keep their world position), and remove it from the arena.
    ///
    /// Returns false when the entity was already dead.
    pub fn kill(&mut self, id: EntityId) -> Result<bool> {
        if self.dead.contains(&id) {
            return Ok(false);
        }
        let entity = self.resolve(id)?;
        self.guard_tree("kill")?;

        // Orphans are re-expressed while this entity still sits in the tree
        let orphans = self.children.get(&id).cloned().unwrap_or_default();
        for orphan in orphans {
            self.detach_in_place(orphan)?;
        }
        self.unlink(id);

        self.world
            .despawn(entity)
            .map_err(|_| CadenceError::EntityNotFound(id.to_string()))?;
        self.id_map.remove_by_left(&id);
        self.names.remove_by_right(&id);
        self.order.retain(|e| *e != id);
        self.children.remove(&id);
        self.dead.insert(id);

        debug!("killed {}", id);
        Ok(true)
    }

    /// Check if an entity is alive
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.id_map.contains_left(&id)
    }

    /// Check if an entity has been killed
    pub fn is_dead(&self, id: EntityId) -> bool {
        self.dead.contains(&id)
    }

    /// Get entity ID by name
    pub fn get_id(&self, name: &str) -> Option<EntityId> {
        self.names.get_by_left(name).copied()
    }

    /// Get entity name by ID
    pub fn get_name(&self, id: EntityId) -> Option<&str> {
        self.names.get_by_right(&id).map(String::as_str)
    }

    /// Check if an entity with name exists
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains_left(name)
    }

    /// Get number of live entities
    pub fn entity_count(&self) -> usize {
        self.order.len()
    }

    /// Get info about all live entities in registration order
    pub fn all_entities(&self) -> Vec<EntityInfo> {
        self.order
            .iter()
            .map(|id| {
                let mut info = EntityInfo::new(*id, self.get_name(*id).unwrap_or_default())
                    .with_children(self.children(*id).len())
                    .with_world_position(self.world_position(*id).unwrap_or_default());
                if let Some(parent) = self.parent(*id).and_then(|p| self.get_name(p)) {
                    info = info.with_parent(parent);
                }
                info
            })
            .collect()
    }

    /// Clear the world, including the record of killed entities
    pub fn clear(&mut self) {
        self.world.clear();
        self.id_map.clear();
        self.names.clear();
        self.parents.clear();
        self.children.clear();
        self.order.clear();
        self.dead.clear();
        self.phase = Phase::Idle;
    }

    fn resolve(&self, id: EntityId) -> Result<hecs::Entity> {
        if let Some(entity) = self.id_map.get_by_left(&id) {
            return Ok(*entity);
        }
        if self.dead.contains(&id) {
            Err(CadenceError::DanglingReference(id.to_string()))
        } else {
            Err(CadenceError::EntityNotFound(id.to_string()))
        }
    }

    fn guard_tree(&self, what: &str) -> Result<()> {
        if self.phase == Phase::Scan {
            return Err(CadenceError::InvalidTransition(format!(
                "{} during scan phase",
                what
            )));
        }
        Ok(())
    }

    fn guard_apply(&self, what: &str, id: EntityId) -> Result<()> {
        if self.phase != Phase::Apply {
            return Err(CadenceError::InvalidTransition(format!(
                "{} on {} outside apply phase",
                what, id
            )));
        }
        Ok(())
    }
}
