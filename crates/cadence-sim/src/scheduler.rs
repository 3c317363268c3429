//! Scan/apply scheduler
//!
//! One tick runs in two halves separated by a strict barrier:
//!
//! 1. **Scan**: every sim object, then every live entity, observes the
//!    pre-tick world and proposes actions into a shared buffer.
//! 2. **Apply**: the buffer is flushed into per-entity queues, sim objects
//!    run their `update`, and each entity executes its queue in FIFO order.
//!
//! Afterwards unconsumed input edges are dropped and a requested level
//! transition is resolved through the [`StateLoader`].

use crate::action::{Action, ActionBuffer, ActionQueue, TouchedSet};
use crate::behavior::Behavior;
use crate::collab::{ProximityRayCaster, RayCaster, StateLoader};
use crate::config::SimConfig;
use crate::context::{ScanContext, SimState};
use crate::object::{ObjectContext, ObjectHandle, SimObject, SimObjectRegistry, UpdateContext};
use cadence_core::{CadenceError, EntityId, Result, Transform};
use cadence_ecs::{EntityWorld, Phase};
use cadence_runtime::{InputState, SimEvent};
use log::{debug, info, warn};
use std::collections::HashSet;

/// What a tick changed, for the rendering consumer
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    /// Live entities whose transform changed, in first-change order
    pub touched: Vec<EntityId>,
    pub events: Vec<SimEvent>,
}

pub struct Scheduler {
    world: EntityWorld,
    objects: SimObjectRegistry,
    input: InputState,
    state: SimState,
    config: SimConfig,
    ray_caster: Box<dyn RayCaster>,
    loader: Option<Box<dyn StateLoader>>,
    /// Active (target, toucher) contacts
    contacts: HashSet<(EntityId, EntityId)>,
    ticks: u64,
    /// Simulation time of the most recent tick
    last_time: f64,
}

impl Scheduler {
    pub fn new(config: SimConfig) -> Self {
        let ray_caster = ProximityRayCaster::new(config.use_reach, config.use_radius);
        Self {
            world: EntityWorld::new(),
            objects: SimObjectRegistry::new(),
            input: InputState::new(),
            state: SimState::new(),
            config,
            ray_caster: Box::new(ray_caster),
            loader: None,
            contacts: HashSet::new(),
            ticks: 0,
            last_time: 0.0,
        }
    }

    pub fn set_ray_caster(&mut self, ray_caster: Box<dyn RayCaster>) {
        self.ray_caster = ray_caster;
    }

    pub fn set_state_loader(&mut self, loader: Box<dyn StateLoader>) {
        self.loader = Some(loader);
    }

    // --- Accessors ---

    pub fn world(&self) -> &EntityWorld {
        &self.world
    }

    /// Direct world access for level setup between ticks
    pub fn world_mut(&mut self) -> &mut EntityWorld {
        &mut self.world
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimState {
        &mut self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn objects(&self) -> &SimObjectRegistry {
        &self.objects
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn score(&self) -> i64 {
        self.state.score()
    }

    pub fn camera(&self) -> Option<EntityId> {
        self.state.camera
    }

    pub fn set_camera(&mut self, camera: Option<EntityId>) {
        self.state.camera = camera;
    }

    /// Snapshot of an entity's behavior
    pub fn behavior(&self, id: EntityId) -> Option<Behavior> {
        self.world.get::<Behavior>(id).map(|b| Behavior::clone(&b))
    }

    // --- Setup ---

    /// Spawn an entity with a behavior. The transform is first settled into
    /// the behavior's resting pose.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        behavior: Behavior,
    ) -> Result<EntityId> {
        let id = self
            .world
            .spawn_with_transform(name, behavior.settle(transform))?;
        self.world.insert(id, behavior)?;
        self.world.insert(id, ActionQueue::default())?;
        Ok(id)
    }

    /// Replace an entity's behavior (level setup resolving name references)
    pub fn set_behavior(&mut self, id: EntityId, behavior: Behavior) -> Result<()> {
        self.world.insert(id, behavior)
    }

    pub fn register_object(&mut self, object: Box<dyn SimObject>) -> ObjectHandle {
        debug!("registered sim object {}", object.name());
        self.objects.register(object)
    }

    pub fn deregister_object(&mut self, handle: ObjectHandle) -> bool {
        self.objects.deregister(handle)
    }

    /// Drop the whole level: entities, sim objects, contacts and camera.
    /// The score survives.
    pub fn reset_level(&mut self) {
        self.world.clear();
        self.objects.clear();
        self.contacts.clear();
        self.state.camera = None;
        self.state.take_state_request();
    }

    // --- Entity operations ---

    /// Append an action to an entity's queue for the next apply phase.
    /// Actions for dead entities are dropped.
    pub fn enqueue_action(&mut self, id: EntityId, action: Action) -> Result<()> {
        if self.world.is_dead(id) {
            debug!("dropping {:?} for dead entity {}", action, id);
            return Ok(());
        }
        self.world
            .get_mut::<ActionQueue>(id)
            .ok_or_else(|| CadenceError::EntityNotFound(id.to_string()))?
            .push(action);
        Ok(())
    }

    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<()> {
        self.world.add_child(parent, child)
    }

    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> Result<bool> {
        self.world.remove_child(parent, child)
    }

    /// Kill an entity, awarding its score value when `notify_score` is set.
    /// Returns false when it was already dead.
    pub fn kill(&mut self, id: EntityId, notify_score: bool) -> Result<bool> {
        if self.world.is_dead(id) {
            return Ok(false);
        }
        let points = self
            .world
            .get::<Behavior>(id)
            .map(|b| b.score_value())
            .unwrap_or(0);

        if !self.world.kill(id)? {
            return Ok(false);
        }
        if notify_score {
            self.state.add_score(id, points);
        }
        self.state.events.push(SimEvent::EntityKilled(id));
        self.contacts
            .retain(|(target, toucher)| *target != id && *toucher != id);
        if self.state.camera == Some(id) {
            self.state.camera = None;
        }
        Ok(true)
    }

    // --- Contact notification ---

    /// `toucher` came into contact with `target`. Repeated notifications for
    /// an active contact are ignored.
    pub fn start_touch(&mut self, target: EntityId, toucher: EntityId) -> Result<()> {
        if !self.contacts.insert((target, toucher)) {
            return Ok(());
        }
        if !self.world.is_alive(target) || !self.world.is_alive(toucher) {
            debug!("ignoring touch between {} and {}", target, toucher);
            self.contacts.remove(&(target, toucher));
            return Ok(());
        }

        let actions = self
            .world
            .get::<Behavior>(target)
            .map(|b| b.start_touch(target, toucher))
            .unwrap_or_default();
        for action in actions {
            self.enqueue_action(target, action)?;
        }
        self.state
            .events
            .push(SimEvent::TouchStarted { target, toucher });
        Ok(())
    }

    /// `toucher` left `target`. Ignored when no contact is active.
    pub fn end_touch(&mut self, target: EntityId, toucher: EntityId) -> Result<()> {
        if !self.contacts.remove(&(target, toucher)) {
            return Ok(());
        }
        if !self.world.is_alive(target) {
            return Ok(());
        }

        let actions = self
            .world
            .get::<Behavior>(target)
            .map(|b| b.end_touch(target, toucher))
            .unwrap_or_default();
        for action in actions {
            self.enqueue_action(target, action)?;
        }
        self.state
            .events
            .push(SimEvent::TouchEnded { target, toucher });
        Ok(())
    }

    // --- Tick ---

    /// Run one scan/apply tick. `dt` is the time since the previous tick,
    /// `total_time` the simulation time of this one.
    pub fn tick(&mut self, dt: f64, total_time: f64) -> Result<TickReport> {
        self.last_time = total_time;
        let mut buffer = ActionBuffer::new();

        self.world.set_phase(Phase::Scan);
        self.scan_objects(dt, total_time, &mut buffer);
        let faults = self.scan_entities(dt, total_time, &mut buffer);

        self.world.set_phase(Phase::Apply);
        for (id, action) in buffer.drain() {
            if let Err(e) = self.enqueue_action(id, action) {
                warn!("dropping {:?}: {}", action, e);
            }
        }
        for (id, message) in faults {
            self.fault(id, message);
        }

        self.update_objects(total_time);
        let mut touched = TouchedSet::new();
        for id in self.world.scan_order() {
            if self.world.is_alive(id) {
                self.apply_queued(id, total_time, &mut touched);
            }
        }

        self.world.set_phase(Phase::Idle);
        self.input.end_tick();
        self.ticks += 1;
        self.resolve_state_request();

        let touched: Vec<EntityId> = touched
            .into_vec()
            .into_iter()
            .filter(|id| self.world.is_alive(*id))
            .collect();
        debug!("tick {} touched {} entities", self.ticks, touched.len());
        Ok(TickReport {
            touched,
            events: self.state.events.drain(),
        })
    }

    fn scan_objects(&mut self, dt: f64, total_time: f64, buffer: &mut ActionBuffer) {
        for handle in self.objects.handles() {
            let Some(mut object) = self.objects.take(handle) else {
                continue;
            };
            let mut ctx = ObjectContext::new(
                dt,
                total_time,
                &self.world,
                &mut self.input,
                buffer,
                self.state.camera,
                &*self.ray_caster,
                &self.config,
            );
            let result = object.scan(&mut ctx);
            let retiring = ctx.is_retiring();

            if let Err(e) = result {
                warn!("sim object {} scan failed: {}", object.name(), e);
            }
            if retiring {
                debug!("sim object {} retired", object.name());
                self.objects.deregister(handle);
            } else {
                self.objects.restore(handle, object);
            }
        }
    }

    /// Scan every live entity. A failing scan contributes no actions and is
    /// reported back as a fault.
    fn scan_entities(
        &self,
        dt: f64,
        total_time: f64,
        buffer: &mut ActionBuffer,
    ) -> Vec<(EntityId, String)> {
        let ctx = ScanContext {
            dt,
            total_time,
            world: &self.world,
            input: &self.input,
            config: &self.config,
        };

        let mut faults = Vec::new();
        for id in self.world.scan_order() {
            let (Some(behavior), Some(transform)) =
                (self.world.get::<Behavior>(id), self.world.transform(id))
            else {
                continue;
            };
            let mut local = ActionBuffer::new();
            match behavior.scan(id, &transform, &ctx, &mut local) {
                Ok(()) => buffer.extend(local.drain()),
                Err(e) => faults.push((id, e.to_string())),
            }
        }
        faults
    }

    fn update_objects(&mut self, total_time: f64) {
        for handle in self.objects.handles() {
            let Some(mut object) = self.objects.take(handle) else {
                continue;
            };
            let mut ctx = UpdateContext {
                total_time,
                world: &self.world,
                state: &mut self.state,
            };
            if let Err(e) = object.update(&mut ctx) {
                warn!("sim object {} update failed: {}", object.name(), e);
            }
            self.objects.restore(handle, object);
        }
    }

    /// Execute an entity's queue in FIFO order. A kill discards whatever is
    /// left behind it.
    fn apply_queued(&mut self, id: EntityId, now: f64, touched: &mut TouchedSet) {
        let queue = match self.world.get_mut::<ActionQueue>(id) {
            Some(queue) => queue.take(),
            None => return,
        };

        for action in queue {
            match self.apply_action(id, action, now, touched) {
                Ok(()) => {
                    if action.moves_entity() {
                        touched.insert(id);
                    }
                }
                Err(CadenceError::DanglingReference(target)) => {
                    debug!("{} skipped {:?}: {} is dead", id, action, target);
                }
                Err(e) => self.fault(id, e.to_string()),
            }
            if !self.world.is_alive(id) {
                touched.remove(id);
                break;
            }
        }
    }

    fn apply_action(
        &mut self,
        id: EntityId,
        action: Action,
        now: f64,
        touched: &mut TouchedSet,
    ) -> Result<()> {
        match action {
            Action::Translate(delta) => self.world.translate(id, delta),
            Action::SetPosition(position) => self.world.set_position(id, position),
            Action::Rotate(delta) => self.world.rotate(id, delta),
            Action::AttachChild(child) => {
                self.world.add_child(id, child)?;
                touched.insert(child);
                Ok(())
            }
            Action::DetachChild(child) => {
                if self.world.remove_child(id, child)? {
                    touched.insert(child);
                }
                Ok(())
            }
            Action::Kill { notify_score } => self.kill(id, notify_score).map(|_| ()),
            Action::Signal(signal) => {
                let behavior = self
                    .world
                    .get_mut::<Behavior>(id)
                    .ok_or_else(|| CadenceError::EntityNotFound(id.to_string()))?;
                if !behavior.apply_signal(signal, now) {
                    debug!("{} ({}) ignored {:?}", id, behavior.kind(), signal);
                }
                Ok(())
            }
            Action::Step(step) => self
                .world
                .get_mut::<Behavior>(id)
                .ok_or_else(|| CadenceError::EntityNotFound(id.to_string()))?
                .apply_step(step),
        }
    }

    fn fault(&mut self, id: EntityId, message: String) {
        warn!("entity {} faulted: {}", id, message);
        self.state.events.push(SimEvent::ActionFault {
            entity: id,
            message,
        });
        if self.config.kill_on_fault {
            if let Err(e) = self.kill(id, false) {
                warn!("could not kill faulted entity {}: {}", id, e);
            }
        }
    }

    /// A failed transition leaves the current level running and reports a
    /// `StateFailed` event instead of failing the tick.
    fn resolve_state_request(&mut self) {
        let Some(path) = self.state.take_state_request() else {
            return;
        };
        let Some(mut loader) = self.loader.take() else {
            warn!("no state loader, ignoring request for {}", path);
            return;
        };

        let result = loader
            .load_state(&path)
            .and_then(|handle| loader.set_state(handle, self));
        if self.loader.is_none() {
            self.loader = Some(loader);
        }

        match result {
            Ok(()) => {
                info!("Loaded {}", path);
                self.state.events.push(SimEvent::StateLoaded(path));
            }
            Err(e) => {
                warn!("failed to load {}: {}", path, e);
                self.state.events.push(SimEvent::StateFailed {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }

    /// Time of the most recent tick
    pub fn last_time(&self) -> f64 {
        self.last_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Signal, Step};
    use crate::behavior::{Button, Coin, Conveyor, FallingPlatform, Platform, Ripple, Static};
    use crate::collab::StateHandle;
    use crate::watchers::{DeathWatcher, UseScanner};
    use cadence_core::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn scheduler() -> Scheduler {
        Scheduler::new(SimConfig::default())
    }

    fn spawn_static(s: &mut Scheduler, name: &str, position: Vec3) -> EntityId {
        s.spawn(name, Transform::from_position(position), Behavior::Static(Static))
            .unwrap()
    }

    fn z_of(s: &Scheduler, id: EntityId) -> f32 {
        s.world().position(id).unwrap().z
    }

    /// Records what the world looked like during each scan
    struct ChildRecorder {
        parent: EntityId,
        seen: Rc<RefCell<Vec<Vec<EntityId>>>>,
    }

    impl SimObject for ChildRecorder {
        fn name(&self) -> &str {
            "child_recorder"
        }

        fn scan(&mut self, ctx: &mut ObjectContext<'_>) -> Result<()> {
            self.seen
                .borrow_mut()
                .push(ctx.world.children(self.parent).to_vec());
            Ok(())
        }
    }

    struct OneShot {
        scans: Rc<RefCell<u32>>,
    }

    impl SimObject for OneShot {
        fn name(&self) -> &str {
            "one_shot"
        }

        fn scan(&mut self, ctx: &mut ObjectContext<'_>) -> Result<()> {
            *self.scans.borrow_mut() += 1;
            ctx.retire();
            Ok(())
        }
    }

    struct RecordingLoader {
        loaded: Rc<RefCell<Vec<String>>>,
    }

    impl StateLoader for RecordingLoader {
        fn load_state(&mut self, path: &str) -> Result<StateHandle> {
            self.loaded.borrow_mut().push(path.to_string());
            Ok(StateHandle(7))
        }

        fn set_state(&mut self, handle: StateHandle, scheduler: &mut Scheduler) -> Result<()> {
            assert_eq!(handle, StateHandle(7));
            scheduler.reset_level();
            let player = scheduler.spawn("player", Transform::IDENTITY, Behavior::default())?;
            scheduler.set_camera(Some(player));
            Ok(())
        }
    }

    #[test]
    fn test_killed_entity_leaves_scan_set_and_parent() {
        let mut s = scheduler();
        let parent = spawn_static(&mut s, "parent", Vec3::ZERO);
        let child = spawn_static(&mut s, "child", Vec3::ONE);
        s.add_child(parent, child).unwrap();

        assert!(s.kill(child, false).unwrap());
        assert!(!s.world().scan_order().contains(&child));
        assert!(s.world().children(parent).is_empty());

        // Idempotent
        assert!(!s.kill(child, false).unwrap());
        let report = s.tick(0.1, 0.1).unwrap();
        assert!(!report.touched.contains(&child));
    }

    #[test]
    fn test_kill_unknown_entity_errors() {
        let mut s = scheduler();
        assert!(matches!(
            s.kill(EntityId::from_raw(999_999), false),
            Err(CadenceError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_scan_sees_tick_start_hierarchy() {
        let mut s = scheduler();
        let platform = s
            .spawn(
                "platform",
                Transform::IDENTITY,
                Behavior::Platform(Platform::new(Vec3::UP, 2.0)),
            )
            .unwrap();
        let player = spawn_static(&mut s, "player", Vec3::new(0.0, 0.0, 1.0));
        let seen = Rc::new(RefCell::new(Vec::new()));
        s.register_object(Box::new(ChildRecorder {
            parent: platform,
            seen: seen.clone(),
        }));

        s.start_touch(platform, player).unwrap();
        // Queued attach is not visible until the apply phase
        assert!(s.world().children(platform).is_empty());
        s.tick(0.1, 0.1).unwrap();
        assert_eq!(s.world().children(platform), &[player]);
        s.tick(0.1, 0.2).unwrap();

        assert_eq!(*seen.borrow(), vec![vec![], vec![player]]);
    }

    #[test]
    fn test_touch_dedup_and_detach() {
        let mut s = scheduler();
        let a = s
            .spawn("a", Transform::IDENTITY, Behavior::Platform(Platform::new(Vec3::UP, 2.0)))
            .unwrap();
        let b = s
            .spawn("b", Transform::IDENTITY, Behavior::Platform(Platform::new(Vec3::UP, 2.0)))
            .unwrap();
        let player = spawn_static(&mut s, "player", Vec3::new(3.0, 0.0, 1.0));

        s.start_touch(a, player).unwrap();
        s.start_touch(a, player).unwrap();
        let report = s.tick(0.1, 0.1).unwrap();
        let touch_events = report
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::TouchStarted { .. }))
            .count();
        assert_eq!(touch_events, 1);
        assert_eq!(s.world().parent(player), Some(a));

        // Reattaching elsewhere detaches from the old parent
        s.start_touch(b, player).unwrap();
        s.tick(0.1, 0.2).unwrap();
        assert_eq!(s.world().parent(player), Some(b));
        assert!(s.world().children(a).is_empty());

        s.end_touch(b, player).unwrap();
        s.tick(0.1, 0.3).unwrap();
        assert_eq!(s.world().parent(player), None);
        assert!(s
            .world()
            .world_position(player)
            .unwrap()
            .distance(&Vec3::new(3.0, 0.0, 1.0))
            < 1e-4);
    }

    #[test]
    fn test_platform_cycle_through_ticks() {
        let mut s = scheduler();
        let start = Vec3::new(0.0, 0.0, 5.0);
        let platform = s
            .spawn(
                "platform",
                Transform::from_position(start),
                Behavior::Platform(Platform::new(Vec3::new(0.0, 0.0, 10.0), 4.0).running()),
            )
            .unwrap();

        let report = s.tick(0.5, 1.0).unwrap();
        assert!(s.world().position(platform).unwrap().distance(&start) < 1e-4);
        assert_eq!(report.touched, vec![platform]);

        s.tick(2.0, 3.0).unwrap();
        assert!((z_of(&s, platform) - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_rider_moves_with_platform() {
        let mut s = scheduler();
        let platform = s
            .spawn(
                "platform",
                Transform::IDENTITY,
                Behavior::Platform(Platform::new(Vec3::new(0.0, 0.0, 10.0), 4.0).running()),
            )
            .unwrap();
        let player = spawn_static(&mut s, "player", Vec3::new(1.0, 0.0, 1.0));
        s.start_touch(platform, player).unwrap();

        s.tick(0.1, 0.0).unwrap();
        s.tick(2.0, 2.0).unwrap();
        let rider = s.world().world_position(player).unwrap();
        assert!(rider.distance(&Vec3::new(1.0, 0.0, 11.0)) < 1e-3);
    }

    #[test]
    fn test_falling_platform_grace_then_gravity() {
        let mut s = scheduler();
        let gravity = s.config().gravity;
        let platform = s
            .spawn(
                "falling",
                Transform::IDENTITY,
                Behavior::FallingPlatform(FallingPlatform::new()),
            )
            .unwrap();

        s.enqueue_action(platform, Action::Signal(Signal::BeginFall))
            .unwrap();
        s.tick(0.1, 5.0).unwrap();
        for total in [6.0, 6.5, 6.9] {
            s.tick(0.1, total).unwrap();
            assert_eq!(z_of(&s, platform), 0.0);
        }

        s.tick(0.1, 7.0).unwrap();
        assert_eq!(z_of(&s, platform), 0.0);

        s.tick(1.0, 8.0).unwrap();
        assert!((z_of(&s, platform) - gravity).abs() < 1e-4);
        match s.behavior(platform) {
            Some(Behavior::FallingPlatform(f)) => assert_eq!(f.velocity(), gravity),
            other => panic!("unexpected behavior {:?}", other),
        }
    }

    #[test]
    fn test_falling_platform_tick_straddling_grace_end() {
        let mut s = scheduler();
        let gravity = s.config().gravity;
        let platform = s
            .spawn(
                "falling",
                Transform::IDENTITY,
                Behavior::FallingPlatform(FallingPlatform::new()),
            )
            .unwrap();

        s.enqueue_action(platform, Action::Signal(Signal::BeginFall))
            .unwrap();
        s.tick(0.1, 5.0).unwrap();
        s.tick(1.5, 6.5).unwrap();
        s.tick(1.0, 7.5).unwrap();

        match s.behavior(platform) {
            Some(Behavior::FallingPlatform(f)) => {
                assert!((f.velocity() - gravity * 0.5).abs() < 1e-4)
            }
            other => panic!("unexpected behavior {:?}", other),
        }
        assert!((z_of(&s, platform) - gravity * 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_coin_touch_awards_score() {
        let mut s = scheduler();
        let coin = s
            .spawn("coin", Transform::IDENTITY, Behavior::Coin(Coin::new(100, 3.0)))
            .unwrap();
        let player = spawn_static(&mut s, "player", Vec3::ZERO);

        s.start_touch(coin, player).unwrap();
        let report = s.tick(0.1, 0.1).unwrap();

        assert_eq!(s.score(), 100);
        assert!(s.world().is_dead(coin));
        assert!(!report.touched.contains(&coin));
        assert!(report.events.contains(&SimEvent::EntityKilled(coin)));

        // The contact died with the coin
        s.end_touch(coin, player).unwrap();
    }

    #[test]
    fn test_kill_discards_rest_of_queue() {
        let mut s = scheduler();
        let doomed = spawn_static(&mut s, "doomed", Vec3::ZERO);
        s.enqueue_action(doomed, Action::Kill { notify_score: false })
            .unwrap();
        s.enqueue_action(doomed, Action::Translate(Vec3::ONE))
            .unwrap();

        let report = s.tick(0.1, 0.1).unwrap();
        assert!(s.world().is_dead(doomed));
        assert!(report.touched.is_empty());

        // Later actions for it are dropped quietly
        s.enqueue_action(doomed, Action::Translate(Vec3::ONE))
            .unwrap();
    }

    #[test]
    fn test_attach_to_dead_toucher_is_skipped() {
        let mut s = scheduler();
        let platform = s
            .spawn("platform", Transform::IDENTITY, Behavior::Platform(Platform::new(Vec3::UP, 2.0)))
            .unwrap();
        let player = spawn_static(&mut s, "player", Vec3::ZERO);
        s.start_touch(platform, player).unwrap();
        s.kill(player, false).unwrap();

        let report = s.tick(0.1, 0.1).unwrap();
        assert!(s.world().children(platform).is_empty());
        assert!(!report
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::ActionFault { .. })));
    }

    #[test]
    fn test_fault_is_isolated() {
        let mut s = Scheduler::new(SimConfig {
            kill_on_fault: true,
            ..SimConfig::default()
        });
        let broken = s
            .spawn(
                "broken",
                Transform::IDENTITY,
                Behavior::Platform(Platform::new(Vec3::UP, 0.0).running()),
            )
            .unwrap();
        let coin = s
            .spawn("coin", Transform::IDENTITY, Behavior::Coin(Coin::new(100, 3.0)))
            .unwrap();

        let report = s.tick(0.1, 0.1).unwrap();
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::ActionFault { entity, .. } if *entity == broken)));
        assert!(s.world().is_dead(broken));
        assert_eq!(report.touched, vec![coin]);
    }

    #[test]
    fn test_mismatched_step_faults_without_kill() {
        let mut s = scheduler();
        let coin = s
            .spawn("coin", Transform::IDENTITY, Behavior::Coin(Coin::new(100, 3.0)))
            .unwrap();
        s.enqueue_action(coin, Action::Step(Step::Pressed(true)))
            .unwrap();

        let report = s.tick(0.1, 0.1).unwrap();
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::ActionFault { .. })));
        assert!(s.world().is_alive(coin));
    }

    #[test]
    fn test_object_retires_during_scan() {
        let mut s = scheduler();
        let scans = Rc::new(RefCell::new(0));
        let handle = s.register_object(Box::new(OneShot {
            scans: scans.clone(),
        }));

        s.tick(0.1, 0.1).unwrap();
        s.tick(0.1, 0.2).unwrap();
        assert_eq!(*scans.borrow(), 1);
        assert!(!s.objects().is_registered(handle));
    }

    #[test]
    fn test_use_button_starts_platform() {
        let mut s = scheduler();
        let camera = spawn_static(&mut s, "camera", Vec3::ZERO);
        let lift = s
            .spawn(
                "lift",
                Transform::from_position(Vec3::new(0.0, 20.0, 0.0)),
                Behavior::Platform(Platform::new(Vec3::new(0.0, 0.0, 8.0), 4.0)),
            )
            .unwrap();
        s.spawn(
            "switch",
            Transform::from_position(Vec3::new(3.0, 0.0, 0.0)),
            Behavior::Button(Button::new(vec![lift], Signal::Start, 0.25)),
        )
        .unwrap();
        s.set_camera(Some(camera));
        s.register_object(Box::new(UseScanner::new("e")));

        s.input_mut().press("e");
        s.tick(0.1, 0.1).unwrap();
        match s.behavior(lift) {
            Some(Behavior::Platform(p)) => {
                assert_eq!(p.state(), crate::behavior::PlatformState::Cycling)
            }
            other => panic!("unexpected behavior {:?}", other),
        }

        // Anchored on the next scan, at the far end half a cycle later
        s.tick(0.1, 0.2).unwrap();
        assert!(z_of(&s, lift).abs() < 1e-4);
        s.tick(2.0, 2.2).unwrap();
        assert!((z_of(&s, lift) - 8.0).abs() < 1e-3);
    }

    #[test]
    fn test_conveyor_carries_rider() {
        let mut s = scheduler();
        let belt = s
            .spawn(
                "belt",
                Transform::IDENTITY,
                Behavior::Conveyor(Conveyor::new(Vec3::new(2.0, 0.0, 0.0))),
            )
            .unwrap();
        let player = spawn_static(&mut s, "player", Vec3::ZERO);
        s.start_touch(belt, player).unwrap();

        s.tick(1.0, 1.0).unwrap();
        s.tick(1.0, 2.0).unwrap();
        assert!(s.world().position(player).unwrap().distance(&Vec3::new(2.0, 0.0, 0.0)) < 1e-5);

        // The rider list changes in the apply phase, after this tick's scan
        s.end_touch(belt, player).unwrap();
        s.tick(1.0, 3.0).unwrap();
        let off = s.world().position(player).unwrap();
        s.tick(1.0, 4.0).unwrap();
        assert_eq!(s.world().position(player), Some(off));
    }

    #[test]
    fn test_ripple_reaches_targets_in_turn() {
        let mut s = scheduler();
        let first = s
            .spawn("first", Transform::IDENTITY, Behavior::FallingPlatform(FallingPlatform::new()))
            .unwrap();
        let second = s
            .spawn("second", Transform::IDENTITY, Behavior::FallingPlatform(FallingPlatform::new()))
            .unwrap();
        let ripple = s
            .spawn(
                "ripple",
                Transform::IDENTITY,
                Behavior::Ripple(Ripple::new(vec![first, second], 1.0, Signal::BeginFall)),
            )
            .unwrap();

        s.enqueue_action(ripple, Action::Signal(Signal::Start)).unwrap();
        s.tick(0.1, 0.0).unwrap();
        s.tick(0.1, 0.5).unwrap();

        let started = |s: &Scheduler, id| match s.behavior(id) {
            Some(Behavior::FallingPlatform(f)) => f.fall_started_at(),
            _ => None,
        };
        assert_eq!(started(&s, first), Some(0.5));
        assert_eq!(started(&s, second), None);

        s.tick(0.6, 1.1).unwrap();
        assert_eq!(started(&s, second), None);
        s.tick(0.4, 1.5).unwrap();
        assert_eq!(started(&s, second), Some(1.5));
    }

    #[test]
    fn test_death_watcher_reloads_level() {
        let mut s = scheduler();
        let loaded = Rc::new(RefCell::new(Vec::new()));
        s.set_state_loader(Box::new(RecordingLoader {
            loaded: loaded.clone(),
        }));
        let coin = s
            .spawn("coin", Transform::IDENTITY, Behavior::Coin(Coin::new(100, 3.0)))
            .unwrap();
        let camera = spawn_static(&mut s, "camera", Vec3::new(0.0, 0.0, -500.0));
        s.set_camera(Some(camera));
        s.register_object(Box::new(DeathWatcher::new(-100.0, "levels/one.toml")));
        s.kill(coin, true).unwrap();

        let report = s.tick(0.1, 0.1).unwrap();
        assert_eq!(*loaded.borrow(), vec!["levels/one.toml".to_string()]);
        assert!(report
            .events
            .contains(&SimEvent::StateLoaded("levels/one.toml".into())));
        assert!(s.world().get_id("player").is_some());
        assert!(s.objects().is_empty());
        assert_eq!(s.score(), 100);
    }

    #[test]
    fn test_state_request_without_loader_is_dropped() {
        let mut s = scheduler();
        s.state_mut().request_state("levels/one.toml");
        s.tick(0.1, 0.1).unwrap();
        assert_eq!(s.state().pending_state(), None);
    }

    #[test]
    fn test_failed_reload_still_reports_tick() {
        let mut s = scheduler();
        s.set_state_loader(Box::new(crate::level::TomlStateLoader::new()));
        let coin = s
            .spawn("coin", Transform::IDENTITY, Behavior::Coin(Coin::new(100, 3.0)))
            .unwrap();
        s.state_mut().request_state("no/such/level.toml");

        let report = s.tick(0.1, 0.1).unwrap();
        assert!(report.touched.contains(&coin));
        assert!(report
            .events
            .contains(&SimEvent::StateRequested("no/such/level.toml".into())));
        assert!(report.events.iter().any(|e| matches!(
            e,
            SimEvent::StateFailed { path, .. } if path == "no/such/level.toml"
        )));
        assert!(s.world().is_alive(coin));
        assert_eq!(s.state().pending_state(), None);

        let next = s.tick(0.1, 0.2).unwrap();
        assert!(next.events.is_empty());
    }

    #[test]
    fn test_press_edge_dropped_at_end_of_tick() {
        let mut s = scheduler();
        s.input_mut().press("e");
        s.tick(0.1, 0.1).unwrap();
        assert!(s.input().is_button_down("e"));
        assert_eq!(
            s.input_mut().take_button_event("e"),
            cadence_runtime::ButtonEvent::None
        );
    }
}
