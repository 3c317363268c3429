//! Level files
//!
//! A level is a TOML document naming its entities in registration order:
//!
//! ```toml
//! [level]
//! name = "Lift test"
//! camera = "player"
//! use_button = "e"
//! kill_z = -200.0
//!
//! [[entities]]
//! name = "lift"
//! position = [0.0, 10.0, 0.0]
//! behavior = { kind = "platform", movement = [0.0, 0.0, 20.0], cycle_time = 4.0 }
//!
//! [[entities]]
//! name = "switch"
//! position = [4.0, 0.0, 0.0]
//! behavior = { kind = "button", targets = ["lift"], signal = "start" }
//! ```
//!
//! Positions are world-space; a `parent` re-expresses the entity in its
//! parent's frame without moving it. Target lists refer to entity names.

use crate::action::Signal;
use crate::behavior::{
    Behavior, Button, Coin, Conveyor, FallingPlatform, HiddenPlatform, Platform, Ripple, Static,
    Walker,
};
use crate::collab::{StateHandle, StateLoader};
use crate::config::SimConfig;
use crate::scheduler::Scheduler;
use crate::watchers::{DeathWatcher, UseScanner};
use cadence_core::{CadenceError, EntityId, Result, Transform, Vec3};
use cadence_runtime::Axis;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Root structure of a level TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelFile {
    pub level: LevelMetadata,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelMetadata {
    pub name: String,
    /// Entity the player controls and views through
    #[serde(default)]
    pub camera: Option<String>,
    /// Button that casts a use ray from the camera
    #[serde(default)]
    pub use_button: Option<String>,
    /// Falling below this height restarts the level
    #[serde(default)]
    pub kill_z: Option<f32>,
    /// Level to load after a fall; defaults to this file
    #[serde(default)]
    pub respawn: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    #[serde(default)]
    pub position: [f32; 3],
    /// Euler degrees
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub behavior: BehaviorDef,
}

fn default_scale() -> [f32; 3] {
    [1.0; 3]
}

fn default_press_depth() -> f32 {
    0.25
}

fn default_signal() -> Signal {
    Signal::Start
}

fn default_look_scale() -> f32 {
    1.0
}

fn default_keys() -> [String; 4] {
    ["w", "s", "a", "d"].map(String::from)
}

/// Behavior as written in a level file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BehaviorDef {
    #[default]
    Static,
    Coin {
        /// Defaults to the configured coin value
        #[serde(default)]
        value: Option<i64>,
        #[serde(default)]
        spin_rate: Option<f32>,
    },
    Platform {
        movement: [f32; 3],
        cycle_time: f64,
        #[serde(default)]
        running: bool,
    },
    FallingPlatform,
    HiddenPlatform {
        range: f32,
        #[serde(default)]
        hidden_z: f32,
        speed: f32,
        #[serde(default)]
        hidden: bool,
    },
    Conveyor {
        velocity: [f32; 3],
    },
    Button {
        targets: Vec<String>,
        #[serde(default = "default_signal")]
        signal: Signal,
        #[serde(default = "default_press_depth")]
        press_depth: f32,
    },
    Ripple {
        targets: Vec<String>,
        interval: f64,
        #[serde(default = "default_signal")]
        signal: Signal,
    },
    Walker {
        walk_speed: f32,
        #[serde(default = "default_look_scale")]
        look_scale: f32,
        /// Forward, back, left, right
        #[serde(default = "default_keys")]
        keys: [String; 4],
    },
}

impl BehaviorDef {
    /// Entity names this behavior sends signals to
    pub fn targets(&self) -> &[String] {
        match self {
            BehaviorDef::Button { targets, .. } | BehaviorDef::Ripple { targets, .. } => targets,
            _ => &[],
        }
    }

    /// Build the runtime behavior, resolving target names
    pub fn build(
        &self,
        owner: &str,
        names: &HashMap<String, EntityId>,
        config: &SimConfig,
    ) -> Result<Behavior> {
        let resolve = |targets: &[String]| -> Result<Vec<EntityId>> {
            targets
                .iter()
                .map(|target| {
                    names.get(target).copied().ok_or_else(|| {
                        CadenceError::LevelError(format!(
                            "'{}' targets unknown entity '{}'",
                            owner, target
                        ))
                    })
                })
                .collect()
        };

        let behavior = match self {
            BehaviorDef::Static => Behavior::Static(Static),
            BehaviorDef::Coin { value, spin_rate } => Behavior::Coin(Coin::new(
                value.unwrap_or(config.coin_value),
                spin_rate.unwrap_or(config.coin_spin_rate),
            )),
            BehaviorDef::Platform {
                movement,
                cycle_time,
                running,
            } => {
                let platform = Platform::new(Vec3::from_array(*movement), *cycle_time);
                Behavior::Platform(if *running { platform.running() } else { platform })
            }
            BehaviorDef::FallingPlatform => Behavior::FallingPlatform(FallingPlatform::new()),
            BehaviorDef::HiddenPlatform {
                range,
                hidden_z,
                speed,
                hidden,
            } => Behavior::HiddenPlatform(HiddenPlatform::new(*range, *hidden_z, *speed, *hidden)),
            BehaviorDef::Conveyor { velocity } => {
                Behavior::Conveyor(Conveyor::new(Vec3::from_array(*velocity)))
            }
            BehaviorDef::Button {
                targets,
                signal,
                press_depth,
            } => Behavior::Button(Button::new(resolve(targets.as_slice())?, *signal, *press_depth)),
            BehaviorDef::Ripple {
                targets,
                interval,
                signal,
            } => Behavior::Ripple(Ripple::new(resolve(targets.as_slice())?, *interval, *signal)),
            BehaviorDef::Walker {
                walk_speed,
                look_scale,
                keys: [forward, back, left, right],
            } => Behavior::Walker(Walker {
                look_x: Axis::input("mouse-x").scaled(*look_scale),
                look_y: Axis::input("mouse-y").scaled(*look_scale),
                walk_x: Axis::pair(right.as_str(), left.as_str()),
                walk_y: Axis::pair(forward.as_str(), back.as_str()),
                walk_speed: *walk_speed,
            }),
        };
        Ok(behavior)
    }
}

impl LevelFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check every name reference without touching a scheduler: unique
    /// entity names, known targets, parents and camera, an acyclic parent
    /// chain and somewhere to respawn.
    pub fn validate(&self, source: Option<&str>) -> Result<()> {
        let mut parents: HashMap<&str, Option<&str>> = HashMap::new();
        for def in &self.entities {
            if parents
                .insert(def.name.as_str(), def.parent.as_deref())
                .is_some()
            {
                return Err(CadenceError::DuplicateEntityName(def.name.clone()));
            }
        }

        let unknown = |what: &str, owner: &str, name: &str| {
            CadenceError::LevelError(format!("'{}' has unknown {} '{}'", owner, what, name))
        };
        for def in &self.entities {
            if let Some(parent) = &def.parent {
                if !parents.contains_key(parent.as_str()) {
                    return Err(unknown("parent", &def.name, parent));
                }
            }
            if let Some(target) = def
                .behavior
                .targets()
                .iter()
                .find(|t| !parents.contains_key(t.as_str()))
            {
                return Err(unknown("target", &def.name, target));
            }

            let mut hops = 0;
            let mut cursor = def.parent.as_deref();
            while let Some(parent) = cursor {
                hops += 1;
                if parent == def.name || hops > self.entities.len() {
                    return Err(CadenceError::CyclicParent {
                        parent: parent.to_string(),
                        child: def.name.clone(),
                    });
                }
                cursor = parents.get(parent).copied().flatten();
            }
        }

        if let Some(camera) = &self.level.camera {
            if !parents.contains_key(camera.as_str()) {
                return Err(unknown("camera", &self.level.name, camera));
            }
        }
        if self.level.kill_z.is_some() && self.level.respawn.is_none() && source.is_none() {
            return Err(CadenceError::LevelError(format!(
                "level '{}' sets kill_z but has nowhere to respawn",
                self.level.name
            )));
        }
        Ok(())
    }

    /// Populate a scheduler with this level. `source` is the path the level
    /// was read from, used as the default respawn target.
    pub fn instantiate(&self, scheduler: &mut Scheduler, source: Option<&str>) -> Result<()> {
        self.validate(source)?;

        // First pass: create all entities so names can be referenced in any order
        let mut names = HashMap::new();
        for def in &self.entities {
            let transform = Transform::from_position(Vec3::from_array(def.position))
                .with_rotation(Vec3::from_array(def.rotation))
                .with_scale(Vec3::from_array(def.scale));
            let id = scheduler.spawn(def.name.clone(), transform, Behavior::default())?;
            names.insert(def.name.clone(), id);
        }

        // Second pass: behaviors, hierarchy and ordering
        for def in &self.entities {
            let id = names[&def.name];
            let behavior = def.behavior.build(&def.name, &names, scheduler.config())?;
            let world = scheduler.world_mut();
            if let Some(transform) = world.transform(id) {
                world.place(id, behavior.settle(transform))?;
            }
            scheduler.set_behavior(id, behavior)?;

            if let Some(parent_name) = &def.parent {
                let parent = names.get(parent_name).copied().ok_or_else(|| {
                    CadenceError::LevelError(format!(
                        "'{}' has unknown parent '{}'",
                        def.name, parent_name
                    ))
                })?;
                scheduler.add_child(parent, id)?;
            }
            if def.priority != 0 {
                scheduler.world_mut().set_priority(id, def.priority)?;
            }
        }

        if let Some(camera) = &self.level.camera {
            let id = names.get(camera).copied().ok_or_else(|| {
                CadenceError::LevelError(format!("unknown camera entity '{}'", camera))
            })?;
            scheduler.set_camera(Some(id));
        }
        if let Some(button) = &self.level.use_button {
            scheduler.register_object(Box::new(UseScanner::new(button.clone())));
        }
        if let Some(kill_z) = self.level.kill_z {
            let respawn = self
                .level
                .respawn
                .as_deref()
                .or(source)
                .ok_or_else(|| {
                    CadenceError::LevelError(format!(
                        "level '{}' sets kill_z but has nowhere to respawn",
                        self.level.name
                    ))
                })?;
            scheduler.register_object(Box::new(DeathWatcher::new(kill_z, respawn)));
        }

        info!(
            "Instantiated level '{}' ({} entities)",
            self.level.name,
            self.entities.len()
        );
        Ok(())
    }
}

/// Loads level files from disk and swaps them into a scheduler
#[derive(Debug, Default)]
pub struct TomlStateLoader {
    levels: Vec<(String, LevelFile)>,
}

impl TomlStateLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already parsed level under a path
    pub fn insert(&mut self, path: impl Into<String>, level: LevelFile) -> StateHandle {
        self.levels.push((path.into(), level));
        StateHandle((self.levels.len() - 1) as u64)
    }
}

impl StateLoader for TomlStateLoader {
    fn load_state(&mut self, path: &str) -> Result<StateHandle> {
        if let Some(index) = self.levels.iter().position(|(p, _)| p == path) {
            return Ok(StateHandle(index as u64));
        }
        let level = LevelFile::load(path)?;
        Ok(self.insert(path, level))
    }

    fn set_state(&mut self, handle: StateHandle, scheduler: &mut Scheduler) -> Result<()> {
        let (path, level) = self
            .levels
            .get(handle.0 as usize)
            .ok_or(CadenceError::UnknownState(handle.0))?;
        // A broken level must not tear down the running one
        level.validate(Some(path.as_str()))?;
        scheduler.reset_level();
        level.instantiate(scheduler, Some(path.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIFT_LEVEL: &str = r#"
        [level]
        name = "Lift test"
        camera = "player"
        use_button = "e"
        kill_z = -200.0

        [[entities]]
        name = "player"
        position = [0.0, 0.0, 1.0]
        behavior = { kind = "walker", walk_speed = 10.0 }

        [[entities]]
        name = "lift"
        position = [0.0, 10.0, 0.0]
        priority = -1
        behavior = { kind = "platform", movement = [0.0, 0.0, 20.0], cycle_time = 4.0 }

        [[entities]]
        name = "switch"
        position = [4.0, 0.0, 1.0]
        behavior = { kind = "button", targets = ["lift"] }

        [[entities]]
        name = "coin"
        position = [0.0, 10.0, 3.0]
        scale = [0.5, 0.5, 0.5]
        parent = "lift"
        behavior = { kind = "coin" }

        [[entities]]
        name = "trapdoor"
        position = [2.0, 2.0, 0.0]
        behavior = { kind = "hidden_platform", range = 4.0, speed = 2.0, hidden = true }
    "#;

    #[test]
    fn test_parse_level() {
        let level = LevelFile::from_toml_str(LIFT_LEVEL).unwrap();
        assert_eq!(level.level.name, "Lift test");
        assert_eq!(level.entities.len(), 5);
        assert_eq!(level.entities[0].name, "player");
        assert_eq!(
            level.entities[2].behavior,
            BehaviorDef::Button {
                targets: vec!["lift".into()],
                signal: Signal::Start,
                press_depth: 0.25,
            }
        );
    }

    #[test]
    fn test_instantiate_level() {
        let level = LevelFile::from_toml_str(LIFT_LEVEL).unwrap();
        let mut scheduler = Scheduler::new(SimConfig::default());
        level.instantiate(&mut scheduler, Some("levels/lift.toml")).unwrap();

        let world = scheduler.world();
        let player = world.get_id("player").unwrap();
        let lift = world.get_id("lift").unwrap();
        let coin = world.get_id("coin").unwrap();
        let trapdoor = world.get_id("trapdoor").unwrap();

        assert_eq!(scheduler.camera(), Some(player));
        assert_eq!(world.parent(coin), Some(lift));
        assert!(world
            .world_position(coin)
            .unwrap()
            .distance(&Vec3::new(0.0, 10.0, 3.0))
            < 1e-4);
        assert_eq!(world.scan_order()[0], lift);
        assert_eq!(world.transform(coin).unwrap().scale, Vec3::new(0.5, 0.5, 0.5));
        assert_eq!(world.transform(lift).unwrap().scale, Vec3::ONE);
        // Hidden platforms settle into their hidden pose
        assert!(world.position(trapdoor).unwrap().z.abs() < 1e-5);
        assert_eq!(
            scheduler.objects().names(),
            vec!["use_scanner".to_string(), "death_watcher".to_string()]
        );

        match scheduler.behavior(coin) {
            Some(Behavior::Coin(c)) => assert_eq!(c.value, 100),
            other => panic!("unexpected behavior {:?}", other),
        }
        match scheduler.behavior(world.get_id("switch").unwrap()) {
            Some(Behavior::Button(b)) => assert_eq!(b.targets, vec![lift]),
            other => panic!("unexpected behavior {:?}", other),
        }
    }

    #[test]
    fn test_unknown_target_rejected() {
        let level = LevelFile::from_toml_str(
            r#"
            [level]
            name = "Broken"

            [[entities]]
            name = "switch"
            behavior = { kind = "button", targets = ["nowhere"] }
            "#,
        )
        .unwrap();
        let mut scheduler = Scheduler::new(SimConfig::default());
        assert!(matches!(
            level.instantiate(&mut scheduler, None),
            Err(CadenceError::LevelError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_references() {
        let duplicate = LevelFile::from_toml_str(
            r#"
            [level]
            name = "Twins"

            [[entities]]
            name = "block"

            [[entities]]
            name = "block"
            "#,
        )
        .unwrap();
        assert!(matches!(
            duplicate.validate(None),
            Err(CadenceError::DuplicateEntityName(name)) if name == "block"
        ));

        let cycle = LevelFile::from_toml_str(
            r#"
            [level]
            name = "Loop"

            [[entities]]
            name = "a"
            parent = "b"

            [[entities]]
            name = "b"
            parent = "a"
            "#,
        )
        .unwrap();
        assert!(matches!(
            cycle.validate(None),
            Err(CadenceError::CyclicParent { .. })
        ));

        let camera = LevelFile::from_toml_str(
            r#"
            [level]
            name = "Blind"
            camera = "ghost"
            "#,
        )
        .unwrap();
        assert!(matches!(
            camera.validate(None),
            Err(CadenceError::LevelError(_))
        ));

        assert!(LevelFile::from_toml_str(LIFT_LEVEL)
            .unwrap()
            .validate(Some("levels/lift.toml"))
            .is_ok());
    }

    #[test]
    fn test_broken_level_keeps_current_one() {
        let broken = LevelFile::from_toml_str(
            r#"
            [level]
            name = "Broken"

            [[entities]]
            name = "switch"
            behavior = { kind = "button", targets = ["nowhere"] }
            "#,
        )
        .unwrap();
        let mut loader = TomlStateLoader::new();
        let handle = loader.insert("levels/broken.toml", broken);

        let mut scheduler = Scheduler::new(SimConfig::default());
        scheduler
            .spawn("keeper", Transform::IDENTITY, Behavior::default())
            .unwrap();

        assert!(matches!(
            loader.set_state(handle, &mut scheduler),
            Err(CadenceError::LevelError(_))
        ));
        assert!(scheduler.world().get_id("keeper").is_some());
        assert!(scheduler.world().get_id("switch").is_none());
    }

    #[test]
    fn test_kill_z_needs_respawn() {
        let level = LevelFile::from_toml_str(
            r#"
            [level]
            name = "Pit"
            kill_z = -10.0
            "#,
        )
        .unwrap();
        let mut scheduler = Scheduler::new(SimConfig::default());
        assert!(matches!(
            level.instantiate(&mut scheduler, None),
            Err(CadenceError::LevelError(_))
        ));
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let result = LevelFile::from_toml_str(
            r#"
            [level]
            name = "Odd"

            [[entities]]
            name = "thing"
            behavior = { kind = "teleporter" }
            "#,
        );
        assert!(matches!(result, Err(CadenceError::TomlParseError(_))));
    }

    #[test]
    fn test_loader_swaps_level_and_keeps_score() {
        let level = LevelFile::from_toml_str(LIFT_LEVEL).unwrap();
        let mut loader = TomlStateLoader::new();
        let handle = loader.insert("levels/lift.toml", level);

        let mut scheduler = Scheduler::new(SimConfig::default());
        let stray = scheduler
            .spawn("stray", Transform::IDENTITY, Behavior::default())
            .unwrap();
        scheduler.state_mut().add_score(stray, 50);

        assert_eq!(loader.load_state("levels/lift.toml").unwrap(), handle);
        loader.set_state(handle, &mut scheduler).unwrap();
        assert!(scheduler.world().get_id("stray").is_none());
        assert!(scheduler.world().get_id("lift").is_some());
        assert_eq!(scheduler.score(), 50);

        assert!(matches!(
            loader.set_state(StateHandle(9), &mut scheduler),
            Err(CadenceError::UnknownState(9))
        ));
    }
}
