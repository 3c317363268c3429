//! Built-in sim objects

use crate::behavior::Behavior;
use crate::object::{ObjectContext, SimObject, UpdateContext};
use cadence_core::{transform_point, Result, Vec3};
use cadence_runtime::{ButtonEvent, ButtonInput};
use log::{debug, info};

/// Casts a use ray from the camera when its button is pressed and hands the
/// hit entity's use reaction to the action buffer.
pub struct UseScanner {
    pub button: ButtonInput,
}

impl UseScanner {
    pub fn new(button: impl Into<String>) -> Self {
        Self {
            button: ButtonInput::new(button),
        }
    }
}

impl SimObject for UseScanner {
    fn name(&self) -> &str {
        "use_scanner"
    }

    fn scan(&mut self, ctx: &mut ObjectContext<'_>) -> Result<()> {
        if self.button.take_event(ctx.input) != ButtonEvent::Pressed {
            return Ok(());
        }
        let Some(camera) = ctx.camera else {
            return Ok(());
        };
        let Some(matrix) = ctx.world.world_matrix(camera) else {
            return Ok(());
        };

        let origin = transform_point(&matrix, Vec3::ZERO);
        let direction = transform_point(&matrix, Vec3::FORWARD) - origin;
        let Some(hit) = ctx.ray_caster.cast_ray(ctx.world, origin, direction) else {
            debug!("{}: use ray from {} hit nothing", self.button.name(), camera);
            return Ok(());
        };

        if let Some(behavior) = ctx.world.get::<Behavior>(hit.entity) {
            debug!("{} used {} ({})", camera, hit.entity, behavior.kind());
            ctx.actions.extend(behavior.on_use(hit.entity));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Watch {
    Above,
    Fell,
    Requested,
}

/// Sends the player back to `level` once the camera drops below `kill_z`.
///
/// The fall is noticed during scan; the transition is requested from
/// `update`, after the scan barrier, and only once per fall.
pub struct DeathWatcher {
    pub kill_z: f32,
    pub level: String,
    watch: Watch,
}

impl DeathWatcher {
    pub fn new(kill_z: f32, level: impl Into<String>) -> Self {
        Self {
            kill_z,
            level: level.into(),
            watch: Watch::Above,
        }
    }
}

impl SimObject for DeathWatcher {
    fn name(&self) -> &str {
        "death_watcher"
    }

    fn scan(&mut self, ctx: &mut ObjectContext<'_>) -> Result<()> {
        let Some(z) = ctx
            .camera
            .and_then(|camera| ctx.world.world_position(camera))
            .map(|p| p.z)
        else {
            return Ok(());
        };

        self.watch = match (self.watch, z < self.kill_z) {
            (Watch::Above, true) => Watch::Fell,
            (_, false) => Watch::Above,
            (watch, true) => watch,
        };
        Ok(())
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<()> {
        if self.watch == Watch::Fell {
            info!("Fell below {}, restarting {}", self.kill_z, self.level);
            ctx.state.request_state(self.level.clone());
            self.watch = Watch::Requested;
        }
        Ok(())
    }
}
