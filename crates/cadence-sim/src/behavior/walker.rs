use super::EntityBehavior;
use crate::action::{Action, ActionBuffer};
use crate::context::ScanContext;
use cadence_core::{EntityId, Result, Transform, Vec3};
use cadence_runtime::Axis;

const PITCH_LIMIT: f32 = 89.0;

/// First-person mover driven by axis trees.
///
/// Look axes are read as degrees per tick: `look_x` turns the yaw (rotation
/// about z, positive look turns right), `look_y` tilts the pitch (rotation
/// about y, clamped short of vertical). Walk axes move in the ground plane
/// relative to the new yaw, `walk_y` forward and `walk_x` to the right.
#[derive(Debug, Clone, PartialEq)]
pub struct Walker {
    pub look_x: Axis,
    pub look_y: Axis,
    pub walk_x: Axis,
    pub walk_y: Axis,
    /// Units per second at full axis deflection
    pub walk_speed: f32,
}

impl Walker {
    /// WASD to walk, raw `mouse-x` / `mouse-y` to look
    pub fn first_person(walk_speed: f32, look_scale: f32) -> Self {
        Self {
            look_x: Axis::input("mouse-x").scaled(look_scale),
            look_y: Axis::input("mouse-y").scaled(look_scale),
            walk_x: Axis::pair("d", "a"),
            walk_y: Axis::pair("w", "s"),
            walk_speed,
        }
    }
}

impl EntityBehavior for Walker {
    fn scan(
        &self,
        me: EntityId,
        transform: &Transform,
        ctx: &ScanContext<'_>,
        out: &mut ActionBuffer,
    ) -> Result<()> {
        let yaw_delta = -self.look_x.evaluate(ctx.input);
        let pitch = transform.rotation.y;
        let pitch_delta =
            (pitch + self.look_y.evaluate(ctx.input)).clamp(-PITCH_LIMIT, PITCH_LIMIT) - pitch;
        if yaw_delta != 0.0 || pitch_delta != 0.0 {
            out.push(me, Action::Rotate(Vec3::new(0.0, pitch_delta, yaw_delta)));
        }

        let strafe = self.walk_x.evaluate(ctx.input);
        let advance = self.walk_y.evaluate(ctx.input);
        if strafe == 0.0 && advance == 0.0 {
            return Ok(());
        }

        let yaw = (transform.rotation.z + yaw_delta).to_radians();
        let forward = Vec3::new(yaw.cos(), yaw.sin(), 0.0);
        let right = Vec3::new(yaw.sin(), -yaw.cos(), 0.0);
        let step = self.walk_speed * ctx.dt as f32;
        out.push(
            me,
            Action::Translate((forward * advance + right * strafe) * step),
        );
        Ok(())
    }
}
