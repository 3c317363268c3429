use super::{dismount, EntityBehavior};
use crate::action::{Action, ActionBuffer, Signal, Step};
use crate::context::ScanContext;
use cadence_core::{EntityId, Result, Transform, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallState {
    Resting,
    Falling,
}

/// Holds still until triggered (by a signal or by being stood on), then
/// drops under gravity after the configured grace delay.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FallingPlatform {
    fall_started_at: Option<f64>,
    z_vel: f32,
}

impl FallingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FallState {
        match self.fall_started_at {
            Some(_) => FallState::Falling,
            None => FallState::Resting,
        }
    }

    pub fn velocity(&self) -> f32 {
        self.z_vel
    }

    pub fn fall_started_at(&self) -> Option<f64> {
        self.fall_started_at
    }
}

impl EntityBehavior for FallingPlatform {
    fn scan(
        &self,
        me: EntityId,
        _transform: &Transform,
        ctx: &ScanContext<'_>,
        out: &mut ActionBuffer,
    ) -> Result<()> {
        let Some(started_at) = self.fall_started_at else {
            return Ok(());
        };
        // Only the part of this tick past the grace window falls
        let past_grace = ctx.total_time - (started_at + ctx.config.fall_grace);
        if past_grace <= 0.0 {
            return Ok(());
        }

        let dt = ctx.dt.min(past_grace) as f32;
        let velocity = self.z_vel + ctx.config.gravity * dt;
        out.push(me, Action::Step(Step::FallVelocity(velocity)));
        out.push(me, Action::Translate(Vec3::new(0.0, 0.0, velocity * dt)));
        Ok(())
    }

    fn start_touch(&self, _me: EntityId, toucher: EntityId) -> Vec<Action> {
        vec![
            Action::AttachChild(toucher),
            Action::Signal(Signal::BeginFall),
        ]
    }

    fn end_touch(&self, _me: EntityId, toucher: EntityId) -> Vec<Action> {
        dismount(toucher)
    }

    fn apply_signal(&mut self, signal: Signal, now: f64) -> bool {
        match signal {
            Signal::BeginFall | Signal::Start => {
                if self.fall_started_at.is_none() {
                    self.fall_started_at = Some(now);
                }
                true
            }
            _ => false,
        }
    }

    fn apply_step(&mut self, step: Step) -> bool {
        match step {
            Step::FallVelocity(velocity) => {
                self.z_vel = velocity;
                true
            }
            _ => false,
        }
    }
}
