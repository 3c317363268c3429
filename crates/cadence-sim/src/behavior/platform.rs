use super::{dismount, ride, EntityBehavior};
use crate::action::{Action, ActionBuffer, Signal, Step};
use crate::context::ScanContext;
use cadence_core::{CadenceError, EntityId, Result, Transform, Vec3};
use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformState {
    Idle,
    Cycling,
}

/// Oscillates between its start position and `start + movement`.
///
/// The cycle is anchored on the first scan after `Start`: at the anchor time
/// the platform sits at its start position and half a cycle later at the
/// far end. Whoever stands on it rides along.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Platform {
    pub movement: Vec3,
    /// Seconds for a full there-and-back cycle
    pub cycle_time: f64,
    started: bool,
    anchor: Option<(f64, Vec3)>,
}

impl Platform {
    pub fn new(movement: Vec3, cycle_time: f64) -> Self {
        Self {
            movement,
            cycle_time,
            started: false,
            anchor: None,
        }
    }

    /// Begin cycling from the first tick
    pub fn running(mut self) -> Self {
        self.started = true;
        self
    }

    pub fn state(&self) -> PlatformState {
        if self.started {
            PlatformState::Cycling
        } else {
            PlatformState::Idle
        }
    }

    pub fn anchor(&self) -> Option<(f64, Vec3)> {
        self.anchor
    }

    /// Position `elapsed` seconds after the anchor
    pub fn position_at(&self, start: Vec3, elapsed: f64) -> Vec3 {
        let cycle = (1.0 - (elapsed / self.cycle_time * TAU).cos()) / 2.0;
        start.lerp(&(start + self.movement), cycle as f32)
    }
}

impl EntityBehavior for Platform {
    fn scan(
        &self,
        me: EntityId,
        transform: &Transform,
        ctx: &ScanContext<'_>,
        out: &mut ActionBuffer,
    ) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        if !(self.cycle_time > 0.0) {
            return Err(CadenceError::BehaviorError(format!(
                "platform {} has cycle time {}",
                me, self.cycle_time
            )));
        }

        let (start_time, start_position) = match self.anchor {
            Some(anchor) => anchor,
            None => {
                out.push(
                    me,
                    Action::Step(Step::PlatformAnchor {
                        start_time: ctx.total_time,
                        start_position: transform.position,
                    }),
                );
                (ctx.total_time, transform.position)
            }
        };

        let position = self.position_at(start_position, ctx.total_time - start_time);
        out.push(me, Action::SetPosition(position));
        Ok(())
    }

    fn start_touch(&self, _me: EntityId, toucher: EntityId) -> Vec<Action> {
        ride(toucher)
    }

    fn end_touch(&self, _me: EntityId, toucher: EntityId) -> Vec<Action> {
        dismount(toucher)
    }

    fn apply_signal(&mut self, signal: Signal, _now: f64) -> bool {
        match signal {
            Signal::Start | Signal::Toggle if !self.started => {
                self.started = true;
                true
            }
            Signal::Start => true,
            Signal::Stop | Signal::Toggle => {
                self.started = false;
                self.anchor = None;
                true
            }
            _ => false,
        }
    }

    fn apply_step(&mut self, step: Step) -> bool {
        match step {
            Step::PlatformAnchor {
                start_time,
                start_position,
            } => {
                self.anchor = Some((start_time, start_position));
                true
            }
            _ => false,
        }
    }
}
