//! Entity behaviors
//!
//! Every gameplay entity carries one [`Behavior`] component. The set is
//! closed: new gameplay means a new variant, and each variant implements
//! [`EntityBehavior`] so the scheduler can drive them uniformly.

mod button;
mod coin;
mod conveyor;
mod falling;
mod hidden;
mod platform;
mod ripple;
mod walker;

pub use button::Button;
pub use coin::Coin;
pub use conveyor::Conveyor;
pub use falling::{FallState, FallingPlatform};
pub use hidden::{HiddenPlatform, HiddenState};
pub use platform::{Platform, PlatformState};
pub use ripple::Ripple;
pub use walker::Walker;

use crate::action::{Action, ActionBuffer, Signal, Step};
use crate::context::ScanContext;
use cadence_core::{CadenceError, EntityId, Result, Transform};

/// Hooks the scheduler calls on a behavior.
///
/// `scan` observes the pre-tick world and pushes actions; it never mutates.
/// Touch and use hooks translate external events into actions. Signals and
/// steps are the only way a behavior's own state changes, and they run in
/// the apply phase.
pub trait EntityBehavior {
    fn scan(
        &self,
        me: EntityId,
        transform: &Transform,
        ctx: &ScanContext<'_>,
        out: &mut ActionBuffer,
    ) -> Result<()>;

    fn start_touch(&self, _me: EntityId, _toucher: EntityId) -> Vec<Action> {
        Vec::new()
    }

    fn end_touch(&self, _me: EntityId, _toucher: EntityId) -> Vec<Action> {
        Vec::new()
    }

    /// Reaction to being the target of a use ray
    fn on_use(&self, _me: EntityId) -> Vec<(EntityId, Action)> {
        Vec::new()
    }

    /// Returns false when the signal means nothing to this behavior
    fn apply_signal(&mut self, _signal: Signal, _now: f64) -> bool {
        false
    }

    /// Returns false when the step belongs to another behavior
    fn apply_step(&mut self, _step: Step) -> bool {
        false
    }

    /// Adjust the spawn transform to the behavior's resting pose
    fn settle(&self, transform: Transform) -> Transform {
        transform
    }

    /// Points awarded when killed with score notification
    fn score_value(&self) -> i64 {
        0
    }
}

/// An entity with no behavior of its own (scenery, the camera rig)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Static;

impl EntityBehavior for Static {
    fn scan(&self, _: EntityId, _: &Transform, _: &ScanContext<'_>, _: &mut ActionBuffer) -> Result<()> {
        Ok(())
    }
}

/// Touch hooks shared by everything a player can stand on
pub(crate) fn ride(toucher: EntityId) -> Vec<Action> {
    vec![Action::AttachChild(toucher)]
}

pub(crate) fn dismount(toucher: EntityId) -> Vec<Action> {
    vec![Action::DetachChild(toucher)]
}

#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Static(Static),
    Coin(Coin),
    Platform(Platform),
    FallingPlatform(FallingPlatform),
    HiddenPlatform(HiddenPlatform),
    Conveyor(Conveyor),
    Button(Button),
    Ripple(Ripple),
    Walker(Walker),
}

impl Default for Behavior {
    fn default() -> Self {
        Behavior::Static(Static)
    }
}

impl Behavior {
    pub fn kind(&self) -> &'static str {
        match self {
            Behavior::Static(_) => "static",
            Behavior::Coin(_) => "coin",
            Behavior::Platform(_) => "platform",
            Behavior::FallingPlatform(_) => "falling_platform",
            Behavior::HiddenPlatform(_) => "hidden_platform",
            Behavior::Conveyor(_) => "conveyor",
            Behavior::Button(_) => "button",
            Behavior::Ripple(_) => "ripple",
            Behavior::Walker(_) => "walker",
        }
    }

    fn hooks(&self) -> &dyn EntityBehavior {
        match self {
            Behavior::Static(b) => b,
            Behavior::Coin(b) => b,
            Behavior::Platform(b) => b,
            Behavior::FallingPlatform(b) => b,
            Behavior::HiddenPlatform(b) => b,
            Behavior::Conveyor(b) => b,
            Behavior::Button(b) => b,
            Behavior::Ripple(b) => b,
            Behavior::Walker(b) => b,
        }
    }

    fn hooks_mut(&mut self) -> &mut dyn EntityBehavior {
        match self {
            Behavior::Static(b) => b,
            Behavior::Coin(b) => b,
            Behavior::Platform(b) => b,
            Behavior::FallingPlatform(b) => b,
            Behavior::HiddenPlatform(b) => b,
            Behavior::Conveyor(b) => b,
            Behavior::Button(b) => b,
            Behavior::Ripple(b) => b,
            Behavior::Walker(b) => b,
        }
    }

    pub fn scan(
        &self,
        me: EntityId,
        transform: &Transform,
        ctx: &ScanContext<'_>,
        out: &mut ActionBuffer,
    ) -> Result<()> {
        self.hooks().scan(me, transform, ctx, out)
    }

    pub fn start_touch(&self, me: EntityId, toucher: EntityId) -> Vec<Action> {
        self.hooks().start_touch(me, toucher)
    }

    pub fn end_touch(&self, me: EntityId, toucher: EntityId) -> Vec<Action> {
        self.hooks().end_touch(me, toucher)
    }

    pub fn on_use(&self, me: EntityId) -> Vec<(EntityId, Action)> {
        self.hooks().on_use(me)
    }

    pub fn apply_signal(&mut self, signal: Signal, now: f64) -> bool {
        self.hooks_mut().apply_signal(signal, now)
    }

    pub fn apply_step(&mut self, step: Step) -> Result<()> {
        let kind = self.kind();
        if self.hooks_mut().apply_step(step) {
            Ok(())
        } else {
            Err(CadenceError::BehaviorError(format!(
                "{:?} does not apply to a {} behavior",
                step, kind
            )))
        }
    }

    pub fn settle(&self, transform: Transform) -> Transform {
        self.hooks().settle(transform)
    }

    pub fn score_value(&self) -> i64 {
        self.hooks().score_value()
    }
}
