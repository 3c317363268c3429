use super::EntityBehavior;
use crate::action::{Action, ActionBuffer, Signal, Step};
use crate::context::ScanContext;
use cadence_core::{EntityId, Result, Transform, Vec3};

/// A wall switch: using it signals every target and toggles its pressed pose
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub targets: Vec<EntityId>,
    pub signal: Signal,
    /// How far the button sinks along -z while pressed
    pub press_depth: f32,
    pressed: bool,
}

impl Button {
    pub fn new(targets: Vec<EntityId>, signal: Signal, press_depth: f32) -> Self {
        Self {
            targets,
            signal,
            press_depth,
            pressed: false,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

impl EntityBehavior for Button {
    fn scan(&self, _: EntityId, _: &Transform, _: &ScanContext<'_>, _: &mut ActionBuffer) -> Result<()> {
        Ok(())
    }

    fn on_use(&self, me: EntityId) -> Vec<(EntityId, Action)> {
        let offset = if self.pressed {
            self.press_depth
        } else {
            -self.press_depth
        };

        let mut actions: Vec<(EntityId, Action)> = self
            .targets
            .iter()
            .map(|target| (*target, Action::Signal(self.signal)))
            .collect();
        actions.push((me, Action::Step(Step::Pressed(!self.pressed))));
        actions.push((me, Action::Translate(Vec3::new(0.0, 0.0, offset))));
        actions
    }

    fn apply_step(&mut self, step: Step) -> bool {
        match step {
            Step::Pressed(pressed) => {
                self.pressed = pressed;
                true
            }
            _ => false,
        }
    }
}
