use super::EntityBehavior;
use crate::action::{Action, ActionBuffer};
use crate::context::ScanContext;
use cadence_core::{EntityId, Result, Transform, Vec3};

/// Spins in place; collected (killed with score) on first touch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coin {
    pub value: i64,
    /// Radians per second about z
    pub spin_rate: f32,
}

impl Coin {
    pub fn new(value: i64, spin_rate: f32) -> Self {
        Self { value, spin_rate }
    }
}

impl EntityBehavior for Coin {
    fn scan(
        &self,
        me: EntityId,
        _transform: &Transform,
        ctx: &ScanContext<'_>,
        out: &mut ActionBuffer,
    ) -> Result<()> {
        let degrees = (self.spin_rate * ctx.dt as f32).to_degrees();
        out.push(me, Action::Rotate(Vec3::new(0.0, 0.0, degrees)));
        Ok(())
    }

    fn start_touch(&self, _me: EntityId, _toucher: EntityId) -> Vec<Action> {
        vec![Action::Kill { notify_score: true }]
    }

    fn score_value(&self) -> i64 {
        self.value
    }
}
