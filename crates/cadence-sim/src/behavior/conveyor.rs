use super::EntityBehavior;
use crate::action::{Action, ActionBuffer, Step};
use crate::context::ScanContext;
use cadence_core::{EntityId, Result, Transform, Vec3};
use log::debug;

/// Carries whatever stands on it along `velocity`.
///
/// Riders are not reparented; each tick the conveyor pushes a translate onto
/// every rider's queue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conveyor {
    pub velocity: Vec3,
    riders: Vec<EntityId>,
}

impl Conveyor {
    pub fn new(velocity: Vec3) -> Self {
        Self {
            velocity,
            riders: Vec::new(),
        }
    }

    pub fn riders(&self) -> &[EntityId] {
        &self.riders
    }
}

impl EntityBehavior for Conveyor {
    fn scan(
        &self,
        me: EntityId,
        _transform: &Transform,
        ctx: &ScanContext<'_>,
        out: &mut ActionBuffer,
    ) -> Result<()> {
        let delta = self.velocity * ctx.dt as f32;
        for &rider in &self.riders {
            if ctx.world.is_alive(rider) {
                out.push(rider, Action::Translate(delta));
            } else {
                debug!("conveyor {} dropping dead rider {}", me, rider);
                out.push(me, Action::Step(Step::RemoveRider(rider)));
            }
        }
        Ok(())
    }

    fn start_touch(&self, _me: EntityId, toucher: EntityId) -> Vec<Action> {
        vec![Action::Step(Step::AddRider(toucher))]
    }

    fn end_touch(&self, _me: EntityId, toucher: EntityId) -> Vec<Action> {
        vec![Action::Step(Step::RemoveRider(toucher))]
    }

    fn apply_step(&mut self, step: Step) -> bool {
        match step {
            Step::AddRider(rider) => {
                if !self.riders.contains(&rider) {
                    self.riders.push(rider);
                }
                true
            }
            Step::RemoveRider(rider) => {
                self.riders.retain(|r| *r != rider);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use cadence_ecs::EntityWorld;
    use cadence_runtime::InputState;

    #[test]
    fn test_riders_tracked_once() {
        let mut conveyor = Conveyor::new(Vec3::FORWARD);
        let rider = EntityId::new();
        assert!(conveyor.apply_step(Step::AddRider(rider)));
        assert!(conveyor.apply_step(Step::AddRider(rider)));
        assert_eq!(conveyor.riders(), &[rider]);

        assert!(conveyor.apply_step(Step::RemoveRider(rider)));
        assert!(conveyor.riders().is_empty());
        assert!(!conveyor.apply_step(Step::Pressed(true)));
    }

    #[test]
    fn test_scan_moves_live_riders() {
        let mut world = EntityWorld::new();
        let belt = world.spawn("belt").unwrap();
        let player = world.spawn("player").unwrap();
        let ghost = world.spawn("ghost").unwrap();
        world.kill(ghost).unwrap();

        let mut conveyor = Conveyor::new(Vec3::new(4.0, 0.0, 0.0));
        conveyor.apply_step(Step::AddRider(player));
        conveyor.apply_step(Step::AddRider(ghost));

        let input = InputState::new();
        let config = SimConfig::default();
        let ctx = ScanContext {
            dt: 0.5,
            total_time: 1.0,
            world: &world,
            input: &input,
            config: &config,
        };
        let mut out = ActionBuffer::new();
        conveyor
            .scan(belt, &Transform::IDENTITY, &ctx, &mut out)
            .unwrap();

        assert_eq!(
            out.for_entity(player),
            vec![Action::Translate(Vec3::new(2.0, 0.0, 0.0))]
        );
        assert_eq!(
            out.for_entity(belt),
            vec![Action::Step(Step::RemoveRider(ghost))]
        );
        assert!(out.for_entity(ghost).is_empty());
    }
}
