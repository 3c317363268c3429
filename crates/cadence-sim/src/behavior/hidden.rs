use super::{dismount, ride, EntityBehavior};
use crate::action::{Action, ActionBuffer, Signal, Step};
use crate::context::ScanContext;
use cadence_core::{CadenceError, EntityId, Result, Transform, Vec3};
use std::f32::consts::FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenState {
    Shown,
    Hidden,
    Transitioning,
}

/// Sinks out of the way when hidden and rises back when shown.
///
/// A phase in `[0, π/2]` moves toward 0 (shown) or π/2 (hidden) at `speed`
/// radians per second; height is `(1 - (1 - cos(phase))^6) * range +
/// hidden_z`, so the platform barely moves at first and then drops away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HiddenPlatform {
    pub range: f32,
    pub hidden_z: f32,
    pub speed: f32,
    phase: f32,
    hidden: bool,
}

impl HiddenPlatform {
    pub fn new(range: f32, hidden_z: f32, speed: f32, start_hidden: bool) -> Self {
        Self {
            range,
            hidden_z,
            speed,
            phase: if start_hidden { FRAC_PI_2 } else { 0.0 },
            hidden: start_hidden,
        }
    }

    pub fn height_at(&self, phase: f32) -> f32 {
        (1.0 - (1.0 - phase.cos()).powi(6)) * self.range + self.hidden_z
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    fn target_phase(&self) -> f32 {
        if self.hidden {
            FRAC_PI_2
        } else {
            0.0
        }
    }

    pub fn state(&self) -> HiddenState {
        if self.phase != self.target_phase() {
            HiddenState::Transitioning
        } else if self.hidden {
            HiddenState::Hidden
        } else {
            HiddenState::Shown
        }
    }
}

impl EntityBehavior for HiddenPlatform {
    fn scan(
        &self,
        me: EntityId,
        transform: &Transform,
        ctx: &ScanContext<'_>,
        out: &mut ActionBuffer,
    ) -> Result<()> {
        let target = self.target_phase();
        if self.phase == target {
            return Ok(());
        }
        if !(self.speed > 0.0) {
            return Err(CadenceError::BehaviorError(format!(
                "hidden platform {} has speed {}",
                me, self.speed
            )));
        }

        let step = self.speed * ctx.dt as f32;
        let phase = if self.phase < target {
            (self.phase + step).min(target)
        } else {
            (self.phase - step).max(target)
        };

        let p = transform.position;
        out.push(me, Action::Step(Step::HiddenPhase(phase)));
        out.push(
            me,
            Action::SetPosition(Vec3::new(p.x, p.y, self.height_at(phase))),
        );
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
            Signal::Show => self.hidden = false,
            Signal::Hide => self.hidden = true,
            Signal::Toggle => self.hidden = !self.hidden,
            _ => return false,
        }
        true
    }

    fn apply_step(&mut self, step: Step) -> bool {
        match step {
            Step::HiddenPhase(phase) => {
                self.phase = phase.clamp(0.0, FRAC_PI_2);
                true
            }
            _ => false,
        }
    }

    fn settle(&self, mut transform: Transform) -> Transform {
        transform.position.z = self.height_at(self.phase);
        transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{test_support::scan_once, Behavior};
    use cadence_runtime::InputState;

    #[test]
    fn test_heights() {
        let platform = HiddenPlatform::new(10.0, -4.0, 1.0, false);
        assert!((platform.height_at(0.0) - 6.0).abs() < 1e-5);
        assert!((platform.height_at(FRAC_PI_2) + 4.0).abs() < 1e-5);
        // Slow start: a tenth of the way in barely moves
        assert!(platform.height_at(0.157) > 5.99);
    }

    #[test]
    fn test_settled_states_are_quiet() {
        let input = InputState::new();
        for hidden in [false, true] {
            let platform = Behavior::HiddenPlatform(HiddenPlatform::new(10.0, 0.0, 1.0, hidden));
            assert!(scan_once(&platform, Transform::IDENTITY, 0.1, 1.0, &input)
                .unwrap()
                .is_empty());
        }
    }

    #[test]
    fn test_hide_transitions_then_settles() {
        let mut platform = HiddenPlatform::new(10.0, 0.0, 1.0, false);
        assert_eq!(platform.state(), HiddenState::Shown);
        assert!(platform.apply_signal(Signal::Hide, 0.0));
        assert_eq!(platform.state(), HiddenState::Transitioning);

        let input = InputState::new();
        let at = Transform::from_position(Vec3::new(3.0, 4.0, 10.0));
        let actions = scan_once(&Behavior::HiddenPlatform(platform), at, 1.0, 1.0, &input).unwrap();
        assert_eq!(actions[0], Action::Step(Step::HiddenPhase(1.0)));
        match actions[1] {
            Action::SetPosition(p) => {
                assert_eq!((p.x, p.y), (3.0, 4.0));
                assert!((p.z - platform.height_at(1.0)).abs() < 1e-5);
            }
            other => panic!("unexpected action {:?}", other),
        }

        // Overshoot clamps to the target
        platform.apply_step(Step::HiddenPhase(1.5));
        let actions = scan_once(&Behavior::HiddenPlatform(platform), at, 1.0, 2.0, &input).unwrap();
        assert_eq!(actions[0], Action::Step(Step::HiddenPhase(FRAC_PI_2)));
        platform.apply_step(Step::HiddenPhase(FRAC_PI_2));
        assert_eq!(platform.state(), HiddenState::Hidden);
    }

    #[test]
    fn test_toggle_and_settle() {
        let mut platform = HiddenPlatform::new(5.0, 1.0, 1.0, true);
        assert_eq!(platform.state(), HiddenState::Hidden);
        let settled = platform.settle(Transform::IDENTITY);
        assert!((settled.position.z - 1.0).abs() < 1e-5);

        platform.apply_signal(Signal::Toggle, 0.0);
        assert_eq!(platform.state(), HiddenState::Transitioning);
        assert!(!platform.apply_signal(Signal::BeginFall, 0.0));
    }
}
