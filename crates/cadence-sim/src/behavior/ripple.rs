use super::EntityBehavior;
use crate::action::{Action, ActionBuffer, Signal, Step};
use crate::context::ScanContext;
use cadence_core::{CadenceError, EntityId, Result, Transform};

/// Sequencer that passes a signal down a line of targets.
///
/// Once started, target `i` receives `signal` at `t0 + i * interval`, where
/// `t0` is the first scan after `Start`. The sequence stops by itself after
/// the last target; `Stop` cancels it early.
#[derive(Debug, Clone, PartialEq)]
pub struct Ripple {
    pub targets: Vec<EntityId>,
    pub interval: f64,
    pub signal: Signal,
    running: bool,
    started_at: Option<f64>,
    cursor: usize,
}

impl Ripple {
    pub fn new(targets: Vec<EntityId>, interval: f64, signal: Signal) -> Self {
        Self {
            targets,
            interval,
            signal,
            running: false,
            started_at: None,
            cursor: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Index of the next target to fire
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl EntityBehavior for Ripple {
    fn scan(
        &self,
        me: EntityId,
        _transform: &Transform,
        ctx: &ScanContext<'_>,
        out: &mut ActionBuffer,
    ) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        if self.interval < 0.0 {
            return Err(CadenceError::BehaviorError(format!(
                "ripple {} has negative interval {}",
                me, self.interval
            )));
        }

        let t0 = match self.started_at {
            Some(t0) => t0,
            None => {
                out.push(me, Action::Step(Step::RippleAnchor(ctx.total_time)));
                ctx.total_time
            }
        };

        let mut cursor = self.cursor;
        while cursor < self.targets.len() && t0 + cursor as f64 * self.interval <= ctx.total_time {
            out.push(self.targets[cursor], Action::Signal(self.signal));
            cursor += 1;
        }
        if cursor != self.cursor {
            out.push(me, Action::Step(Step::RippleCursor(cursor)));
        }
        Ok(())
    }

    fn apply_signal(&mut self, signal: Signal, _now: f64) -> bool {
        match signal {
            Signal::Start => {
                self.running = true;
                self.started_at = None;
                self.cursor = 0;
                true
            }
            Signal::Stop => {
                self.running = false;
                self.started_at = None;
                true
            }
            _ => false,
        }
    }

    fn apply_step(&mut self, step: Step) -> bool {
        match step {
            Step::RippleAnchor(t0) => {
                self.started_at = Some(t0);
                true
            }
            Step::RippleCursor(cursor) => {
                self.cursor = cursor;
                if cursor >= self.targets.len() {
                    self.running = false;
                    self.started_at = None;
                }
                true
            }
            _ => false,
        }
    }
}
