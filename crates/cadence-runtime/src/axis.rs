//! Composable control axes
//!
//! An [`Axis`] is an immutable expression tree over raw input, built once at
//! level setup. Evaluation has no side effects and always reflects the
//! current tick's input. Rebinding means building a new tree.

use crate::input::InputState;

#[derive(Debug, Clone, PartialEq)]
pub enum Axis {
    /// A fixed value
    Constant(f32),
    /// A raw engine axis (mouse motion, stick)
    Input(String),
    /// `high` while the button is held, `low` otherwise
    Button { button: String, low: f32, high: f32 },
    /// Upstream value multiplied by a constant
    Scale(Box<Axis>, f32),
    /// Sum of two axes
    Sum(Box<Axis>, Box<Axis>),
    /// Negated upstream value
    Opposite(Box<Axis>),
}

impl Axis {
    pub fn constant(value: f32) -> Self {
        Axis::Constant(value)
    }

    pub fn input(name: impl Into<String>) -> Self {
        Axis::Input(name.into())
    }

    pub fn button(button: impl Into<String>, low: f32, high: f32) -> Self {
        Axis::Button {
            button: button.into(),
            low,
            high,
        }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Axis::Scale(Box::new(self), factor)
    }

    pub fn plus(self, other: Axis) -> Self {
        Axis::Sum(Box::new(self), Box::new(other))
    }

    pub fn opposite(self) -> Self {
        Axis::Opposite(Box::new(self))
    }

    /// Two buttons pulling in opposite directions, e.g. `pair("d", "a")`
    /// for strafing: 1 with only `d` held, -1 with only `a`, 0 with both.
    pub fn pair(positive: impl Into<String>, negative: impl Into<String>) -> Self {
        Axis::button(positive, 0.0, 1.0).plus(Axis::button(negative, 0.0, 1.0).opposite())
    }

    pub fn evaluate(&self, input: &InputState) -> f32 {
        match self {
            Axis::Constant(value) => *value,
            Axis::Input(name) => input.axis_value(name),
            Axis::Button { button, low, high } => {
                if input.is_button_down(button) {
                    *high
                } else {
                    *low
                }
            }
            Axis::Scale(inner, factor) => inner.evaluate(input) * factor,
            Axis::Sum(a, b) => a.evaluate(input) + b.evaluate(input),
            Axis::Opposite(inner) => -inner.evaluate(input),
        }
    }
}
