//! Input state management
//!
//! The device layer feeds named button transitions and axis values in; the
//! simulation reads held levels, consumes edge events, and samples axes.

use std::collections::{HashMap, HashSet};

/// Edge event for a button, consumed at most once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonEvent {
    #[default]
    None,
    Pressed,
    Released,
}

/// Tracks named button and axis input per tick
#[derive(Debug, Default)]
pub struct InputState {
    /// Buttons currently held down
    buttons_down: HashSet<String>,
    /// Unconsumed edge per button, dropped at end of tick
    pending_events: HashMap<String, ButtonEvent>,
    /// Absolute axis values (sticks, triggers)
    axes: HashMap<String, f32>,
    /// Relative axis motion accumulated this tick (mouse)
    axis_deltas: HashMap<String, f32>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a button press
    pub fn press(&mut self, button: &str) {
        if self.buttons_down.insert(button.to_string()) {
            self.pending_events
                .insert(button.to_string(), ButtonEvent::Pressed);
        }
    }

    /// Process a button release
    pub fn release(&mut self, button: &str) {
        if self.buttons_down.remove(button) {
            // A tap inside one tick still reports its press
            let pending = self
                .pending_events
                .entry(button.to_string())
                .or_default();
            if *pending != ButtonEvent::Pressed {
                *pending = ButtonEvent::Released;
            }
        }
    }

    /// Set an absolute axis value
    pub fn set_axis(&mut self, axis: &str, value: f32) {
        self.axes.insert(axis.to_string(), value);
    }

    /// Accumulate relative axis motion for this tick
    pub fn add_axis_delta(&mut self, axis: &str, delta: f32) {
        *self.axis_deltas.entry(axis.to_string()).or_insert(0.0) += delta;
    }

    /// Call at end of tick to drop unconsumed edges and relative motion
    pub fn end_tick(&mut self) {
        self.pending_events.clear();
        self.axis_deltas.clear();
    }

    // --- Query methods ---

    /// Is a button currently held down?
    pub fn is_button_down(&self, button: &str) -> bool {
        self.buttons_down.contains(button)
    }

    /// Consume the pending edge of a button
    pub fn take_button_event(&mut self, button: &str) -> ButtonEvent {
        self.pending_events.remove(button).unwrap_or_default()
    }

    /// Current value of an axis (absolute value plus this tick's motion).
    /// Unknown axes read as zero.
    pub fn axis_value(&self, axis: &str) -> f32 {
        self.axes.get(axis).copied().unwrap_or(0.0)
            + self.axis_deltas.get(axis).copied().unwrap_or(0.0)
    }
}

/// A named button handle, the way level setup refers to `buttons["w"]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ButtonInput {
    name: String,
}

impl ButtonInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consume this button's pending edge
    pub fn take_event(&self, input: &mut InputState) -> ButtonEvent {
        input.take_button_event(&self.name)
    }
}
