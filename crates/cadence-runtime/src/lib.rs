//! Cadence Runtime - Tick infrastructure
//!
//! Provides the building blocks the scheduler drives:
//! - `GameClock`: fixed-timestep accumulator producing `TickTime`s
//! - `InputState` / `ButtonInput`: named buttons with edge events and axes
//! - `Axis`: composable, side-effect free control axes
//! - `SimEvent` / `EventBus`: typed event queue for collaborators

mod axis;
mod clock;
mod event;
mod input;

pub use axis::Axis;
pub use clock::{GameClock, TickTime};
pub use event::{EventBus, SimEvent};
pub use input::{ButtonEvent, ButtonInput, InputState};
