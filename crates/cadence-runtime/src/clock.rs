//! Simulation clock with fixed-timestep accumulator

use std::time::Instant;

/// Elapsed and total time handed to one scan/apply tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickTime {
    /// Seconds elapsed since the previous tick
    pub dt: f64,
    /// Simulation time at this tick, in seconds
    pub total: f64,
}

/// Tracks wall time and turns it into fixed-size simulation ticks
pub struct GameClock {
    /// Total elapsed wall time in seconds
    pub total_time: f64,
    /// Time since last frame in seconds
    pub delta_time: f64,
    /// Fixed timestep interval (default: 1/60 second)
    pub fixed_timestep: f64,
    /// Simulation time advanced by consumed fixed steps
    sim_time: f64,
    /// Number of fixed steps consumed
    ticks: u64,
    /// Accumulated time for fixed-step consumption
    accumulator: f64,
    /// Last tick instant
    last_instant: Instant,
    /// Whether this is the first tick
    first_tick: bool,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            total_time: 0.0,
            delta_time: 0.0,
            fixed_timestep: 1.0 / 60.0,
            sim_time: 0.0,
            ticks: 0,
            accumulator: 0.0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }
}

impl GameClock {
    /// Create a new game clock with default 60Hz fixed timestep
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a game clock with a custom fixed timestep
    pub fn with_fixed_timestep(hz: f64) -> Self {
        Self {
            fixed_timestep: 1.0 / hz,
            ..Self::default()
        }
    }

    /// Advance the wall clock. Call once per frame.
    pub fn tick(&mut self) {
        let now = Instant::now();

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.delta_time = 0.0;
            return;
        }

        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;

        // Clamp to avoid spiral of death (max 250ms frame time)
        self.delta_time = elapsed.min(0.25);
        self.total_time += self.delta_time;
        self.accumulator += self.delta_time;
    }

    /// Returns true if there's enough accumulated time for a fixed update step
    pub fn should_fixed_update(&self) -> bool {
        self.accumulator >= self.fixed_timestep
    }

    /// Consume one fixed timestep from the accumulator
    pub fn consume_fixed_step(&mut self) -> TickTime {
        self.accumulator -= self.fixed_timestep;
        self.step_fixed()
    }

    /// Advance simulation time by one fixed step without consulting wall
    /// time (headless runs)
    pub fn step_fixed(&mut self) -> TickTime {
        self.sim_time += self.fixed_timestep;
        self.ticks += 1;
        TickTime {
            dt: self.fixed_timestep,
            total: self.sim_time,
        }
    }

    /// Simulation time of the most recent fixed step
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Number of fixed steps taken
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Get the interpolation alpha for rendering between fixed steps
    pub fn interpolation_alpha(&self) -> f64 {
        self.accumulator / self.fixed_timestep
    }
}
