//! Layered simulation configuration
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `CADENCE_TICK_RATE`, `CADENCE_GRAVITY`,
//!    `CADENCE_KILL_ON_FAULT`
//! 2. An explicit file, or `cadence.toml` in the working directory
//! 3. Built-in defaults

use cadence_core::{CadenceError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const LOCAL_CONFIG: &str = "cadence.toml";

/// Tuning shared by the scheduler and the built-in behaviors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed ticks per second
    pub tick_rate: f64,
    /// Vertical acceleration applied to falling platforms (units/s²)
    pub gravity: f32,
    /// Delay between a falling platform being triggered and it dropping
    pub fall_grace: f64,
    /// Points awarded when a coin is collected
    pub coin_value: i64,
    /// Coin spin in radians per second
    pub coin_spin_rate: f32,
    /// Kill an entity whose scan or action fails
    pub kill_on_fault: bool,
    /// Maximum distance of a use ray
    pub use_reach: f32,
    /// How close to a use ray an entity must be to be hit
    pub use_radius: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            gravity: -100.0,
            fall_grace: 2.0,
            coin_value: 100,
            coin_spin_rate: 3.0,
            kill_on_fault: false,
            use_reach: 50.0,
            use_radius: 2.0,
        }
    }
}

impl SimConfig {
    /// Load config: defaults < file < environment.
    ///
    /// An explicit `path` must exist; without one, `cadence.toml` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None if Path::new(LOCAL_CONFIG).exists() => Self::load_file(Path::new(LOCAL_CONFIG))?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a TOML string (missing fields take defaults)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(rate) = env_parse::<f64>("CADENCE_TICK_RATE") {
            self.tick_rate = rate;
        }
        if let Some(gravity) = env_parse::<f32>("CADENCE_GRAVITY") {
            self.gravity = gravity;
        }
        if let Some(kill) = env_parse::<bool>("CADENCE_KILL_ON_FAULT") {
            self.kill_on_fault = kill;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tick_rate > 0.0) {
            return Err(CadenceError::ConfigError(format!(
                "tick_rate must be positive, got {}",
                self.tick_rate
            )));
        }
        if self.fall_grace < 0.0 {
            return Err(CadenceError::ConfigError(format!(
                "fall_grace must not be negative, got {}",
                self.fall_grace
            )));
        }
        if self.use_reach < 0.0 || self.use_radius < 0.0 {
            return Err(CadenceError::ConfigError(
                "use_reach and use_radius must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Seconds per fixed tick
    pub fn timestep(&self) -> f64 {
        1.0 / self.tick_rate
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
