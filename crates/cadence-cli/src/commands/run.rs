//! Run command: simulate a level with scripted input

use anyhow::{Context, Result};
use cadence_runtime::{GameClock, SimEvent};
use cadence_sim::{Scheduler, SimConfig, StateLoader, TomlStateLoader};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A named input held over a range of ticks
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub name: String,
    pub start: u64,
    /// Tick at which the input ends; a press without one is a one-tick tap
    pub end: Option<u64>,
}

/// Parse `name@tick` or `name@start..end`
pub fn parse_schedule(s: &str) -> Result<Schedule, String> {
    let (name, ticks) = s
        .split_once('@')
        .ok_or_else(|| format!("expected name@tick, got '{}'", s))?;
    if name.is_empty() {
        return Err(format!("missing name in '{}'", s));
    }

    let parse_tick = |t: &str| {
        t.trim()
            .parse::<u64>()
            .map_err(|e| format!("invalid tick '{}': {}", t, e))
    };
    let (start, end) = match ticks.split_once("..") {
        Some((start, end)) => (parse_tick(start)?, Some(parse_tick(end)?)),
        None => (parse_tick(ticks)?, None),
    };
    if end.is_some_and(|end| end <= start) {
        return Err(format!("empty tick range in '{}'", s));
    }

    Ok(Schedule {
        name: name.to_string(),
        start,
        end,
    })
}

pub struct RunArgs {
    pub level: PathBuf,
    pub ticks: u64,
    pub config: Option<PathBuf>,
    pub press: Vec<Schedule>,
    pub touch: Vec<Schedule>,
    pub realtime: bool,
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = SimConfig::load(args.config.as_deref()).context("Failed to load config")?;
    let mut scheduler = load_level(&args.level, config.clone())?;

    let mut clock = GameClock::with_fixed_timestep(config.tick_rate);
    let mut touched_total = 0usize;
    let mut faults = 0usize;

    while clock.ticks() < args.ticks {
        let time = if args.realtime {
            clock.tick();
            if !clock.should_fixed_update() {
                std::thread::sleep(Duration::from_millis(1));
                continue;
            }
            clock.consume_fixed_step()
        } else {
            clock.step_fixed()
        };
        let tick = clock.ticks() - 1;

        feed_input(&mut scheduler, &args, tick)?;
        let report = scheduler
            .tick(time.dt, time.total)
            .with_context(|| format!("Tick {} failed", tick))?;

        debug!("tick {}: {} touched", tick, report.touched.len());
        touched_total += report.touched.len();
        faults += report.events.iter().filter(|e| e.is_fault()).count();
        for event in &report.events {
            match event {
                SimEvent::StateLoaded(path) => info!("tick {}: reloaded {}", tick, path),
                SimEvent::StateFailed { path, message } => {
                    warn!("tick {}: could not load {}: {}", tick, path, message)
                }
                SimEvent::EntityKilled(id) => debug!("tick {}: {} killed", tick, id),
                other => debug!("tick {}: {:?}", tick, other),
            }
        }
    }

    info!(
        "Ran {} ticks ({:.2}s simulated, {} transform updates, {} faults)",
        clock.ticks(),
        clock.sim_time(),
        touched_total,
        faults
    );
    for entity in scheduler.world().all_entities() {
        let p = entity.world_position;
        match &entity.parent {
            Some(parent) => info!(
                "  {} at ({:.2}, {:.2}, {:.2}) on {}",
                entity.name, p.x, p.y, p.z, parent
            ),
            None => info!("  {} at ({:.2}, {:.2}, {:.2})", entity.name, p.x, p.y, p.z),
        }
    }
    info!("Score: {}", scheduler.score());
    Ok(())
}

/// Load a level file into a fresh scheduler that can reload levels itself
pub fn load_level(path: &Path, config: SimConfig) -> Result<Scheduler> {
    let path = path.to_string_lossy().to_string();
    let mut scheduler = Scheduler::new(config);
    let mut loader = TomlStateLoader::new();
    let handle = loader
        .load_state(&path)
        .with_context(|| format!("Failed to load level {}", path))?;
    loader
        .set_state(handle, &mut scheduler)
        .with_context(|| format!("Failed to instantiate level {}", path))?;
    scheduler.set_state_loader(Box::new(loader));
    Ok(scheduler)
}

fn feed_input(scheduler: &mut Scheduler, args: &RunArgs, tick: u64) -> Result<()> {
    for press in &args.press {
        if press.start == tick {
            scheduler.input_mut().press(&press.name);
        }
        if press.end.unwrap_or(press.start + 1) == tick {
            scheduler.input_mut().release(&press.name);
        }
    }

    for touch in &args.touch {
        let starting = touch.start == tick;
        let ending = touch.end == Some(tick);
        if !starting && !ending {
            continue;
        }

        let (Some(target), Some(camera)) =
            (scheduler.world().get_id(&touch.name), scheduler.camera())
        else {
            warn!("tick {}: cannot touch '{}' (no such entity or no camera)", tick, touch.name);
            continue;
        };
        if starting {
            scheduler.start_touch(target, camera)?;
        }
        if ending {
            scheduler.end_touch(target, camera)?;
        }
    }
    Ok(())
}
