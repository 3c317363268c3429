//! Check command: validate a level by instantiating it

use super::run::load_level;
use anyhow::{Context, Result};
use cadence_sim::SimConfig;
use std::path::Path;

pub fn run(level: &Path, config: Option<&Path>) -> Result<()> {
    let config = SimConfig::load(config).context("Failed to load config")?;
    let scheduler = load_level(level, config)?;
    let world = scheduler.world();

    println!("{}: {} entities", level.display(), world.entity_count());
    for id in world.scan_order() {
        let name = world.get_name(id).unwrap_or_default();
        let kind = scheduler
            .behavior(id)
            .map(|b| b.kind())
            .unwrap_or("none");
        let parent = world
            .parent(id)
            .and_then(|p| world.get_name(p))
            .map(|p| format!(" (child of {})", p))
            .unwrap_or_default();
        println!("  {:<16} {}{}", name, kind, parent);
    }

    if let Some(camera) = scheduler.camera().and_then(|c| world.get_name(c)) {
        println!("camera: {}", camera);
    }
    let objects = scheduler.objects().names();
    if !objects.is_empty() {
        println!("sim objects: {}", objects.join(", "));
    }
    Ok(())
}
