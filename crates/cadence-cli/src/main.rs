//! Cadence CLI - run levels headless with scripted input

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, run};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Headless scan/apply simulation of level gameplay", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a level for a number of ticks
    Run {
        /// Path to level file
        level: PathBuf,

        /// Number of fixed ticks to simulate
        #[arg(long, default_value = "600")]
        ticks: u64,

        /// Path to config file (default: ./cadence.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Hold a button: name@tick or name@start..end
        #[arg(long, value_parser = run::parse_schedule)]
        press: Vec<run::Schedule>,

        /// Touch an entity with the camera: name@tick or name@start..end
        #[arg(long, value_parser = run::parse_schedule)]
        touch: Vec<run::Schedule>,

        /// Pace ticks against the wall clock instead of running flat out
        #[arg(long)]
        realtime: bool,
    },

    /// Parse and instantiate a level, then list its entities
    Check {
        /// Path to level file
        level: PathBuf,

        /// Path to config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = &cli.log_level {
        logger.parse_filters(level);
    }
    logger.init();

    match cli.command {
        Commands::Run {
            level,
            ticks,
            config,
            press,
            touch,
            realtime,
        } => run::run(run::RunArgs {
            level,
            ticks,
            config,
            press,
            touch,
            realtime,
        }),
        Commands::Check { level, config } => check::run(&level, config.as_deref()),
    }
}
