//! Skirmish CLI - headless runner for the unit control core.
//!
//! - `skirmish run` - play a scenario and print the run summary
//! - `skirmish check-config` - validate a scenario and print it resolved
//! - `skirmish path` - plan on a small grid and draw the result

mod grid;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use skirmish_arena::{JsonModelStore, SkirmishConfig};
use skirmish_core::Vec2;
use skirmish_nav::Cell;

use crate::grid::{parse_cell, parse_point, PathRequest};

#[derive(Parser)]
#[command(name = "skirmish")]
#[command(about = "Autonomous unit control for skirmish scenarios", version)]
struct Cli {
    /// Project root directory (scenario defaults to .skirmish/scenario.yaml)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario headless
    Run {
        /// Scenario file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Frames to run (overrides the scenario)
        #[arg(long)]
        frames: Option<u64>,

        /// Global seed (overrides the scenario)
        #[arg(long)]
        seed: Option<u64>,

        /// Seconds per frame (overrides the scenario)
        #[arg(long)]
        dt: Option<f32>,

        /// Load learned models from this directory before running
        #[arg(long)]
        load_models: Option<PathBuf>,

        /// Save learned models to this directory after running
        #[arg(long)]
        save_models: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a scenario and print it with defaults filled in
    CheckConfig {
        /// Scenario file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Find a path on a grid of unit cells
    Path {
        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        /// Start point as x,y
        #[arg(long, value_parser = parse_point)]
        start: Vec2,

        /// Goal point as x,y
        #[arg(long, value_parser = parse_point)]
        goal: Vec2,

        /// Blocked cell as x,y (repeatable)
        #[arg(long = "wall", value_parser = parse_cell)]
        walls: Vec<Cell>,

        /// Agent radius to inflate walls by
        #[arg(long, default_value_t = 0.0)]
        clearance: f32,

        #[arg(long, default_value_t = 4096)]
        max_expansions: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    let logs = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        logs.json().init();
    } else {
        logs.init();
    }

    let project_root = match cli.project {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match cli.command {
        Commands::Run {
            config,
            frames,
            seed,
            dt,
            load_models,
            save_models,
            json,
        } => {
            let mut scenario = resolve_config(&project_root, config.as_deref())?;
            if let Some(seed) = seed {
                scenario.seed = seed;
            }
            if let Some(dt) = dt {
                scenario.dt = dt;
            }
            run_scenario(
                &scenario,
                frames,
                load_models.as_deref(),
                save_models.as_deref(),
                json,
            )
        }
        Commands::CheckConfig { config } => {
            let scenario = resolve_config(&project_root, config.as_deref())?;
            scenario.validate()?;
            print!("{}", scenario.to_yaml()?);
            Ok(())
        }
        Commands::Path {
            width,
            height,
            start,
            goal,
            walls,
            clearance,
            max_expansions,
        } => {
            let report = grid::plan(&PathRequest {
                width,
                height,
                start,
                goal,
                walls,
                clearance,
                max_expansions,
            })?;
            println!(
                "outcome: {:?} ({} expansions)",
                report.outcome, report.expansions
            );
            for (i, w) in report.waypoints.iter().enumerate() {
                println!("  {i:>3}: {:.2},{:.2}", w.x, w.y);
            }
            print!("{}", report.drawing);
            Ok(())
        }
    }
}

fn resolve_config(project_root: &Path, config: Option<&Path>) -> Result<SkirmishConfig> {
    match config {
        Some(path) => SkirmishConfig::load(path),
        None => SkirmishConfig::load_from_project(project_root),
    }
}

fn run_scenario(
    scenario: &SkirmishConfig,
    frames: Option<u64>,
    load_dir: Option<&Path>,
    save_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mut sim = scenario.build()?;

    if let Some(dir) = load_dir {
        let store = JsonModelStore::new(dir)
            .with_context(|| format!("Failed to open model directory {}", dir.display()))?;
        let loaded = sim.load_models(&store, Path::new(""));
        tracing::info!(dir = %dir.display(), loaded, "models loaded");
    }

    let summary = sim.run(frames).clone();

    if let Some(dir) = save_dir {
        let mut store = JsonModelStore::new(dir)
            .with_context(|| format!("Failed to create model directory {}", dir.display()))?;
        let saved = sim.save_models(&mut store, Path::new(""));
        tracing::info!(dir = %dir.display(), saved = saved.len(), "models saved");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}
